use std::path::Path;

use crate::error::Result;
use crate::plan::{Plan, StepConfig};

pub(crate) fn run(plan_path: &Path) -> Result<()> {
    let plan = Plan::load(plan_path)?;

    let leaves: usize = plan.steps.iter().map(count_leaves).sum();
    println!("Plan '{}' is valid: {leaves} step(s)", plan_path.display());
    println!("Shell: {}", plan.shell());
    if !plan.steps.is_empty() {
        println!();
    }
    for line in render_tree(&plan.steps) {
        println!("{line}");
    }

    Ok(())
}

fn count_leaves(step: &StepConfig) -> usize {
    match &step.steps {
        Some(children) => children.iter().map(count_leaves).sum(),
        None => 1,
    }
}

fn render_tree(steps: &[StepConfig]) -> Vec<String> {
    let mut lines = Vec::new();
    render_level(steps, 0, &mut lines);
    lines
}

fn render_level(steps: &[StepConfig], depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    for step in steps {
        match &step.steps {
            Some(children) => {
                lines.push(format!("{indent}- {}", step.name));
                render_level(children, depth + 1, lines);
            }
            None => {
                let mut capabilities = vec!["run"];
                if step.rollback.is_some() {
                    capabilities.push("rollback");
                }
                if step.dry_run.is_some() {
                    capabilities.push("dry-run");
                }
                lines.push(format!(
                    "{indent}- {} [{}]",
                    step.name,
                    capabilities.join(", ")
                ));
            }
        }
    }
}
