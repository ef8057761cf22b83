use std::fs;
use std::path::{Path, PathBuf};

use runner_core::{Command, Sequence, SequenceBuilder};
use runner_printer::Level;
use serde::Deserialize;
use thiserror::Error;

use crate::shell::ShellCommand;

pub(crate) const DEFAULT_SHELL: &str = "sh";

#[derive(Debug, Error)]
pub(crate) enum PlanError {
    #[error("failed to read plan '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse plan '{path}'")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid step '{step}': {reason}")]
    InvalidStep { step: String, reason: &'static str },
}

/// Steps to run, as written in a plan file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Plan {
    #[serde(default)]
    pub(crate) settings: Settings,
    #[serde(default, rename = "step")]
    pub(crate) steps: Vec<StepConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Settings {
    pub(crate) level: Option<Level>,
    pub(crate) shell: Option<String>,
}

/// Either a shell step (`run`) or a group of steps (`steps`).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct StepConfig {
    pub(crate) name: String,
    pub(crate) run: Option<String>,
    pub(crate) rollback: Option<String>,
    pub(crate) dry_run: Option<String>,
    pub(crate) steps: Option<Vec<StepConfig>>,
}

impl Plan {
    pub(crate) fn load(path: &Path) -> Result<Self, PlanError> {
        let content = fs::read_to_string(path).map_err(|source| PlanError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    pub(crate) fn parse(content: &str, path: &Path) -> Result<Self, PlanError> {
        let plan: Self = toml::from_str(content).map_err(|source| PlanError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        plan.validate()?;
        Ok(plan)
    }

    fn validate(&self) -> Result<(), PlanError> {
        validate_steps(&self.steps, None)
    }

    pub(crate) fn shell(&self) -> &str {
        self.settings.shell.as_deref().unwrap_or(DEFAULT_SHELL)
    }

    /// Turn the plan into a sequence whose scripts run in `workdir`.
    pub(crate) fn to_sequence(&self, workdir: &Path) -> Sequence {
        build_sequence(&self.steps, self.shell(), workdir).build()
    }
}

fn validate_steps(steps: &[StepConfig], parent: Option<&str>) -> Result<(), PlanError> {
    for (index, step) in steps.iter().enumerate() {
        let label = step_label(step, index, parent);
        let invalid = |reason: &'static str| PlanError::InvalidStep {
            step: label.clone(),
            reason,
        };

        if step.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        match (&step.run, &step.steps) {
            (Some(_), Some(_)) => return Err(invalid("has both `run` and `steps`")),
            (None, None) => return Err(invalid("needs either `run` or `steps`")),
            (Some(run), None) if run.trim().is_empty() => {
                return Err(invalid("`run` must not be empty"));
            }
            (Some(_), None) => {}
            (None, Some(children)) => {
                if step.rollback.is_some() || step.dry_run.is_some() {
                    return Err(invalid("groups cannot have `rollback` or `dry_run`"));
                }
                if children.is_empty() {
                    return Err(invalid("group has no steps"));
                }
                validate_steps(children, Some(&label))?;
            }
        }
    }
    Ok(())
}

fn step_label(step: &StepConfig, index: usize, parent: Option<&str>) -> String {
    let own = if step.name.trim().is_empty() {
        format!("#{}", index + 1)
    } else {
        step.name.clone()
    };
    match parent {
        Some(parent) => format!("{parent} > {own}"),
        None => own,
    }
}

fn build_sequence(steps: &[StepConfig], shell: &str, workdir: &Path) -> SequenceBuilder {
    steps.iter().fold(SequenceBuilder::new(), |builder, step| {
        builder.then_boxed(build_step(step, shell, workdir))
    })
}

fn build_step(step: &StepConfig, shell: &str, workdir: &Path) -> Box<dyn Command> {
    match (&step.run, &step.steps) {
        (Some(run), _) => Box::new(
            ShellCommand::new(&step.name, shell, workdir, run)
                .with_rollback(step.rollback.clone())
                .with_dry_run(step.dry_run.clone()),
        ),
        (None, children) => Box::new(
            build_sequence(children.as_deref().unwrap_or_default(), shell, workdir)
                .named(&step.name)
                .build(),
        ),
    }
}
