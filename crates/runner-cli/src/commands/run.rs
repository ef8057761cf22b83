use std::io;
use std::path::Path;

use runner_core::{Command, Context, StepStatus};
use runner_printer::{Printer, StdPrinter};
use tracing::info;

use super::Options;
use crate::error::{CliError, Result};
use crate::plan::Plan;

pub(crate) fn run(plan_path: &Path, options: &Options) -> Result<()> {
    let plan = Plan::load(plan_path)?;
    let printer = StdPrinter::new(io::stdout(), options.level(&plan));
    let sequence = plan.to_sequence(&options.workdir(plan_path));
    let ctx = Context::new(sequence.steps());

    info!(plan = %plan_path.display(), steps = ctx.total(), "running plan");
    let (result, audit) = sequence.run_with_audit(&ctx, &printer);

    match result {
        Ok(()) => {
            printer.info(format_args!("ok: {} step(s) applied", ctx.current()));
            Ok(())
        }
        Err(error) => {
            let rolled_back = audit.count_leaves(StepStatus::RolledBack);
            let stuck = audit.count_leaves(StepStatus::RollbackFailed);
            printer.info(format_args!("summary:"));
            for line in audit.summary().lines() {
                printer.info(format_args!("  {line}"));
            }
            printer.error(format_args!(
                "FAIL: rolled back {rolled_back} step(s), {stuck} could not be rolled back"
            ));
            Err(CliError::RunFailed(error))
        }
    }
}
