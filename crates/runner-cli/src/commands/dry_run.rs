use std::io;
use std::path::Path;

use runner_core::{Command, Context};
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

    info!(plan = %plan_path.display(), steps = ctx.total(), "previewing plan");
    let (result, audit) = sequence.dry_run_with_audit(&ctx, &printer);

    match result {
        Ok(()) => {
            printer.info(format_args!("ok: {} step(s) previewed", ctx.current()));
            Ok(())
        }
        Err(error) => {
            printer.info(format_args!("summary:"));
            for line in audit.summary().lines() {
                printer.info(format_args!("  {line}"));
            }
            printer.error(format_args!(
                "FAIL: step {} of {} would fail",
                ctx.current(),
                ctx.total()
            ));
            Err(CliError::DryRunFailed(error))
        }
    }
}
