use std::fmt;

use runner_printer::Printer;

use crate::context::Context;
use crate::error::CommandError;
use crate::sequence::Sequence;

/// A unit of work in a sequence.
///
/// `run` is the only mandatory capability. Commands that can undo their
/// effect or preview it expose [`Rollback`] and [`DryRun`] through
/// [`Command::as_rollback`] and [`Command::as_dry_run`]; the defaults report
/// the capability as missing, which the driver treats as a no-op.
///
/// The `Display` form is the command's name in log lines.
pub trait Command: fmt::Display {
    /// Perform the command's effect.
    ///
    /// Called at most once per context. A failing command should record its
    /// error with [`Context::set_err`] as well as return it; the driving
    /// sequence records a returned error itself when the command did not.
    ///
    /// # Errors
    ///
    /// Returns the failure that stopped the command.
    fn run(&self, ctx: &Context, printer: &dyn Printer) -> Result<(), CommandError>;

    fn as_rollback(&self) -> Option<&dyn Rollback> {
        None
    }

    fn as_dry_run(&self) -> Option<&dyn DryRun> {
        None
    }

    /// Number of leaf steps this command accounts for.
    fn steps(&self) -> usize {
        1
    }

    /// Whether this command only groups other commands.
    ///
    /// Composites do not advance the context's step counter; their leaves do.
    fn is_composite(&self) -> bool {
        false
    }

    /// The command as a nested [`Sequence`], so an enclosing sequence can
    /// keep per-step audit records for it.
    fn as_sequence(&self) -> Option<&Sequence> {
        None
    }
}

/// Undo of a previously successful [`Command::run`].
pub trait Rollback {
    /// Best-effort undo. Never called for a command whose run failed.
    ///
    /// # Errors
    ///
    /// Returns why the undo failed. The driver logs it and keeps unwinding;
    /// it never replaces the context's error.
    fn rollback(&self, ctx: &Context, printer: &dyn Printer) -> Result<(), CommandError>;
}

/// Side-effect free preview of a command.
pub trait DryRun {
    /// Check preconditions or describe the effect without mutating anything.
    ///
    /// # Errors
    ///
    /// Returns why the command would fail.
    fn dry_run(&self, ctx: &Context, printer: &dyn Printer) -> Result<(), CommandError>;
}

impl<C: Command + ?Sized> Command for Box<C> {
    fn run(&self, ctx: &Context, printer: &dyn Printer) -> Result<(), CommandError> {
        (**self).run(ctx, printer)
    }

    fn as_rollback(&self) -> Option<&dyn Rollback> {
        (**self).as_rollback()
    }

    fn as_dry_run(&self) -> Option<&dyn DryRun> {
        (**self).as_dry_run()
    }

    fn steps(&self) -> usize {
        (**self).steps()
    }

    fn is_composite(&self) -> bool {
        (**self).is_composite()
    }

    fn as_sequence(&self) -> Option<&Sequence> {
        (**self).as_sequence()
    }
}
