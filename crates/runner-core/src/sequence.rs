use std::cell::Cell;
use std::fmt;

use runner_printer::{Printer, SUB_COMMAND_PREFIX};
use tracing::{debug, warn};

use crate::audit::{AuditLog, StepStatus};
use crate::command::{Command, DryRun, Rollback};
use crate::context::Context;
use crate::error::{CommandError, RollbackError, RollbackFailures};

/// Ordered, reversible composite of commands.
///
/// Children run in insertion order. When one fails, the children that ran
/// successfully before it are rolled back in reverse order and the run stops;
/// the failing child itself is never rolled back. A sequence is itself a
/// [`Command`], so sequences nest.
///
/// The successfully run children always form a prefix of the list, so the
/// sequence only tracks how long that prefix is.
pub struct Sequence {
    name: Option<String>,
    commands: Vec<Box<dyn Command>>,
    completed: Cell<usize>,
}

impl Sequence {
    #[must_use]
    pub fn new(commands: Vec<Box<dyn Command>>) -> Self {
        Self {
            name: None,
            commands,
            completed: Cell::new(0),
        }
    }

    /// Label the sequence in log lines. The child count is still shown.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> impl ExactSizeIterator<Item = &(dyn Command + 'static)> {
        self.commands.iter().map(|command| &**command)
    }

    /// Number of leading children whose last run succeeded and that have
    /// not been rolled back since.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.get()
    }

    /// Run the sequence and also return what happened to each child.
    pub fn run_with_audit(
        &self,
        ctx: &Context,
        printer: &dyn Printer,
    ) -> (Result<(), CommandError>, AuditLog) {
        let mut audit = AuditLog::new();
        let result = self.run_internal(ctx, printer, &mut audit);
        (result, audit)
    }

    /// Dry run the sequence and also return what happened to each child.
    pub fn dry_run_with_audit(
        &self,
        ctx: &Context,
        printer: &dyn Printer,
    ) -> (Result<(), CommandError>, AuditLog) {
        let mut audit = AuditLog::new();
        let result = self.dry_run_internal(ctx, printer, &mut audit);
        (result, audit)
    }

    /// Roll the sequence back and also return what happened to each child.
    pub fn rollback_with_audit(
        &self,
        ctx: &Context,
        printer: &dyn Printer,
    ) -> (Result<(), CommandError>, AuditLog) {
        let mut audit = AuditLog::new();
        let result = self.rollback_internal(ctx, printer, &mut audit);
        (result, audit)
    }

    fn run_internal(
        &self,
        ctx: &Context,
        printer: &dyn Printer,
        audit: &mut AuditLog,
    ) -> Result<(), CommandError> {
        if let Some(error) = ctx.err() {
            debug!(sequence = %self, "context already failed, not running");
            return Err(error);
        }

        self.completed.set(0);
        let child_printer = printer.with_prefix(SUB_COMMAND_PREFIX);

        for (index, command) in self.commands.iter().enumerate() {
            self.count_step(ctx, &**command);
            audit.record_start(index, command.to_string(), StepStatus::Executed);

            let start = printer.start_command(command);
            let mut children = AuditLog::new();
            let result = match command.as_sequence() {
                Some(nested) => nested.run_internal(ctx, &child_printer, &mut children),
                None => command.run(ctx, &child_printer),
            };
            printer.end_command(command, start);

            if let Some(error) = failure(ctx, result) {
                audit.record_outcome(StepStatus::Failed);
                audit.set_children(index, children);
                debug!(
                    command = %command,
                    %error,
                    completed = self.completed.get(),
                    "command failed, rolling back"
                );
                // Rollback failures are logged as they happen; the run
                // failure is what the caller sees.
                let _ = self.rollback_internal(ctx, printer, audit);
                return Err(error);
            }

            audit.record_outcome(StepStatus::Executed);
            audit.set_children(index, children);
            self.completed.set(index + 1);
        }

        Ok(())
    }

    fn dry_run_internal(
        &self,
        ctx: &Context,
        printer: &dyn Printer,
        audit: &mut AuditLog,
    ) -> Result<(), CommandError> {
        if let Some(error) = ctx.err() {
            debug!(sequence = %self, "context already failed, not previewing");
            return Err(error);
        }

        let child_printer = printer.with_prefix(SUB_COMMAND_PREFIX);

        for (index, command) in self.commands.iter().enumerate() {
            self.count_step(ctx, &**command);
            audit.record_start(index, command.to_string(), StepStatus::Previewed);

            let start = printer.start_command(command);
            let mut children = AuditLog::new();
            let result = match (command.as_sequence(), command.as_dry_run()) {
                (Some(nested), _) => nested.dry_run_internal(ctx, &child_printer, &mut children),
                (None, Some(preview)) => preview.dry_run(ctx, &child_printer),
                (None, None) => Ok(()),
            };
            printer.end_command(command, start);
            audit.set_children(index, children);

            if let Some(error) = failure(ctx, result) {
                audit.record_outcome(StepStatus::PreviewFailed);
                debug!(command = %command, %error, "dry run failed, stopping");
                return Err(error);
            }

            audit.record_outcome(StepStatus::Previewed);
        }

        Ok(())
    }

    fn rollback_internal(
        &self,
        ctx: &Context,
        printer: &dyn Printer,
        audit: &mut AuditLog,
    ) -> Result<(), CommandError> {
        let completed = self.completed.replace(0);
        let child_printer = printer.with_prefix(SUB_COMMAND_PREFIX);
        let mut failures = Vec::new();

        for (index, command) in self.commands[..completed].iter().enumerate().rev() {
            let Some(rollback) = command.as_rollback() else {
                debug!(command = %command, "no rollback capability, skipping");
                continue;
            };

            let start = printer.start_command(command);
            let (result, children) = match command.as_sequence() {
                Some(nested) => {
                    let mut children = audit.take_children(index);
                    let result = nested.rollback_internal(ctx, &child_printer, &mut children);
                    (result, Some(children))
                }
                None => (rollback.rollback(ctx, &child_printer), None),
            };
            printer.end_command(command, start);

            match result {
                // A group counts as rolled back only if one of its steps was.
                Ok(()) if children
                    .as_ref()
                    .is_some_and(|c| c.count_leaves(StepStatus::RolledBack) == 0) => {}
                Ok(()) => {
                    audit.record_rollback(index, command.to_string(), StepStatus::RolledBack);
                }
                Err(error) => {
                    printer.error(format_args!("rollback of {command} failed: {error}"));
                    warn!(command = %command, %error, "rollback failed, continuing");
                    audit.record_rollback(index, command.to_string(), StepStatus::RollbackFailed);
                    failures.push(RollbackError {
                        command: command.to_string(),
                        source: error,
                    });
                }
            }
            if let Some(children) = children {
                audit.set_children(index, children);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(RollbackFailures(failures).into())
        }
    }

    fn count_step(&self, ctx: &Context, command: &dyn Command) {
        if command.is_composite() {
            return;
        }
        let step = ctx.advance();
        debug!(sequence = %self, command = %command, step, total = ctx.total(), "starting step");
    }
}

/// Settle a child's outcome against the context.
///
/// A returned error the child did not record is recorded here. The error
/// handed back is always the context's sticky one.
fn failure(ctx: &Context, result: Result<(), CommandError>) -> Option<CommandError> {
    if let Err(error) = result {
        ctx.set_err(error.clone());
        return Some(ctx.err().unwrap_or(error));
    }
    ctx.err()
}

impl Default for Sequence {
    fn default() -> Self {
        Self::empty()
    }
}

impl FromIterator<Box<dyn Command>> for Sequence {
    fn from_iter<I: IntoIterator<Item = Box<dyn Command>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.commands.len();
        let noun = if count == 1 { "command" } else { "commands" };
        match &self.name {
            Some(name) => write!(f, "{name} ({count} {noun})"),
            None => write!(f, "sequence of {count} {noun}"),
        }
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("name", &self.name)
            .field(
                "commands",
                &self.commands.iter().map(ToString::to_string).collect::<Vec<_>>(),
            )
            .field("completed", &self.completed.get())
            .finish()
    }
}

impl Command for Sequence {
    /// Run every child in order, rolling back on the first failure.
    fn run(&self, ctx: &Context, printer: &dyn Printer) -> Result<(), CommandError> {
        self.run_internal(ctx, printer, &mut AuditLog::new())
    }

    fn as_rollback(&self) -> Option<&dyn Rollback> {
        Some(self)
    }

    fn as_dry_run(&self) -> Option<&dyn DryRun> {
        Some(self)
    }

    fn steps(&self) -> usize {
        self.commands.iter().map(|command| command.steps()).sum()
    }

    fn is_composite(&self) -> bool {
        true
    }

    fn as_sequence(&self) -> Option<&Sequence> {
        Some(self)
    }
}

impl Rollback for Sequence {
    /// Roll back every successfully run child in reverse order.
    ///
    /// Leaves the context's error alone. Unwinding continues past failures;
    /// they are returned together as [`RollbackFailures`].
    fn rollback(&self, ctx: &Context, printer: &dyn Printer) -> Result<(), CommandError> {
        self.rollback_internal(ctx, printer, &mut AuditLog::new())
    }
}

impl DryRun for Sequence {
    /// Preview every child in order, stopping at the first failure.
    fn dry_run(&self, ctx: &Context, printer: &dyn Printer) -> Result<(), CommandError> {
        self.dry_run_internal(ctx, printer, &mut AuditLog::new())
    }
}
