//! Recording commands for exercising sequences in tests.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use runner_printer::Printer;

use crate::command::{Command, DryRun, Rollback};
use crate::context::Context;
use crate::error::CommandError;

/// Ordered record of what mock commands did, shared between them.
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<String>>>);

impl Journal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries such as `run A`, `rollback A`, `dry-run A`, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    fn push(&self, entry: String) {
        self.0.borrow_mut().push(entry);
    }
}

#[derive(Debug, Default)]
struct MockState {
    ran: Cell<bool>,
    failed: Cell<bool>,
    rolled_back: Cell<bool>,
    dry_ran: Cell<bool>,
    runs: Cell<usize>,
}

/// Read access to a [`MockCommand`]'s flags after it moved into a sequence.
#[derive(Debug, Clone)]
pub struct MockHandle(Rc<MockState>);

impl MockHandle {
    #[must_use]
    pub fn ran(&self) -> bool {
        self.0.ran.get()
    }

    #[must_use]
    pub fn failed(&self) -> bool {
        self.0.failed.get()
    }

    #[must_use]
    pub fn rolled_back(&self) -> bool {
        self.0.rolled_back.get()
    }

    #[must_use]
    pub fn dry_ran(&self) -> bool {
        self.0.dry_ran.get()
    }

    #[must_use]
    pub fn runs(&self) -> usize {
        self.0.runs.get()
    }
}

/// Configurable command that records what happens to it.
///
/// By default it succeeds and supports both rollback and dry run.
#[derive(Debug)]
pub struct MockCommand {
    name: String,
    run_error: Option<CommandError>,
    records_error: bool,
    returns_error: bool,
    rollback_error: Option<CommandError>,
    dry_run_error: Option<CommandError>,
    can_roll_back: bool,
    can_dry_run: bool,
    chatty: bool,
    journal: Journal,
    state: Rc<MockState>,
}

impl MockCommand {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            run_error: None,
            records_error: true,
            returns_error: true,
            rollback_error: None,
            dry_run_error: None,
            can_roll_back: true,
            can_dry_run: true,
            chatty: false,
            journal: Journal::new(),
            state: Rc::default(),
        }
    }

    #[must_use]
    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = journal.clone();
        self
    }

    /// Fail `run` with `error`, recording it in the context and returning it.
    #[must_use]
    pub fn fails_with(mut self, error: CommandError) -> Self {
        self.run_error = Some(error);
        self
    }

    /// Return the run error without recording it in the context.
    #[must_use]
    pub fn without_recording(mut self) -> Self {
        self.records_error = false;
        self
    }

    /// Record `error` in the context but report success from `run`.
    #[must_use]
    pub fn records_without_returning(mut self, error: CommandError) -> Self {
        self.run_error = Some(error);
        self.returns_error = false;
        self
    }

    #[must_use]
    pub fn rollback_fails_with(mut self, error: CommandError) -> Self {
        self.rollback_error = Some(error);
        self
    }

    #[must_use]
    pub fn dry_run_fails_with(mut self, error: CommandError) -> Self {
        self.dry_run_error = Some(error);
        self
    }

    #[must_use]
    pub fn without_rollback(mut self) -> Self {
        self.can_roll_back = false;
        self
    }

    #[must_use]
    pub fn without_dry_run(mut self) -> Self {
        self.can_dry_run = false;
        self
    }

    /// Print `running <name>` at info level when run.
    #[must_use]
    pub fn chatty(mut self) -> Self {
        self.chatty = true;
        self
    }

    #[must_use]
    pub fn handle(&self) -> MockHandle {
        MockHandle(Rc::clone(&self.state))
    }
}

impl fmt::Display for MockCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Command for MockCommand {
    fn run(&self, ctx: &Context, printer: &dyn Printer) -> Result<(), CommandError> {
        self.journal.push(format!("run {}", self.name));
        self.state.ran.set(true);
        self.state.runs.set(self.state.runs.get() + 1);
        if self.chatty {
            printer.info(format_args!("running {}", self.name));
        }

        let Some(error) = &self.run_error else {
            return Ok(());
        };
        self.state.failed.set(true);
        if self.records_error {
            ctx.set_err(error.clone());
        }
        if self.returns_error {
            Err(error.clone())
        } else {
            Ok(())
        }
    }

    fn as_rollback(&self) -> Option<&dyn Rollback> {
        self.can_roll_back.then_some(self as &dyn Rollback)
    }

    fn as_dry_run(&self) -> Option<&dyn DryRun> {
        self.can_dry_run.then_some(self as &dyn DryRun)
    }
}

impl Rollback for MockCommand {
    fn rollback(&self, _ctx: &Context, _printer: &dyn Printer) -> Result<(), CommandError> {
        self.journal.push(format!("rollback {}", self.name));
        match &self.rollback_error {
            Some(error) => Err(error.clone()),
            None => {
                self.state.rolled_back.set(true);
                Ok(())
            }
        }
    }
}

impl DryRun for MockCommand {
    fn dry_run(&self, _ctx: &Context, _printer: &dyn Printer) -> Result<(), CommandError> {
        self.journal.push(format!("dry-run {}", self.name));
        self.state.dry_ran.set(true);
        match &self.dry_run_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}
