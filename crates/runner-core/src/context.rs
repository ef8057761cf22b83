use std::cell::{Cell, OnceCell};

use crate::error::CommandError;

/// Run-scoped state shared by every command of one invocation.
///
/// Carries a step counter bounded by `total` and a sticky error slot. The
/// first failure recorded wins: once set, the error is never replaced, so
/// cleanup that fails later cannot hide the reason the run stopped.
///
/// A context is created by the caller, handed down the command tree by
/// shared reference and driven by a single thread. Only the component that
/// detects a failure writes the error.
#[derive(Debug, Default)]
pub struct Context {
    total: usize,
    current: Cell<usize>,
    err: OnceCell<CommandError>,
}

impl Context {
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            total,
            current: Cell::new(0),
            err: OnceCell::new(),
        }
    }

    /// Expected number of steps. Zero means unknown.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of steps started so far.
    #[must_use]
    pub fn current(&self) -> usize {
        self.current.get()
    }

    /// Count one more started step and return the new count.
    ///
    /// The counter never goes past a non-zero `total`.
    pub fn advance(&self) -> usize {
        let mut next = self.current.get().saturating_add(1);
        if self.total > 0 {
            next = next.min(self.total);
        }
        self.current.set(next);
        next
    }

    /// The recorded failure, if any.
    #[must_use]
    pub fn err(&self) -> Option<CommandError> {
        self.err.get().cloned()
    }

    /// Record `error` unless a failure is already recorded.
    ///
    /// Returns whether `error` became the context's error.
    pub fn set_err(&self, error: CommandError) -> bool {
        self.err.set(error).is_ok()
    }

    /// Whether a failure has been recorded, which also cancels the run.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.err.get().is_some()
    }

    /// Consume the context into the outcome of the invocation.
    ///
    /// # Errors
    ///
    /// Returns the recorded failure, if any.
    pub fn into_result(self) -> Result<(), CommandError> {
        match self.err.into_inner() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
