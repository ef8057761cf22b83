use std::error::Error;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Failure reported by a command.
///
/// The engine never layers its own error kinds on top: this is an opaque,
/// cheaply cloneable handle around whatever the failing command produced, so
/// the same failure can sit in the [`Context`](crate::Context) and be returned
/// to the caller at once.
#[derive(Clone)]
pub struct CommandError(Arc<dyn Error + Send + Sync + 'static>);

impl CommandError {
    pub fn new<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self(Arc::new(error))
    }

    /// Failure described only by a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(Message(message.into()))
    }

    /// Whether both handles point at the same recorded failure.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }

    /// The failure the command produced.
    #[must_use]
    pub fn inner(&self) -> &(dyn Error + Send + Sync + 'static) {
        &*self.0
    }

    #[must_use]
    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }
}

impl PartialEq for CommandError {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl fmt::Debug for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl Error for CommandError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

impl From<std::io::Error> for CommandError {
    fn from(error: std::io::Error) -> Self {
        Self::new(error)
    }
}

impl From<RollbackFailures> for CommandError {
    fn from(failures: RollbackFailures) -> Self {
        Self::new(failures)
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
struct Message(String);

/// A command whose rollback failed.
#[derive(Debug, Error)]
#[error("rollback of '{command}' failed")]
pub struct RollbackError {
    /// Display name of the command.
    pub command: String,
    #[source]
    pub source: CommandError,
}

/// Every rollback failure collected while unwinding a sequence.
///
/// Unwinding never stops at a failure, so more than one can pile up.
#[derive(Debug, Error)]
#[error("{} rollback(s) failed", .0.len())]
pub struct RollbackFailures(pub Vec<RollbackError>);

impl RollbackFailures {
    /// Names of the commands that could not be rolled back, in unwind order.
    #[must_use]
    pub fn commands(&self) -> Vec<&str> {
        self.0.iter().map(|failure| failure.command.as_str()).collect()
    }
}
