//! Ordered, reversible command sequences.
//!
//! A [`Sequence`] runs its commands in order. If one fails, the commands that
//! already succeeded are rolled back in reverse order, so a multi-step
//! operation is either fully applied or cleanly reverted. Sequences can also
//! be previewed with a dry run, which never mutates anything and never rolls
//! back.
//!
//! Every command of one invocation shares a [`Context`] holding the first
//! failure (the sticky error) and a step counter.

mod audit;
mod builder;
mod command;
mod context;
mod error;
mod sequence;

#[cfg(any(test, feature = "testing"))]
pub mod mocks;

pub use audit::{AuditLog, StepRecord, StepStatus};
pub use builder::SequenceBuilder;
pub use command::{Command, DryRun, Rollback};
pub use context::Context;
pub use error::{CommandError, RollbackError, RollbackFailures};
pub use sequence::Sequence;
