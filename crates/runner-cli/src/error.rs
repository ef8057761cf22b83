use runner_core::CommandError;
use thiserror::Error;

use crate::plan::PlanError;

#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error("plan error")]
    Plan(#[from] PlanError),

    #[error("run failed")]
    RunFailed(#[source] CommandError),

    #[error("dry run failed")]
    DryRunFailed(#[source] CommandError),
}

pub(crate) type Result<T> = std::result::Result<T, CliError>;
