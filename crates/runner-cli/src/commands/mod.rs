mod check;
mod dry_run;
mod run;

use std::path::{Path, PathBuf};

use clap::Subcommand;
use runner_printer::Level;

use crate::error::Result;
use crate::plan::Plan;

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run every step of a plan, rolling back on the first failure
    Run {
        /// Path to the plan file
        plan: PathBuf,
    },
    /// Preview a plan without changing anything
    DryRun {
        /// Path to the plan file
        plan: PathBuf,
    },
    /// Validate a plan and print its steps
    Check {
        /// Path to the plan file
        plan: PathBuf,
    },
}

impl Commands {
    pub(crate) fn execute(self, options: &Options) -> Result<()> {
        match self {
            Self::Run { plan } => run::run(&plan, options),
            Self::DryRun { plan } => dry_run::run(&plan, options),
            Self::Check { plan } => check::run(&plan),
        }
    }
}

/// Settings shared by every subcommand.
#[derive(Debug, Default)]
pub(crate) struct Options {
    pub(crate) level: Option<Level>,
    pub(crate) quiet: bool,
    pub(crate) workdir: Option<PathBuf>,
}

impl Options {
    /// `--quiet`, then `--level`, then the plan's setting, then the default.
    pub(crate) fn level(&self, plan: &Plan) -> Level {
        if self.quiet {
            return Level::Off;
        }
        self.level.or(plan.settings.level).unwrap_or_default()
    }

    /// Directory scripts run in: `--dir`, else the plan file's directory.
    pub(crate) fn workdir(&self, plan_path: &Path) -> PathBuf {
        if let Some(dir) = &self.workdir {
            return dir.clone();
        }
        match plan_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}
