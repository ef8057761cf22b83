use std::fmt;
use std::path::PathBuf;
use std::process::{self, ExitStatus};

use runner_core::{Command, CommandError, Context, DryRun, Rollback};
use runner_printer::Printer;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub(crate) enum ShellError {
    #[error("failed to start shell '{shell}'")]
    Spawn {
        shell: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{script}` failed with {status}{}", stderr_suffix(.stderr))]
    Exit {
        script: String,
        status: ExitStatus,
        stderr: String,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    match stderr.trim().lines().last() {
        Some(line) if !line.is_empty() => format!(": {line}"),
        _ => String::new(),
    }
}

/// Step made of shell scripts: one to apply it, and optionally one to undo
/// it and one to check it without side effects.
#[derive(Debug, Clone)]
pub(crate) struct ShellCommand {
    name: String,
    shell: String,
    workdir: PathBuf,
    run: String,
    rollback: Option<String>,
    dry_run: Option<String>,
}

impl ShellCommand {
    pub(crate) fn new(
        name: impl Into<String>,
        shell: impl Into<String>,
        workdir: impl Into<PathBuf>,
        run: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            shell: shell.into(),
            workdir: workdir.into(),
            run: run.into(),
            rollback: None,
            dry_run: None,
        }
    }

    #[must_use]
    pub(crate) fn with_rollback(mut self, script: Option<String>) -> Self {
        self.rollback = script;
        self
    }

    #[must_use]
    pub(crate) fn with_dry_run(mut self, script: Option<String>) -> Self {
        self.dry_run = script;
        self
    }

    fn execute(&self, script: &str, printer: &dyn Printer) -> Result<(), ShellError> {
        debug!(command = %self.name, shell = %self.shell, script, "executing script");

        let output = process::Command::new(&self.shell)
            .arg("-c")
            .arg(script)
            .current_dir(&self.workdir)
            .output()
            .map_err(|source| ShellError::Spawn {
                shell: self.shell.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines() {
            printer.info(format_args!("{line}"));
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines() {
            printer.warn(format_args!("{line}"));
        }

        if output.status.success() {
            Ok(())
        } else {
            Err(ShellError::Exit {
                script: script.to_string(),
                status: output.status,
                stderr: stderr.into_owned(),
            })
        }
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Command for ShellCommand {
    fn run(&self, ctx: &Context, printer: &dyn Printer) -> Result<(), CommandError> {
        self.execute(&self.run, printer).map_err(|error| {
            let error = CommandError::new(error);
            ctx.set_err(error.clone());
            error
        })
    }

    fn as_rollback(&self) -> Option<&dyn Rollback> {
        self.rollback.is_some().then_some(self as &dyn Rollback)
    }

    fn as_dry_run(&self) -> Option<&dyn DryRun> {
        self.dry_run.is_some().then_some(self as &dyn DryRun)
    }
}

impl Rollback for ShellCommand {
    fn rollback(&self, _ctx: &Context, printer: &dyn Printer) -> Result<(), CommandError> {
        match &self.rollback {
            Some(script) => self.execute(script, printer).map_err(CommandError::new),
            None => Ok(()),
        }
    }
}

impl DryRun for ShellCommand {
    fn dry_run(&self, _ctx: &Context, printer: &dyn Printer) -> Result<(), CommandError> {
        match &self.dry_run {
            Some(script) => self.execute(script, printer).map_err(CommandError::new),
            None => Ok(()),
        }
    }
}
