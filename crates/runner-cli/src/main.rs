mod commands;
mod error;
mod logging;
mod plan;
mod shell;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use runner_printer::Level;

use crate::commands::{Commands, Options};
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "runner")]
#[command(bin_name = "runner")]
#[command(about = "Run shell step plans with dry run and rollback", long_about = None)]
struct Cli {
    /// Lowest severity printed (all, trace, debug, info, warn, error, fatal, off)
    #[arg(long, global = true)]
    level: Option<Level>,

    /// Suppress step output; errors are still reported on stderr
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Directory scripts run in (default: the plan file's directory)
    #[arg(long = "dir", short = 'C', global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    let options = Options {
        level: cli.level,
        quiet: cli.quiet,
        workdir: cli.dir,
    };

    if let Err(e) = cli.command.execute(&options) {
        print_error(&e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn print_error(error: &CliError) {
    eprintln!("error: {error}");

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("caused by: {cause}");
        source = std::error::Error::source(cause);
    }
}
