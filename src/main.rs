//! CNV collapse worker main executable

pub mod common;
pub mod err;
pub mod strucvars;

use clap::{Args, Parser, Subcommand};
use console::{Emoji, Term};

/// CLI parser based on clap.
#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Collapse AnnotSV CNV annotations",
    long_about = "This tool collapses per-transcript AnnotSV CNV rows into one row per gene"
)]
struct Cli {
    /// Commonly used arguments
    #[command(flatten)]
    common: common::Args,

    /// The sub command to run
    #[command(subcommand)]
    command: Commands,
}

/// Enum supporting the parsing of top-level commands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Structural variant related commands.
    Strucvars(Strucvars),
}

/// Parsing of "strucvars *" sub commands.
#[derive(Debug, Args)]
#[command(args_conflicts_with_subcommands = true)]
struct Strucvars {
    /// The sub command to run
    #[command(subcommand)]
    command: StrucvarsCommands,
}

/// Enum supporting the parsing of "strucvars *" sub commands.
#[derive(Debug, Subcommand)]
enum StrucvarsCommands {
    Collapse(strucvars::collapse::Args),
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Build a tracing subscriber according to the configuration in `cli.common`.
    let collector = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(match cli.common.verbose.log_level() {
            Some(level) => match level {
                log::Level::Error => tracing::Level::ERROR,
                log::Level::Warn => tracing::Level::WARN,
                log::Level::Info => tracing::Level::INFO,
                log::Level::Debug => tracing::Level::DEBUG,
                log::Level::Trace => tracing::Level::TRACE,
            },
            None => tracing::Level::INFO,
        })
        .compact()
        .finish();

    // Install collector globally so the Rayon workers log as well.
    tracing::subscriber::set_global_default(collector)?;

    let term = Term::stderr();
    match &cli.command {
        Commands::Strucvars(strucvars) => match &strucvars.command {
            StrucvarsCommands::Collapse(args) => {
                strucvars::collapse::run(&cli.common, args)?;
            }
        },
    }
    term.write_line(&format!("All done. Have a nice day!{}", Emoji(" 😃", "")))?;

    Ok(())
}
