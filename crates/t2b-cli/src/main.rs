//! t2b command-line driver
//!
//! Rewrites a directory of compiled test classes into benchmark classes and
//! exposes the metadata template resolver for inspection.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "t2b")]
#[command(about = "Turn compiled unit tests into annotated benchmark classes", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform every test class under a directory
    Transform {
        /// Directory of compiled test classes
        #[arg(long)]
        classes: PathBuf,
        /// Extra class directories searched for superclasses
        #[arg(long = "classpath", value_name = "DIR")]
        classpath: Vec<PathBuf>,
        /// Output directory for rewritten classes
        #[arg(short, long, default_value = "t2b-out")]
        out: PathBuf,
        /// System property, `-D key=value`
        #[arg(short = 'D', value_name = "KEY=VALUE")]
        define: Vec<String>,
        /// Metadata configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Suffix for renamed classes
        #[arg(long)]
        suffix: Option<String>,
        /// Print session reports as JSON
        #[arg(long)]
        json: bool,
        /// Color output: always, never, auto
        #[arg(long)]
        color: Option<String>,
    },

    /// Resolve metadata templates without a class context
    Resolve {
        /// System property, `-D key=value`
        #[arg(short = 'D', value_name = "KEY=VALUE")]
        define: Vec<String>,
        /// Metadata configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Templates to resolve; all configured method entries when empty
        templates: Vec<String>,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Transform {
            classes,
            classpath,
            out,
            define,
            config,
            suffix,
            json,
            color,
        } => commands::transform::execute(commands::transform::TransformOptions {
            classes,
            classpath,
            out,
            define,
            config,
            suffix,
            json,
            color,
        }),

        Commands::Resolve {
            define,
            config,
            templates,
        } => commands::resolve::execute(define, config, templates),
    }
}
