//! `lens`: browse GitHub repositories, issues and comments from the terminal.

use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use lens::cli_args::{GlobalArgs, IssueArgs, IssuesArgs, RepoArgs, StarArgs};
use lens::commands::{run_issue, run_issues, run_repo, run_star};
use lens::config::{load_global, load_with_reference_fallback};
use lens::LensError;

#[derive(Parser)]
#[command(
    name = "lens",
    version,
    about = "Browse GitHub repositories and their issues from the terminal"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show repository metadata, counters and contributors
    Repo(RepoArgs),
    /// Star or unstar a repository
    Star(StarArgs),
    /// List a repository's issues, newest first
    Issues(IssuesArgs),
    /// Show an issue and its comments
    Issue(IssueArgs),
}

fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let global = load_global(cli.global)?;
    match cli.command {
        Commands::Repo(args) => {
            let args = load_with_reference_fallback(args).map_err(LensError::from)?;
            run_repo(args, &global).await?;
        }
        Commands::Star(args) => {
            let args = load_with_reference_fallback(args).map_err(LensError::from)?;
            run_star(args, &global).await?;
        }
        Commands::Issues(args) => {
            let args = load_with_reference_fallback(args).map_err(LensError::from)?;
            run_issues(args, &global).await?;
        }
        Commands::Issue(args) => {
            let args = load_with_reference_fallback(args).map_err(LensError::from)?;
            run_issue(args, &global).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
