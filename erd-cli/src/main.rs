//! erd CLI - Command-line interface for the erd migration tracker.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use erd_cli::cli::{Cli, Command};
use erd_cli::commands;
use erd_cli::error::CliResult;
use erd_cli::output;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    // Run the CLI and handle errors
    if let Err(e) = run(cli).await {
        output::newline();
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> CliResult<()> {
    let global = cli.global;

    // Run the appropriate command
    match cli.command {
        Command::Init(args) => commands::init::run(args).await,
        Command::Status(args) => commands::status::run(&global, args).await,
        Command::Up(args) => commands::run::run_up(&global, args).await,
        Command::Down(args) => commands::run::run_down(&global, args).await,
        Command::Run(args) => commands::run::run(&global, args).await,
        Command::Generate(args) => commands::generate::run(&global, args).await,
        Command::Version => commands::version::run().await,
    }
}
