//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// erd - Track and run schema migrations
#[derive(Parser, Debug)]
#[command(name = "erd")]
#[command(version)]
#[command(about = "erd - Track and run schema migrations", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Options shared by every command
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Path to the config file (defaults to ./erd.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file, overriding the config
    #[arg(long, global = true, env = "ERD_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a new erd project
    Init(InitArgs),

    /// Show migration status
    Status(StatusArgs),

    /// Apply migrations by version or filename
    Up(TargetArgs),

    /// Revert migrations by version or filename, in the order given
    Down(TargetArgs),

    /// Run a mixed batch of up and down migrations
    Run(RunArgs),

    /// Scaffold new migration files
    Generate(GenerateArgs),

    /// Display version information
    Version,
}

// =============================================================================
// Init Command
// =============================================================================

/// Arguments for the `init` command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path to initialize the project (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite an existing config file
    #[arg(short, long)]
    pub force: bool,
}

// =============================================================================
// Status Command
// =============================================================================

/// Arguments for the `status` command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print the status as JSON
    #[arg(long)]
    pub json: bool,
}

// =============================================================================
// Up / Down / Run Commands
// =============================================================================

/// Arguments for `up` and `down`
#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Versions or migration filenames
    #[arg(required = true)]
    pub targets: Vec<String>,

    /// Resolve targets without running anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `run` command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Versions or filenames to apply; ups run before downs
    #[arg(long, value_delimiter = ',')]
    pub up: Vec<String>,

    /// Versions or filenames to revert, in the order given
    #[arg(long, value_delimiter = ',')]
    pub down: Vec<String>,

    /// Resolve targets without running anything
    #[arg(long)]
    pub dry_run: bool,
}

// =============================================================================
// Generate Command
// =============================================================================

/// Arguments for the `generate` command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(subcommand)]
    pub command: GenerateSubcommand,
}

/// Generate subcommands
#[derive(Subcommand, Debug)]
pub enum GenerateSubcommand {
    /// Scaffold an empty migration
    Migration(GenerateTargetArgs),

    /// Scaffold a model and the migration creating its table
    Model(GenerateTargetArgs),
}

/// Arguments shared by the generate subcommands
#[derive(Args, Debug)]
pub struct GenerateTargetArgs {
    /// Name of the migration or model
    pub name: String,

    /// Extra generator options, e.g. `title:string body:text`
    pub options: Vec<String>,
}

impl GenerateTargetArgs {
    /// Options joined into the single string the generator receives.
    pub fn options(&self) -> Option<String> {
        if self.options.is_empty() {
            None
        } else {
            Some(self.options.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_down_keeps_argument_order() {
        let cli = Cli::parse_from(["erd", "down", "20120609010203", "20120512020202"]);
        match cli.command {
            Command::Down(args) => {
                assert_eq!(args.targets, vec!["20120609010203", "20120512020202"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_run_accepts_delimited_lists() {
        let cli = Cli::parse_from(["erd", "run", "--up", "001,002", "--down", "003"]);
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.up, vec!["001", "002"]);
                assert_eq!(args.down, vec!["003"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_generate_options_joined() {
        let cli = Cli::parse_from(["erd", "generate", "model", "Post", "title:string", "body:text"]);
        match cli.command {
            Command::Generate(GenerateArgs {
                command: GenerateSubcommand::Model(args),
            }) => {
                assert_eq!(args.name, "Post");
                assert_eq!(args.options().as_deref(), Some("title:string body:text"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
