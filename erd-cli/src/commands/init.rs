//! `erd init` command - Initialize a new erd project.

use crate::cli::{GlobalArgs, InitArgs};
use crate::config::{CONFIG_FILE_NAME, Config, Project};
use crate::error::CliResult;
use crate::output::{self, success};

/// Run the init command
pub async fn run(args: InitArgs) -> CliResult<()> {
    output::header("Initialize erd Project");

    std::fs::create_dir_all(&args.path)?;
    let project_path = args
        .path
        .canonicalize()
        .unwrap_or_else(|_| args.path.clone());

    // Check if already initialized
    let config_path = project_path.join(CONFIG_FILE_NAME);
    if config_path.exists() && !args.force {
        output::warn(&format!(
            "Project already initialized. {} exists (use --force to overwrite).",
            CONFIG_FILE_NAME
        ));
        return Ok(());
    }

    output::step(1, 3, "Creating configuration file...");
    let config = Config::default();
    config.save(&config_path)?;

    output::step(2, 3, "Creating migrations directory...");
    for dir in &config.migrations.paths {
        std::fs::create_dir_all(project_path.join(dir))?;
    }

    output::step(3, 3, "Creating tracking table...");
    let project = Project::load(&GlobalArgs {
        config: Some(config_path),
        ..GlobalArgs::default()
    })?;
    let db = project.open_database().await?;
    db.ensure_tracking_table().await?;

    output::newline();
    success("Project initialized successfully!");
    output::newline();

    output::section("Created files");
    output::kv(CONFIG_FILE_NAME, "erd configuration (project root)");
    for dir in &config.migrations.paths {
        output::kv(&format!("{}/", dir), "Migration files");
    }
    output::kv(&config.database.url, "SQLite database");
    output::newline();

    output::section("Next steps");
    output::list_item("Run `erd generate migration <name>` to create a migration");
    output::list_item("Run `erd status` to see what is pending");

    Ok(())
}
