//! `erd status` command - Show which migrations are applied.

use erd_migrate::{MigrationCatalog, StatusSummary};

use crate::cli::{GlobalArgs, StatusArgs};
use crate::config::Project;
use crate::error::CliResult;
use crate::output;

/// Run the status command
pub async fn run(global: &GlobalArgs, args: StatusArgs) -> CliResult<()> {
    let project = Project::load(global)?;
    let config = project.migrator_config();
    let db = project.open_database_read_only().await?;

    let catalog = MigrationCatalog::new(&config, db.version_store());
    let entries = catalog.status().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    output::header("Migration Status");
    output::kv("Database", &project.database_path().display().to_string());
    output::newline();

    if entries.is_empty() {
        output::info("No migrations found.");
        return Ok(());
    }

    let width = entries
        .iter()
        .map(|e| e.version.as_str().len())
        .max()
        .unwrap_or(0)
        .max("Migration ID".len());

    output::dim(&format!(" Status   {:<width$}  Migration Name", "Migration ID"));
    output::dim(&"-".repeat(width + 30));
    for entry in &entries {
        output::status_row(entry, width);
    }

    output::newline();
    let summary = StatusSummary::from_entries(&entries);
    output::info(&summary.to_string());
    if summary.orphaned > 0 {
        output::warn("Some applied versions have no migration file.");
    }

    Ok(())
}
