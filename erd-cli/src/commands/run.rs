//! `erd up`, `erd down` and `erd run` - Execute migrations.

use std::sync::Arc;

use erd_migrate::{MigrationRequest, MigrationRunner, RunReport};

use crate::cli::{GlobalArgs, RunArgs, TargetArgs};
use crate::config::Project;
use crate::error::{CliError, CliResult};
use crate::output::{self, success};

/// Run `erd up <targets>`
pub async fn run_up(global: &GlobalArgs, args: TargetArgs) -> CliResult<()> {
    let request = MigrationRequest::new().up(args.targets);
    execute(global, request, args.dry_run).await
}

/// Run `erd down <targets>`
pub async fn run_down(global: &GlobalArgs, args: TargetArgs) -> CliResult<()> {
    let request = MigrationRequest::new().down(args.targets);
    execute(global, request, args.dry_run).await
}

/// Run `erd run --up ... --down ...`
pub async fn run(global: &GlobalArgs, args: RunArgs) -> CliResult<()> {
    if args.up.is_empty() && args.down.is_empty() {
        return Err(CliError::Command(
            "Nothing to run: pass --up and/or --down".to_string(),
        ));
    }
    let request = MigrationRequest::new().up(args.up).down(args.down);
    execute(global, request, args.dry_run).await
}

async fn execute(global: &GlobalArgs, request: MigrationRequest, dry_run: bool) -> CliResult<()> {
    output::header(if dry_run { "Migrate (dry run)" } else { "Migrate" });

    let project = Project::load(global)?;
    let config = project.migrator_config().dry_run(dry_run);
    let db = project.open_database().await?;
    db.ensure_tracking_table().await?;

    output::kv("Database", &project.database_path().display().to_string());
    output::newline();

    let runner = MigrationRunner::new(config.clone(), db.executor(config.extension.clone()))
        .with_notifier(Arc::new(db.schema_dumper()));
    let report = runner.run(&request).await?;

    print_report(&report);
    Ok(())
}

fn print_report(report: &RunReport) {
    for (i, step) in report.steps.iter().enumerate() {
        let label = output::direction_label(step.direction);
        output::step(i + 1, report.steps.len(), &format!("{} {}", label, step.version));
    }
    if let Some(path) = &report.snapshot {
        output::kv("Schema", &path.display().to_string());
    }

    output::newline();
    success(&report.summary());
}
