//! `erd generate` command - Scaffold new migration files.

use erd_migrate::{MigrationGenerator, ScaffoldGenerator};

use crate::cli::{GenerateArgs, GenerateSubcommand, GlobalArgs};
use crate::config::Project;
use crate::error::{CliError, CliResult};
use crate::output::{self, success};

/// Run the generate command
pub async fn run(global: &GlobalArgs, args: GenerateArgs) -> CliResult<()> {
    let project = Project::load(global)?;
    let migrations = &project.config.migrations;
    let migrations_dir = migrations.paths.first().ok_or_else(|| {
        CliError::Config("No migration paths configured in [migrations].paths".to_string())
    })?;

    let scaffold = ScaffoldGenerator::new(&project.root)
        .migrations_dir(migrations_dir)
        .extension(&migrations.extension);
    let generator = MigrationGenerator::new(scaffold, migrations_dir, &migrations.extension);

    match args.command {
        GenerateSubcommand::Migration(target) => {
            output::header("Generate Migration");
            let options = target.options();
            let file = generator
                .generate_migration(&target.name, options.as_deref())
                .await?;
            output::list_item(&relative(&project, &file));
            output::newline();
            success(&format!("Created migration '{}'", target.name));
        }
        GenerateSubcommand::Model(target) => {
            output::header("Generate Model");
            let options = target.options();
            let files = generator
                .generate_model(&target.name, options.as_deref())
                .await?;
            for file in &files {
                output::list_item(&relative(&project, file));
            }
            output::newline();
            success(&format!(
                "Created model '{}' with {} migration(s)",
                target.name,
                files.len()
            ));
        }
    }

    Ok(())
}

fn relative(project: &Project, file: &str) -> String {
    std::path::Path::new(file)
        .strip_prefix(&project.root)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| file.to_string())
}
