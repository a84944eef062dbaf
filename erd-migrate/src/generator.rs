//! Scaffolding of new migration files.
//!
//! A [`Generator`] reads its arguments from a [`GeneratorContext`] rather than
//! from parameters. [`MigrationGenerator`] builds a context holding
//! `[name, options]` for each invocation, then extracts the created filenames
//! from what the generator reports. A generator that runs a sub-step under
//! different arguments swaps them in with [`GeneratorContext::scoped`].

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use convert_case::{Case, Casing};
use parking_lot::Mutex;
use regex_lite::Regex;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};

use crate::catalog::{MigrationUnit, scan_locations};
use crate::config::DEFAULT_MIGRATIONS_DIR;
use crate::error::{MigrateResult, MigrationError};
use crate::executor::{DOWN_MARKER, UP_MARKER};
use crate::version::filename_pattern;

/// What to scaffold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneratorKind {
    /// A model plus the migration creating its table.
    Model,
    /// A bare migration.
    Migration,
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorKind::Model => write!(f, "model"),
            GeneratorKind::Migration => write!(f, "migration"),
        }
    }
}

/// Groups of `[action, path, ...]` entries reported by a generator run.
pub type GeneratorOutput = Vec<Vec<String>>;

/// Ambient argument vector read by generators.
#[derive(Debug, Default)]
pub struct GeneratorContext {
    args: Mutex<Vec<String>>,
}

impl GeneratorContext {
    /// Create a context with no arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context holding `args`.
    pub fn with_args(args: Vec<String>) -> Self {
        Self {
            args: Mutex::new(args),
        }
    }

    /// Snapshot of the current arguments.
    pub fn args(&self) -> Vec<String> {
        self.args.lock().clone()
    }

    /// Replace the arguments until the returned guard is dropped.
    pub fn scoped(&self, args: Vec<String>) -> ScopedArgs<'_> {
        let previous = std::mem::replace(&mut *self.args.lock(), args);
        ScopedArgs {
            context: self,
            previous: Some(previous),
        }
    }
}

/// Restores the previous [`GeneratorContext`] arguments on drop.
#[must_use = "arguments are restored as soon as the guard is dropped"]
pub struct ScopedArgs<'a> {
    context: &'a GeneratorContext,
    previous: Option<Vec<String>>,
}

impl Drop for ScopedArgs<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            *self.context.args.lock() = previous;
        }
    }
}

/// Something that scaffolds files.
///
/// Returns `None` when it produced nothing.
#[async_trait::async_trait]
pub trait Generator: Send + Sync {
    /// Run the generator for `kind`, reading arguments from `context`.
    async fn invoke(
        &self,
        kind: GeneratorKind,
        context: &GeneratorContext,
    ) -> MigrateResult<Option<GeneratorOutput>>;
}

/// Invokes a [`Generator`] and extracts migration filenames from its output.
///
/// Every call builds its own [`GeneratorContext`], so overlapping calls on one
/// wrapper never see each other's arguments.
pub struct MigrationGenerator<G: Generator> {
    generator: G,
    migration_path: Regex,
}

impl<G: Generator> MigrationGenerator<G> {
    /// Create a wrapper recognising `<migrations_dir>/*.<extension>` paths.
    pub fn new(generator: G, migrations_dir: &str, extension: &str) -> Self {
        let pattern = format!(
            r"/{}/.*\.{}$",
            regex_lite::escape(migrations_dir.trim_matches('/')),
            regex_lite::escape(extension.trim_start_matches('.'))
        );
        Self {
            generator,
            migration_path: Regex::new(&pattern).expect("escaped path forms a valid regex"),
        }
    }

    /// The wrapped generator.
    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Scaffold a model and return the migration files it created.
    pub async fn generate_model(&self, name: &str, options: Option<&str>) -> MigrateResult<Vec<String>> {
        let output = self.execute(GeneratorKind::Model, name, options).await?;
        Ok(output
            .into_iter()
            .flatten()
            .filter(|entry| self.migration_path.is_match(entry))
            .collect())
    }

    /// Scaffold a migration and return its filename.
    pub async fn generate_migration(&self, name: &str, options: Option<&str>) -> MigrateResult<String> {
        let output = self.execute(GeneratorKind::Migration, name, options).await?;
        output
            .last()
            .and_then(|group| group.last())
            .cloned()
            .ok_or_else(|| MigrationError::generation(name, options))
    }

    async fn execute(
        &self,
        kind: GeneratorKind,
        name: &str,
        options: Option<&str>,
    ) -> MigrateResult<GeneratorOutput> {
        let mut args = vec![name.to_string()];
        args.extend(options.map(String::from));

        debug!(%kind, ?args, "Invoking generator");
        let context = GeneratorContext::with_args(args);
        let output = self.generator.invoke(kind, &context).await?;

        match output {
            Some(groups) if !groups.is_empty() => Ok(groups),
            _ => Err(MigrationError::generation(name, options)),
        }
    }
}

/// Writes template migration and model files under a destination root.
///
/// Migration versions are `max(now, newest existing + 1)`, and files are never
/// overwritten. Clones share one lock, so concurrent calls cannot pick the
/// same version.
#[derive(Debug, Clone)]
pub struct ScaffoldGenerator {
    destination_root: PathBuf,
    migrations_dir: PathBuf,
    models_dir: PathBuf,
    extension: String,
    versions: Arc<AsyncMutex<()>>,
}

impl ScaffoldGenerator {
    /// Create a generator writing below `destination_root`.
    pub fn new(destination_root: impl Into<PathBuf>) -> Self {
        Self {
            destination_root: destination_root.into(),
            migrations_dir: PathBuf::from(DEFAULT_MIGRATIONS_DIR),
            models_dir: PathBuf::from("models"),
            extension: "sql".to_string(),
            versions: Arc::new(AsyncMutex::new(())),
        }
    }

    /// Set the migrations directory, relative to the destination root.
    pub fn migrations_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.migrations_dir = dir.into();
        self
    }

    /// Set the models directory, relative to the destination root.
    pub fn models_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.models_dir = dir.into();
        self
    }

    /// Set the extension of written migration files.
    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        self.extension = ext.into().trim_start_matches('.').to_string();
        self
    }

    async fn write(&self, path: &Path, contents: String) -> MigrateResult<String> {
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(MigrationError::Io)?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => MigrationError::AlreadyExists(path.to_path_buf()),
                _ => MigrationError::Io(e),
            })?;
        file.write_all(contents.as_bytes())
            .await
            .map_err(MigrationError::Io)?;
        file.flush().await.map_err(MigrationError::Io)?;
        info!(path = %path.display(), "Created");
        Ok(path.display().to_string())
    }

    /// Write a migration named by the first argument in `context`.
    async fn migration_from_context(
        &self,
        context: &GeneratorContext,
        up: &str,
        down: &str,
    ) -> MigrateResult<Option<String>> {
        let args = context.args();
        let Some(name) = args.first().map(|n| n.trim()).filter(|n| !n.is_empty()) else {
            return Ok(None);
        };
        let slug = name.to_case(Case::Snake);

        let _versions = self.versions.lock().await;
        let dir = self.destination_root.join(&self.migrations_dir);
        let existing = scan_locations(std::slice::from_ref(&dir), &filename_pattern(&self.extension)).await?;
        if let Some(unit) = existing.iter().find(|unit| unit.name == slug) {
            return Err(MigrationError::AlreadyExists(unit.path.clone()));
        }

        let version = next_version(&existing, Utc::now());
        let path = dir.join(format!("{}_{}.{}", version, slug, self.extension));
        let contents = format!("{UP_MARKER}\n{up}\n\n{DOWN_MARKER}\n{down}\n");
        self.write(&path, contents).await.map(Some)
    }
}

/// The version for a new migration: the current UTC timestamp, or one past the
/// newest existing version when that is not older.
fn next_version(existing: &[MigrationUnit], now: DateTime<Utc>) -> String {
    let stamp: u64 = now
        .format("%Y%m%d%H%M%S")
        .to_string()
        .parse()
        .unwrap_or_default();
    let newest = existing
        .iter()
        .filter_map(|unit| unit.version.as_str().parse::<u64>().ok())
        .max();

    match newest {
        Some(newest) if newest >= stamp => newest.saturating_add(1).to_string(),
        _ => stamp.to_string(),
    }
}

#[async_trait::async_trait]
impl Generator for ScaffoldGenerator {
    async fn invoke(
        &self,
        kind: GeneratorKind,
        context: &GeneratorContext,
    ) -> MigrateResult<Option<GeneratorOutput>> {
        let args = context.args();
        let Some(name) = args.first().map(|n| n.trim()).filter(|n| !n.is_empty()) else {
            return Ok(None);
        };

        match kind {
            GeneratorKind::Migration => Ok(self
                .migration_from_context(context, "", "")
                .await?
                .map(|path| vec![vec!["create".to_string(), path]])),
            GeneratorKind::Model => {
                let slug = name.to_case(Case::Snake);
                let columns = parse_columns(&args[1..]);
                let table = pluralize(&slug);

                let model_path = self
                    .destination_root
                    .join(&self.models_dir)
                    .join(format!("{}.toml", slug));
                if tokio::fs::try_exists(&model_path).await.map_err(MigrationError::Io)? {
                    return Err(MigrationError::AlreadyExists(model_path));
                }

                // The migration step reads its own name from the context.
                let migration = {
                    let _scope = context.scoped(vec![format!("create_{}", table)]);
                    self.migration_from_context(
                        context,
                        &create_table_sql(&table, &columns),
                        &format!("DROP TABLE {};", table),
                    )
                    .await?
                };
                let Some(migration) = migration else {
                    return Ok(None);
                };

                let model = self
                    .write(&model_path, model_file(name, &table, &columns))
                    .await?;
                Ok(Some(vec![
                    vec!["create".to_string(), model],
                    vec!["create".to_string(), migration],
                ]))
            }
        }
    }
}

/// `name:type` column definitions from generator options.
fn parse_columns(options: &[String]) -> Vec<(String, String)> {
    options
        .iter()
        .flat_map(|opt| opt.split_whitespace())
        .filter_map(|pair| {
            let (column, ty) = pair.split_once(':').unwrap_or((pair, "string"));
            let column = column.trim();
            (!column.is_empty()).then(|| (column.to_case(Case::Snake), ty.trim().to_lowercase()))
        })
        .collect()
}

fn sql_type(ty: &str) -> &'static str {
    match ty {
        "integer" | "int" | "bigint" | "references" => "INTEGER",
        "float" | "decimal" | "real" => "REAL",
        "boolean" | "bool" => "BOOLEAN",
        "date" | "datetime" | "timestamp" | "time" => "TIMESTAMP",
        "binary" | "blob" => "BLOB",
        _ => "TEXT",
    }
}

fn create_table_sql(table: &str, columns: &[(String, String)]) -> String {
    let mut defs = vec!["    id INTEGER PRIMARY KEY".to_string()];
    defs.extend(
        columns
            .iter()
            .map(|(column, ty)| format!("    {} {}", column, sql_type(ty))),
    );
    format!("CREATE TABLE {} (\n{}\n);", table, defs.join(",\n"))
}

fn model_file(name: &str, table: &str, columns: &[(String, String)]) -> String {
    let mut out = format!(
        "name = \"{}\"\ntable = \"{}\"\n\n[columns]\n",
        name.to_case(Case::Pascal),
        table
    );
    for (column, ty) in columns {
        out.push_str(&format!("{} = \"{}\"\n", column, ty));
    }
    out
}

fn pluralize(word: &str) -> String {
    if word.ends_with('s') {
        word.to_string()
    } else if let Some(stem) = word.strip_suffix('y').filter(|stem| {
        !stem.ends_with(['a', 'e', 'i', 'o', 'u'])
    }) {
        format!("{}ies", stem)
    } else {
        format!("{}s", word)
    }
}
