//! CLI configuration handling.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use erd_migrate::config::{DEFAULT_MIGRATIONS_DIR, DEFAULT_TRACKING_TABLE};
use erd_migrate::{MigratorConfig, SqliteDatabase};

use crate::cli::GlobalArgs;
use crate::error::{CliError, CliResult};

/// Default config file name (lives in project root)
pub const CONFIG_FILE_NAME: &str = "erd.toml";

/// Default database file (relative to project root)
pub const DATABASE_FILE: &str = "db/development.sqlite3";

/// erd CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Migration configuration
    pub migrations: MigrationConfig,

    /// Schema snapshot configuration
    pub snapshot: SnapshotConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> CliResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Build the migrator configuration for a project root
    pub fn migrator_config(&self, root: &Path) -> MigratorConfig {
        let mut config = MigratorConfig::new()
            .project_root(root)
            .search_paths(self.migrations.paths.iter().map(PathBuf::from))
            .extension(self.migrations.extension.clone())
            .tracking_table(self.migrations.table_name.clone())
            .snapshot_enabled(self.snapshot.enabled)
            .with_env();
        if let Some(path) = &self.snapshot.path {
            config = config.snapshot_path(path);
        }
        config
    }

    /// Where the database lives; `override_url` wins over the config file
    pub fn database_path(&self, root: &Path, override_url: Option<&str>) -> PathBuf {
        let url = override_url.unwrap_or(&self.database.url);
        let path = PathBuf::from(strip_scheme(url));
        if path.is_absolute() {
            path
        } else {
            root.join(path)
        }
    }
}

/// Accept `sqlite://`, `sqlite:` and `file:` prefixes as well as bare paths
fn strip_scheme(url: &str) -> &str {
    ["sqlite://", "sqlite:", "file:"]
        .iter()
        .find_map(|prefix| url.strip_prefix(prefix))
        .unwrap_or(url)
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database path or URL
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DATABASE_FILE.to_string(),
        }
    }
}

/// Migration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Directories scanned for migration files
    pub paths: Vec<String>,

    /// Migration file extension
    pub extension: String,

    /// Migration table name
    pub table_name: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            paths: vec![DEFAULT_MIGRATIONS_DIR.to_string()],
            extension: "sql".to_string(),
            table_name: DEFAULT_TRACKING_TABLE.to_string(),
        }
    }
}

/// Schema snapshot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Write a snapshot after each run
    pub enabled: bool,

    /// Snapshot path (defaults to db/schema.sql); `SCHEMA` overrides it
    pub path: Option<String>,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

/// A loaded project: its root directory and configuration
#[derive(Debug, Clone)]
pub struct Project {
    /// Directory containing the config file
    pub root: PathBuf,
    /// Parsed configuration
    pub config: Config,
    /// Database override from the command line or environment
    pub database_url: Option<String>,
}

impl Project {
    /// Load the project described by the global arguments
    pub fn load(global: &GlobalArgs) -> CliResult<Self> {
        let cwd = std::env::current_dir()?;
        let config_path = match &global.config {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => cwd.join(path),
            None => cwd.join(CONFIG_FILE_NAME),
        };

        let config = if config_path.exists() {
            Config::load(&config_path)?
        } else if global.config.is_some() {
            return Err(CliError::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        } else {
            Config::default()
        };

        let root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(cwd);
        debug!(root = %root.display(), "Loaded project configuration");

        Ok(Self {
            root,
            config,
            database_url: global.database_url.clone(),
        })
    }

    /// Migrator configuration for this project
    pub fn migrator_config(&self) -> MigratorConfig {
        self.config.migrator_config(&self.root)
    }

    /// Path of the SQLite database
    pub fn database_path(&self) -> PathBuf {
        self.config
            .database_path(&self.root, self.database_url.as_deref())
    }

    /// Open the project database
    pub async fn open_database(&self) -> CliResult<SqliteDatabase> {
        let path = self.database_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = SqliteDatabase::open(&path, &self.config.migrations.table_name).await?;
        Ok(db)
    }

    /// Open the project database for reading; a missing file is an error, not created
    pub async fn open_database_read_only(&self) -> CliResult<SqliteDatabase> {
        let db = SqliteDatabase::open_read_only(
            self.database_path(),
            &self.config.migrations.table_name,
        )
        .await?;
        Ok(db)
    }
}
