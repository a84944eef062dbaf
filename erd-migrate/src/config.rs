//! Configuration for the catalog and runner.

use std::path::{Path, PathBuf};

/// Environment variable overriding the schema snapshot destination.
pub const SCHEMA_ENV: &str = "SCHEMA";

/// Default tracking table name.
pub const DEFAULT_TRACKING_TABLE: &str = "schema_migrations";

/// Default migrations directory, relative to the project root.
pub const DEFAULT_MIGRATIONS_DIR: &str = "db/migrate";

/// Default snapshot file, relative to the project root.
pub const DEFAULT_SNAPSHOT_FILE: &str = "db/schema.sql";

/// Configuration shared by the catalog and the runner.
#[derive(Debug, Clone)]
pub struct MigratorConfig {
    /// Project root that relative paths resolve against.
    pub project_root: PathBuf,
    /// Directories scanned for migration files.
    pub search_paths: Vec<PathBuf>,
    /// Migration file extension, without the dot.
    pub extension: String,
    /// Name of the table holding applied versions.
    pub tracking_table: String,
    /// Whether to write a schema snapshot after a run.
    pub snapshot_enabled: bool,
    /// Configured snapshot path.
    pub snapshot_path: Option<PathBuf>,
    /// Snapshot path taken from the environment; wins over `snapshot_path`.
    pub snapshot_env_override: Option<PathBuf>,
    /// Resolve and validate a run without executing anything.
    pub dry_run: bool,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            search_paths: vec![PathBuf::from(DEFAULT_MIGRATIONS_DIR)],
            extension: "sql".to_string(),
            tracking_table: DEFAULT_TRACKING_TABLE.to_string(),
            snapshot_enabled: true,
            snapshot_path: None,
            snapshot_env_override: None,
            dry_run: false,
        }
    }
}

impl MigratorConfig {
    /// Create a new configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the project root.
    pub fn project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = root.into();
        self
    }

    /// Replace the search paths.
    pub fn search_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.search_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Add one search path.
    pub fn add_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    /// Set the migration file extension.
    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        self.extension = ext.into().trim_start_matches('.').to_string();
        self
    }

    /// Set the tracking table name.
    pub fn tracking_table(mut self, table: impl Into<String>) -> Self {
        self.tracking_table = table.into();
        self
    }

    /// Enable or disable schema snapshots.
    pub fn snapshot_enabled(mut self, enabled: bool) -> Self {
        self.snapshot_enabled = enabled;
        self
    }

    /// Set the snapshot path.
    pub fn snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Enable dry-run mode.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Pick up the `SCHEMA` override from the process environment.
    pub fn with_env(mut self) -> Self {
        self.snapshot_env_override = std::env::var_os(SCHEMA_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        self
    }

    /// Search paths resolved against the project root.
    pub fn resolved_search_paths(&self) -> Vec<PathBuf> {
        self.search_paths
            .iter()
            .map(|p| self.resolve(p))
            .collect()
    }

    /// Where the schema snapshot is written.
    pub fn snapshot_destination(&self) -> PathBuf {
        if let Some(path) = &self.snapshot_env_override {
            return path.clone();
        }
        match &self.snapshot_path {
            Some(path) => self.resolve(path),
            None => self.project_root.join(DEFAULT_SNAPSHOT_FILE),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = MigratorConfig::default();
        assert_eq!(config.search_paths, vec![PathBuf::from("db/migrate")]);
        assert_eq!(config.extension, "sql");
        assert_eq!(config.tracking_table, "schema_migrations");
        assert!(config.snapshot_enabled);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_config_builder() {
        let config = MigratorConfig::new()
            .project_root("/app")
            .search_paths(["db/migrate", "/shared/migrate"])
            .extension(".rb")
            .tracking_table("applied_versions")
            .snapshot_enabled(false)
            .dry_run(true);

        assert_eq!(config.extension, "rb");
        assert_eq!(config.tracking_table, "applied_versions");
        assert!(!config.snapshot_enabled);
        assert!(config.dry_run);
        assert_eq!(
            config.resolved_search_paths(),
            vec![
                PathBuf::from("/app/db/migrate"),
                PathBuf::from("/shared/migrate")
            ]
        );
    }

    #[test]
    fn test_snapshot_destination_precedence() {
        let config = MigratorConfig::new().project_root("/app");
        assert_eq!(
            config.snapshot_destination(),
            PathBuf::from("/app/db/schema.sql")
        );

        let config = config.snapshot_path("out/schema.sql");
        assert_eq!(
            config.snapshot_destination(),
            PathBuf::from("/app/out/schema.sql")
        );

        let mut config = config;
        config.snapshot_env_override = Some(PathBuf::from("/tmp/override.sql"));
        assert_eq!(
            config.snapshot_destination(),
            PathBuf::from("/tmp/override.sql")
        );
    }
}
