//! Error types for the migration tracker.

use std::path::PathBuf;

use thiserror::Error;

use crate::version::Direction;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Errors that can occur while reporting on or running migrations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A supplied version or filename has no leading run of at least three digits.
    #[error("Invalid version format: '{0}' has no leading version of 3 or more digits")]
    InvalidVersionFormat(String),

    /// A direction other than `up` or `down`.
    #[error("Invalid direction '{0}': expected 'up' or 'down'")]
    InvalidDirection(String),

    /// The tracking table or its database could not be reached.
    #[error("Version store unavailable: {0}")]
    StoreUnavailable(String),

    /// The migration primitive failed for one unit.
    #[error("Migration {direction} {version} failed: {message}")]
    Execution {
        /// Direction that was being run.
        direction: Direction,
        /// Version of the failing unit.
        version: String,
        /// Underlying failure.
        message: String,
    },

    /// The generator reported no result.
    #[error("Generation failed: {}", generation_label(.name, .options.as_deref()))]
    Generation {
        /// Requested name.
        name: String,
        /// Options passed alongside the name.
        options: Option<String>,
    },

    /// No migration unit exists for the version.
    #[error("Migration '{0}' not found")]
    NotFound(String),

    /// More than one unit carries the same version.
    #[error("Version {version} is defined by more than one migration: {}", display_paths(.paths))]
    DuplicateVersion {
        /// The ambiguous version.
        version: String,
        /// Every file carrying it.
        paths: Vec<PathBuf>,
    },

    /// A down migration was requested for a unit with no down section.
    #[error("Migration '{0}' has no down section and cannot be reverted")]
    IrreversibleMigration(String),

    /// A generated file would overwrite an existing one.
    #[error("'{}' already exists", .0.display())]
    AlreadyExists(PathBuf),

    /// Writing the schema snapshot failed.
    #[error("Schema snapshot error: {0}")]
    Snapshot(String),

    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database operation error.
    #[error("Database error: {0}")]
    Database(String),
}

fn generation_label(name: &str, options: Option<&str>) -> String {
    match options {
        Some(options) => format!("{}({})", name, options),
        None => name.to_string(),
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl MigrationError {
    /// Create a database error.
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a store unavailable error.
    pub fn store_unavailable(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    /// Create a snapshot error.
    pub fn snapshot(msg: impl Into<String>) -> Self {
        Self::Snapshot(msg.into())
    }

    /// Create a generation error.
    pub fn generation(name: impl Into<String>, options: Option<&str>) -> Self {
        Self::Generation {
            name: name.into(),
            options: options.map(String::from),
        }
    }

    /// Wrap a primitive failure with the unit it happened on.
    pub fn execution(direction: Direction, version: impl Into<String>, err: impl ToString) -> Self {
        Self::Execution {
            direction,
            version: version.into(),
            message: err.to_string(),
        }
    }
}

impl From<tokio_rusqlite::Error> for MigrationError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        match err {
            tokio_rusqlite::Error::ConnectionClosed => {
                Self::StoreUnavailable("connection closed".to_string())
            }
            other => Self::Database(other.to_string()),
        }
    }
}
