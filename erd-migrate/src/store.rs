//! Applied-version tracking.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{MigrateResult, MigrationError};
use crate::version::MigrationVersion;

/// Read access to the durable set of applied versions.
///
/// Rows are only ever inserted or deleted by a [`MigrationExecutor`] while it
/// runs a unit; the catalog and runner never write here.
///
/// [`MigrationExecutor`]: crate::executor::MigrationExecutor
#[async_trait::async_trait]
pub trait VersionStore: Send + Sync {
    /// Every version currently recorded as applied.
    ///
    /// Fails with [`MigrationError::StoreUnavailable`] when the tracking table
    /// cannot be read.
    async fn list_applied(&self) -> MigrateResult<BTreeSet<MigrationVersion>>;
}

#[async_trait::async_trait]
impl<T: VersionStore + ?Sized> VersionStore for Arc<T> {
    async fn list_applied(&self) -> MigrateResult<BTreeSet<MigrationVersion>> {
        (**self).list_applied().await
    }
}

/// Validated, quoted name of a tracking table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingTable {
    name: String,
}

impl TrackingTable {
    /// Validate a table name, optionally schema-qualified (`main.schema_migrations`).
    pub fn new(name: &str) -> MigrateResult<Self> {
        let valid = !name.is_empty()
            && name.split('.').count() <= 2
            && name.split('.').all(is_identifier);
        if !valid {
            return Err(MigrationError::database(format!(
                "invalid tracking table name '{}'",
                name
            )));
        }
        Ok(Self {
            name: name.to_string(),
        })
    }

    /// The name as configured.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name quoted for interpolation into SQL.
    pub fn quoted(&self) -> String {
        self.name
            .split('.')
            .map(|part| format!("\"{}\"", part))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// `CREATE TABLE IF NOT EXISTS` for this table.
    pub fn create_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (version VARCHAR(255) NOT NULL PRIMARY KEY)",
            self.quoted()
        )
    }

    /// `SELECT` of every applied version.
    pub fn select_sql(&self) -> String {
        format!("SELECT version FROM {}", self.quoted())
    }
}

fn is_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Version store held in memory.
#[derive(Debug, Default)]
pub struct InMemoryVersionStore {
    applied: Mutex<BTreeSet<MigrationVersion>>,
}

impl InMemoryVersionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with versions.
    pub fn with_applied<I>(versions: I) -> Self
    where
        I: IntoIterator<Item = MigrationVersion>,
    {
        Self {
            applied: Mutex::new(versions.into_iter().collect()),
        }
    }

    /// Record a version as applied. Returns `false` if it already was.
    pub fn insert(&self, version: MigrationVersion) -> bool {
        self.applied.lock().insert(version)
    }

    /// Remove a version. Returns `false` if it was not applied.
    pub fn remove(&self, version: &MigrationVersion) -> bool {
        self.applied.lock().remove(version)
    }

    /// Whether a version is applied.
    pub fn contains(&self, version: &MigrationVersion) -> bool {
        self.applied.lock().contains(version)
    }
}

#[async_trait::async_trait]
impl VersionStore for InMemoryVersionStore {
    async fn list_applied(&self) -> MigrateResult<BTreeSet<MigrationVersion>> {
        Ok(self.applied.lock().clone())
    }
}
