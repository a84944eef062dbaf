//! Ordered execution of requested migrations.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::MigratorConfig;
use crate::error::{MigrateResult, MigrationError};
use crate::executor::MigrationExecutor;
use crate::snapshot::SchemaSnapshotNotifier;
use crate::version::{Direction, MigrationVersion};

/// One version, one filename, or a list mixing both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Targets {
    /// A single version or filename.
    One(String),
    /// Several, run in the given order.
    Many(Vec<String>),
}

impl Targets {
    /// The values in order.
    pub fn as_slice(&self) -> &[String] {
        match self {
            Targets::One(value) => std::slice::from_ref(value),
            Targets::Many(values) => values,
        }
    }

    /// Whether there is nothing to run.
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    fn push(&mut self, value: String) {
        match self {
            Targets::One(first) => {
                *self = Targets::Many(vec![std::mem::take(first), value]);
            }
            Targets::Many(values) => values.push(value),
        }
    }
}

impl From<&str> for Targets {
    fn from(value: &str) -> Self {
        Targets::One(value.to_string())
    }
}

impl From<String> for Targets {
    fn from(value: String) -> Self {
        Targets::One(value)
    }
}

impl<S: Into<String>> From<Vec<S>> for Targets {
    fn from(values: Vec<S>) -> Self {
        Targets::Many(values.into_iter().map(Into::into).collect())
    }
}

/// Directions mapped to the versions or filenames to run, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MigrationRequest {
    targets: IndexMap<Direction, Targets>,
}

impl MigrationRequest {
    /// Create an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the targets for a direction, replacing any already set.
    pub fn with(mut self, direction: Direction, targets: impl Into<Targets>) -> Self {
        self.targets.insert(direction, targets.into());
        self
    }

    /// Set the `up` targets.
    pub fn up(self, targets: impl Into<Targets>) -> Self {
        self.with(Direction::Up, targets)
    }

    /// Set the `down` targets.
    pub fn down(self, targets: impl Into<Targets>) -> Self {
        self.with(Direction::Down, targets)
    }

    /// Append one value to a direction.
    pub fn push(&mut self, direction: Direction, value: impl Into<String>) {
        let value = value.into();
        match self.targets.get_mut(&direction) {
            Some(targets) => targets.push(value),
            None => {
                self.targets.insert(direction, Targets::One(value));
            }
        }
    }

    /// Whether no direction has any value.
    pub fn is_empty(&self) -> bool {
        self.targets.values().all(Targets::is_empty)
    }

    /// Directions and their targets in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Direction, &Targets)> {
        self.targets.iter().map(|(d, t)| (*d, t))
    }
}

/// A migration the runner executed (or would execute, in dry-run mode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunStep {
    /// Direction run.
    pub direction: Direction,
    /// Resolved version.
    pub version: MigrationVersion,
}

/// Result of a run.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    /// Steps in execution order.
    pub steps: Vec<RunStep>,
    /// Whether nothing was executed because of dry-run mode.
    pub dry_run: bool,
    /// Where the schema snapshot was written, if it was.
    pub snapshot: Option<PathBuf>,
    /// Total duration in milliseconds.
    pub duration_ms: i64,
}

impl RunReport {
    /// Number of migrations executed in a direction.
    pub fn count(&self, direction: Direction) -> usize {
        self.steps.iter().filter(|s| s.direction == direction).count()
    }

    /// Get a summary of the result.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        let up = self.count(Direction::Up);
        if up > 0 {
            parts.push(format!("{} up", up));
        }

        let down = self.count(Direction::Down);
        if down > 0 {
            parts.push(format!("{} down", down));
        }

        if parts.is_empty() {
            return "No migrations run".to_string();
        }

        let prefix = if self.dry_run { "[DRY RUN] " } else { "" };
        format!("{}{} in {}ms", prefix, parts.join(", "), self.duration_ms)
    }
}

/// Drives a batch of migrations through the primitive, then the snapshot.
pub struct MigrationRunner<E: MigrationExecutor> {
    config: MigratorConfig,
    executor: E,
    notifier: Option<Arc<dyn SchemaSnapshotNotifier>>,
}

impl<E: MigrationExecutor> MigrationRunner<E> {
    /// Create a runner with no snapshot notifier.
    pub fn new(config: MigratorConfig, executor: E) -> Self {
        Self {
            config,
            executor,
            notifier: None,
        }
    }

    /// Attach the notifier called after a successful run.
    pub fn with_notifier(mut self, notifier: Arc<dyn SchemaSnapshotNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// The runner configuration.
    pub fn config(&self) -> &MigratorConfig {
        &self.config
    }

    /// Run every requested migration in order.
    ///
    /// Values run in the order given, never sorted: `down` targets are usually
    /// listed newest first. The first failure stops the batch and skips the
    /// snapshot.
    pub async fn run(&self, request: &MigrationRequest) -> MigrateResult<RunReport> {
        let start = Instant::now();
        let search_paths = self.config.resolved_search_paths();
        let mut report = RunReport {
            dry_run: self.config.dry_run,
            ..RunReport::default()
        };

        for (direction, targets) in request.iter() {
            for value in targets.as_slice() {
                let version = MigrationVersion::extract(value)?;

                if self.config.dry_run {
                    info!(%direction, %version, "[DRY RUN] Would migrate");
                } else {
                    info!(%direction, %version, "Migrating");
                    self.executor
                        .execute(direction, &search_paths, &version)
                        .await
                        .map_err(|e| into_execution(e, direction, &version))?;
                }

                report.steps.push(RunStep { direction, version });
            }
        }

        if !self.config.dry_run && self.config.snapshot_enabled {
            report.snapshot = self.notify_snapshot().await?;
        }

        report.duration_ms = start.elapsed().as_millis() as i64;
        Ok(report)
    }

    async fn notify_snapshot(&self) -> MigrateResult<Option<PathBuf>> {
        let Some(notifier) = &self.notifier else {
            warn!("Schema snapshots are enabled but no notifier is configured");
            return Ok(None);
        };
        let destination = self.config.snapshot_destination();
        notifier.write_snapshot(&destination).await?;
        Ok(Some(destination))
    }
}

/// Keep errors that already say what went wrong; wrap the rest with the unit.
fn into_execution(err: MigrationError, direction: Direction, version: &MigrationVersion) -> MigrationError {
    match err {
        MigrationError::Execution { .. }
        | MigrationError::NotFound(_)
        | MigrationError::DuplicateVersion { .. }
        | MigrationError::IrreversibleMigration(_)
        | MigrationError::StoreUnavailable(_) => err,
        other => MigrationError::execution(direction, version.as_str(), other),
    }
}
