//! The per-unit migration primitive.

use std::path::PathBuf;

use crate::catalog::{MigrationUnit, scan_locations};
use crate::error::{MigrateResult, MigrationError};
use crate::version::{Direction, MigrationVersion, filename_pattern};

/// Marker opening the forward section of a script.
pub const UP_MARKER: &str = "-- migrate:up";

/// Marker opening the backward section of a script.
pub const DOWN_MARKER: &str = "-- migrate:down";

/// Runs exactly one migration unit in one direction.
///
/// Implementations must:
/// - locate the single unit carrying `version` in `search_paths`;
/// - run its forward or backward logic;
/// - insert (up) or delete (down) the applied record in the same transaction;
/// - treat `up` of an applied version and `down` of an unapplied one as no-ops.
#[async_trait::async_trait]
pub trait MigrationExecutor: Send + Sync {
    /// Run the unit for `version` in `direction`.
    async fn execute(
        &self,
        direction: Direction,
        search_paths: &[PathBuf],
        version: &MigrationVersion,
    ) -> MigrateResult<()>;
}

#[async_trait::async_trait]
impl<T: MigrationExecutor + ?Sized> MigrationExecutor for std::sync::Arc<T> {
    async fn execute(
        &self,
        direction: Direction,
        search_paths: &[PathBuf],
        version: &MigrationVersion,
    ) -> MigrateResult<()> {
        (**self).execute(direction, search_paths, version).await
    }
}

/// Find the one unit carrying `version`.
pub async fn locate_unit(
    search_paths: &[PathBuf],
    extension: &str,
    version: &MigrationVersion,
) -> MigrateResult<MigrationUnit> {
    let pattern = filename_pattern(extension);
    let mut matches: Vec<MigrationUnit> = scan_locations(search_paths, &pattern)
        .await?
        .into_iter()
        .filter(|unit| &unit.version == version)
        .collect();

    match matches.len() {
        0 => Err(MigrationError::NotFound(version.to_string())),
        1 => Ok(matches.remove(0)),
        _ => Err(MigrationError::DuplicateVersion {
            version: version.to_string(),
            paths: matches.into_iter().map(|u| u.path).collect(),
        }),
    }
}

/// The two halves of a migration script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationScript {
    /// Forward SQL.
    pub up: String,
    /// Backward SQL; empty when the unit is irreversible.
    pub down: String,
}

impl MigrationScript {
    /// Split a script on its `-- migrate:up` / `-- migrate:down` markers.
    ///
    /// Text before the first marker belongs to the up section.
    pub fn parse(content: &str) -> Self {
        let mut script = Self::default();
        let mut current = Direction::Up;

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.eq_ignore_ascii_case(UP_MARKER) {
                current = Direction::Up;
                continue;
            }
            if trimmed.eq_ignore_ascii_case(DOWN_MARKER) {
                current = Direction::Down;
                continue;
            }
            let section = match current {
                Direction::Up => &mut script.up,
                Direction::Down => &mut script.down,
            };
            section.push_str(line);
            section.push('\n');
        }

        script.up = script.up.trim().to_string();
        script.down = script.down.trim().to_string();
        script
    }

    /// SQL for one direction.
    pub fn section(&self, direction: Direction) -> &str {
        match direction {
            Direction::Up => &self.up,
            Direction::Down => &self.down,
        }
    }

    /// Whether the script can be reverted.
    pub fn is_reversible(&self) -> bool {
        !self.down.is_empty()
    }
}
