//! Migration discovery and status reconciliation.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::MigratorConfig;
use crate::error::{MigrateResult, MigrationError};
use crate::store::VersionStore;
use crate::version::{MigrationVersion, filename_pattern, parse_filename};

/// Name shown for an applied version whose file is missing.
pub const NO_FILE: &str = "*** NO FILE ***";

/// A migration file found in a search location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationUnit {
    /// Version prefix of the filename.
    pub version: MigrationVersion,
    /// Slug between the version and the extension.
    pub name: String,
    /// Bare filename.
    pub filename: String,
    /// Full path to the file.
    pub path: PathBuf,
}

/// Whether a migration is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationState {
    /// Recorded in the tracking table.
    Up,
    /// Present on disk but not applied.
    Down,
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationState::Up => write!(f, "up"),
            MigrationState::Down => write!(f, "down"),
        }
    }
}

/// One row of a status report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    /// Applied or not.
    pub status: MigrationState,
    /// Migration version.
    pub version: MigrationVersion,
    /// Migration name, or [`NO_FILE`] for orphans.
    pub name: String,
    /// Filename, or the version for orphans.
    pub filename: String,
}

impl StatusEntry {
    fn orphan(version: MigrationVersion) -> Self {
        Self {
            status: MigrationState::Up,
            filename: version.to_string(),
            version,
            name: NO_FILE.to_string(),
        }
    }

    /// Whether this entry is an applied version with no file.
    pub fn is_orphan(&self) -> bool {
        self.status == MigrationState::Up && self.name == NO_FILE
    }

    /// Whether this entry is waiting to be applied.
    pub fn is_pending(&self) -> bool {
        self.status == MigrationState::Down
    }
}

/// Counts over a status report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    /// Entries with a file that are applied.
    pub applied: usize,
    /// Entries not yet applied.
    pub pending: usize,
    /// Applied versions with no file.
    pub orphaned: usize,
}

impl StatusSummary {
    /// Tally a report.
    pub fn from_entries(entries: &[StatusEntry]) -> Self {
        entries.iter().fold(Self::default(), |mut acc, entry| {
            if entry.is_orphan() {
                acc.orphaned += 1;
            } else if entry.is_pending() {
                acc.pending += 1;
            } else {
                acc.applied += 1;
            }
            acc
        })
    }
}

impl fmt::Display for StatusSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} applied, {} pending, {} without file",
            self.applied, self.pending, self.orphaned
        )
    }
}

/// Scans search locations and merges them with the applied set.
pub struct MigrationCatalog<S: VersionStore> {
    store: S,
    search_paths: Vec<PathBuf>,
    pattern: Regex,
}

impl<S: VersionStore> MigrationCatalog<S> {
    /// Create a catalog from configuration.
    pub fn new(config: &MigratorConfig, store: S) -> Self {
        Self {
            store,
            search_paths: config.resolved_search_paths(),
            pattern: filename_pattern(&config.extension),
        }
    }

    /// The resolved search locations.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// The version store backing this catalog.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Every migration unit in every search location, in scan order.
    pub async fn discover(&self) -> MigrateResult<Vec<MigrationUnit>> {
        scan_locations(&self.search_paths, &self.pattern).await
    }

    /// Units carrying the given version.
    pub async fn find(&self, version: &MigrationVersion) -> MigrateResult<Vec<MigrationUnit>> {
        let units = self.discover().await?;
        Ok(units.into_iter().filter(|u| &u.version == version).collect())
    }

    /// Status of every migration on disk plus every orphaned applied version,
    /// sorted by version.
    pub async fn status(&self) -> MigrateResult<Vec<StatusEntry>> {
        let mut applied = self.store.list_applied().await?;
        let units = self.discover().await?;
        warn_duplicates(&units);

        let mut entries: Vec<StatusEntry> = units
            .into_iter()
            .map(|unit| {
                // Consuming the version leaves only orphans behind and marks
                // a second file with the same version as down.
                let status = if applied.remove(&unit.version) {
                    MigrationState::Up
                } else {
                    MigrationState::Down
                };
                StatusEntry {
                    status,
                    version: unit.version,
                    name: unit.name,
                    filename: unit.filename,
                }
            })
            .collect();

        entries.extend(applied.into_iter().map(StatusEntry::orphan));
        entries.sort_by(|a, b| a.version.cmp(&b.version));
        Ok(entries)
    }
}

/// Scan every location for files matching `pattern`.
///
/// Locations that do not exist are skipped. Filenames are sorted within each
/// location so results do not depend on directory iteration order.
pub(crate) async fn scan_locations(
    locations: &[PathBuf],
    pattern: &Regex,
) -> MigrateResult<Vec<MigrationUnit>> {
    let mut units = Vec::new();
    for location in locations {
        units.extend(scan_location(location, pattern).await?);
    }
    Ok(units)
}

async fn scan_location(location: &Path, pattern: &Regex) -> MigrateResult<Vec<MigrationUnit>> {
    if !location.is_dir() {
        debug!(location = %location.display(), "Skipping missing migration location");
        return Ok(Vec::new());
    }

    let mut entries = tokio::fs::read_dir(location)
        .await
        .map_err(MigrationError::Io)?;

    let mut units = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(MigrationError::Io)? {
        let path = entry.path();
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => continue,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        }
        let file_name = entry.file_name();
        let Some(filename) = file_name.to_str() else {
            continue;
        };
        if let Some((version, name)) = parse_filename(pattern, filename) {
            units.push(MigrationUnit {
                version,
                name,
                filename: filename.to_string(),
                path,
            });
        }
    }

    units.sort_by(|a, b| a.filename.cmp(&b.filename));
    debug!(location = %location.display(), count = units.len(), "Scanned migration location");
    Ok(units)
}

fn warn_duplicates(units: &[MigrationUnit]) {
    let mut seen: HashMap<&MigrationVersion, Vec<&Path>> = HashMap::new();
    for unit in units {
        seen.entry(&unit.version).or_default().push(&unit.path);
    }
    for (version, paths) in seen {
        if paths.len() > 1 {
            warn!(
                version = %version,
                files = ?paths,
                "Migration version is defined more than once"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryVersionStore;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn v(raw: &str) -> MigrationVersion {
        MigrationVersion::parse(raw).unwrap()
    }

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), "-- migrate:up\n").unwrap();
    }

    fn catalog(
        root: &Path,
        paths: &[&str],
        applied: &[&str],
    ) -> MigrationCatalog<InMemoryVersionStore> {
        let config = MigratorConfig::new()
            .project_root(root)
            .search_paths(paths.iter().copied());
        let store = InMemoryVersionStore::with_applied(applied.iter().map(|a| v(a)));
        MigrationCatalog::new(&config, store)
    }

    fn row(status: MigrationState, version: &str, name: &str) -> (MigrationState, String, String) {
        (status, version.to_string(), name.to_string())
    }

    fn rows(entries: &[StatusEntry]) -> Vec<(MigrationState, String, String)> {
        entries
            .iter()
            .map(|e| (e.status, e.version.to_string(), e.name.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_status_merges_disk_and_store() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("db/migrate");
        std::fs::create_dir_all(&dir).unwrap();
        touch(&dir, "001_create_users.sql");
        touch(&dir, "002_add_index.sql");

        let entries = catalog(tmp.path(), &["db/migrate"], &["001", "003"])
            .status()
            .await
            .unwrap();

        assert_eq!(
            rows(&entries),
            vec![
                row(MigrationState::Up, "001", "create_users"),
                row(MigrationState::Down, "002", "add_index"),
                row(MigrationState::Up, "003", NO_FILE),
            ]
        );
        assert_eq!(entries[2].filename, "003");
        assert_eq!(entries[0].filename, "001_create_users.sql");
    }

    #[tokio::test]
    async fn test_orphan_only() {
        let tmp = TempDir::new().unwrap();
        let entries = catalog(tmp.path(), &["db/migrate"], &["5"])
            .status()
            .await
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_orphan());
        assert_eq!(entries[0].version.as_str(), "005");
        assert_eq!(entries[0].name, NO_FILE);
    }

    #[tokio::test]
    async fn test_status_ignores_non_matching_entries() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("migrate");
        std::fs::create_dir_all(dir.join("004_directory.sql")).unwrap();
        touch(&dir, "001_.sql");
        touch(&dir, "01_short.sql");
        touch(&dir, "002_wrong_ext.rb");
        touch(&dir, "README.md");
        touch(&dir, "003_kept.sql");

        let entries = catalog(tmp.path(), &["migrate"], &[]).status().await.unwrap();
        assert_eq!(rows(&entries), vec![row(MigrationState::Down, "003", "kept")]);
    }

    #[tokio::test]
    async fn test_status_sorted_across_locations() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        std::fs::create_dir_all(&a).unwrap();
        std::fs::create_dir_all(&b).unwrap();
        touch(&a, "20120609010203_add_posts.sql");
        touch(&b, "20120512020202_create_users.sql");
        touch(&b, "100_seed.sql");

        let entries = catalog(tmp.path(), &["a", "b"], &["20120512020202"])
            .status()
            .await
            .unwrap();

        let versions: Vec<_> = entries.iter().map(|e| e.version.to_string()).collect();
        assert_eq!(versions, vec!["100", "20120512020202", "20120609010203"]);
        assert_eq!(entries[1].status, MigrationState::Up);
    }

    #[tokio::test]
    async fn test_duplicate_versions_reported_once_applied() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        std::fs::create_dir_all(&a).unwrap();
        std::fs::create_dir_all(&b).unwrap();
        touch(&a, "001_first.sql");
        touch(&b, "001_second.sql");

        let entries = catalog(tmp.path(), &["a", "b"], &["001"])
            .status()
            .await
            .unwrap();

        assert_eq!(
            rows(&entries),
            vec![
                row(MigrationState::Up, "001", "first"),
                row(MigrationState::Down, "001", "second"),
            ]
        );
    }

    #[tokio::test]
    async fn test_one_entry_per_file_and_orphan() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("m");
        std::fs::create_dir_all(&dir).unwrap();
        let files = ["001_a.sql", "002_b.sql", "010_c.sql"];
        for file in files {
            touch(&dir, file);
        }
        let applied = ["002", "007", "009"];

        let entries = catalog(tmp.path(), &["m"], &applied).status().await.unwrap();

        let disk: BTreeSet<_> = ["001", "002", "010"].into_iter().collect();
        let orphans: BTreeSet<_> = ["007", "009"].into_iter().collect();
        assert_eq!(entries.len(), disk.len() + orphans.len());

        let mut sorted = entries.clone();
        sorted.sort_by(|a, b| a.version.cmp(&b.version));
        assert_eq!(entries, sorted);

        let summary = StatusSummary::from_entries(&entries);
        assert_eq!(
            summary,
            StatusSummary {
                applied: 1,
                pending: 2,
                orphaned: 2
            }
        );
    }

    #[tokio::test]
    async fn test_find_and_discover() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("m");
        std::fs::create_dir_all(&dir).unwrap();
        touch(&dir, "002_b.sql");
        touch(&dir, "001_a.sql");

        let catalog = catalog(tmp.path(), &["m"], &[]);
        let units = catalog.discover().await.unwrap();
        assert_eq!(units[0].filename, "001_a.sql");
        assert_eq!(units[0].path, dir.join("001_a.sql"));

        let found = catalog.find(&v("002")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "b");
        assert!(catalog.find(&v("003")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_unavailable_propagates() {
        struct Broken;

        #[async_trait::async_trait]
        impl VersionStore for Broken {
            async fn list_applied(&self) -> MigrateResult<BTreeSet<MigrationVersion>> {
                Err(MigrationError::store_unavailable("no such table"))
            }
        }

        let tmp = TempDir::new().unwrap();
        let config = MigratorConfig::new().project_root(tmp.path());
        let err = MigrationCatalog::new(&config, Broken)
            .status()
            .await
            .unwrap_err();
        assert!(matches!(err, MigrationError::StoreUnavailable(_)));
    }

    #[test]
    fn test_status_entry_serializes_lowercase() {
        let entry = StatusEntry::orphan(v("005"));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["status"], "up");
        assert_eq!(json["version"], "005");
        assert_eq!(json["name"], NO_FILE);
        assert_eq!(json["filename"], "005");
    }
}
