//! SQLite-backed version store, migration primitive and schema dumper.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rusqlite::OpenFlags;
use rusqlite::types::Value;
use tokio_rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{MigrateResult, MigrationError};
use crate::executor::{MigrationExecutor, MigrationScript, locate_unit};
use crate::snapshot::{SchemaSnapshotNotifier, render_snapshot};
use crate::store::{TrackingTable, VersionStore};
use crate::version::{Direction, MigrationVersion};

/// A SQLite database holding the tracking table.
#[derive(Clone)]
pub struct SqliteDatabase {
    conn: Connection,
    table: TrackingTable,
}

impl SqliteDatabase {
    /// Open (or create) a database file.
    pub async fn open(path: impl AsRef<Path>, tracking_table: &str) -> MigrateResult<Self> {
        let path = path.as_ref().to_path_buf();
        debug!(path = %path.display(), "Opening SQLite database");
        let conn = Connection::open(&path)
            .await
            .map_err(|e| MigrationError::store_unavailable(format!("{}: {}", path.display(), e)))?;
        Self::from_connection(conn, tracking_table)
    }

    /// Open an existing database file without creating it or allowing writes.
    pub async fn open_read_only(path: impl AsRef<Path>, tracking_table: &str) -> MigrateResult<Self> {
        let path = path.as_ref().to_path_buf();
        debug!(path = %path.display(), "Opening SQLite database read-only");
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&path, flags)
            .await
            .map_err(|e| MigrationError::store_unavailable(format!("{}: {}", path.display(), e)))?;
        Self::from_connection(conn, tracking_table)
    }

    /// Open a private in-memory database.
    pub async fn open_in_memory(tracking_table: &str) -> MigrateResult<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| MigrationError::store_unavailable(e.to_string()))?;
        Self::from_connection(conn, tracking_table)
    }

    /// Wrap an existing connection.
    pub fn from_connection(conn: Connection, tracking_table: &str) -> MigrateResult<Self> {
        Ok(Self {
            conn,
            table: TrackingTable::new(tracking_table)?,
        })
    }

    /// The underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// The tracking table.
    pub fn tracking_table(&self) -> &TrackingTable {
        &self.table
    }

    /// Create the tracking table if it does not exist.
    pub async fn ensure_tracking_table(&self) -> MigrateResult<()> {
        let sql = self.table.create_sql();
        self.conn
            .call(move |conn| {
                conn.execute_batch(&sql)?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// A version store reading this database.
    pub fn version_store(&self) -> SqliteVersionStore {
        SqliteVersionStore { db: self.clone() }
    }

    /// A migration primitive running `.<extension>` scripts against this database.
    pub fn executor(&self, extension: impl Into<String>) -> SqliteExecutor {
        SqliteExecutor {
            db: self.clone(),
            extension: extension.into(),
        }
    }

    /// A schema dumper for this database.
    pub fn schema_dumper(&self) -> SqliteSchemaDumper {
        SqliteSchemaDumper { db: self.clone() }
    }
}

/// Reads applied versions from the tracking table.
#[derive(Clone)]
pub struct SqliteVersionStore {
    db: SqliteDatabase,
}

#[async_trait::async_trait]
impl VersionStore for SqliteVersionStore {
    async fn list_applied(&self) -> MigrateResult<BTreeSet<MigrationVersion>> {
        let sql = self.db.table.select_sql();
        debug!(sql = %sql, "Listing applied versions");

        let raw: Vec<Value> = self
            .db
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map([], |row| row.get::<_, Value>(0))?;
                let values: Result<Vec<_>, _> = rows.collect();
                Ok(values?)
            })
            .await
            .map_err(|e| MigrationError::store_unavailable(e.to_string()))?;

        raw.into_iter().map(version_from_value).collect()
    }
}

fn version_from_value(value: Value) -> MigrateResult<MigrationVersion> {
    match value {
        Value::Integer(n) => MigrationVersion::from_number(n),
        Value::Text(s) => MigrationVersion::parse(&s),
        other => Err(MigrationError::database(format!(
            "unexpected version value in tracking table: {:?}",
            other
        ))),
    }
}

/// Runs `-- migrate:up` / `-- migrate:down` SQL scripts.
///
/// The script section and the tracking-table change commit in one transaction.
#[derive(Clone)]
pub struct SqliteExecutor {
    db: SqliteDatabase,
    extension: String,
}

#[async_trait::async_trait]
impl MigrationExecutor for SqliteExecutor {
    async fn execute(
        &self,
        direction: Direction,
        search_paths: &[PathBuf],
        version: &MigrationVersion,
    ) -> MigrateResult<()> {
        let unit = locate_unit(search_paths, &self.extension, version).await?;
        let content = tokio::fs::read_to_string(&unit.path)
            .await
            .map_err(MigrationError::Io)?;
        let script = MigrationScript::parse(&content);

        if direction == Direction::Down && !script.is_reversible() {
            return Err(MigrationError::IrreversibleMigration(version.to_string()));
        }

        let sql = script.section(direction).to_string();
        let table = self.db.table.quoted();
        let version_text = version.to_string();

        let ran = self
            .db
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let applied: bool = tx.query_row(
                    &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE version = ?1)", table),
                    [&version_text],
                    |row| row.get(0),
                )?;

                let pending = match direction {
                    Direction::Up => !applied,
                    Direction::Down => applied,
                };
                if !pending {
                    return Ok(false);
                }

                tx.execute_batch(&sql)?;
                match direction {
                    Direction::Up => tx.execute(
                        &format!("INSERT INTO {} (version) VALUES (?1)", table),
                        [&version_text],
                    )?,
                    Direction::Down => tx.execute(
                        &format!("DELETE FROM {} WHERE version = ?1", table),
                        [&version_text],
                    )?,
                };
                tx.commit()?;
                Ok(true)
            })
            .await
            .map_err(|e| MigrationError::execution(direction, version.as_str(), e))?;

        if ran {
            info!(%direction, %version, file = %unit.filename, "Migrated");
        } else {
            debug!(%direction, %version, "Already in requested state, nothing to do");
        }
        Ok(())
    }
}

/// Dumps `sqlite_master` into a SQL snapshot file.
#[derive(Clone)]
pub struct SqliteSchemaDumper {
    db: SqliteDatabase,
}

impl SqliteSchemaDumper {
    /// The schema as rendered snapshot text.
    pub async fn dump(&self) -> MigrateResult<String> {
        let statements: Vec<String> = self
            .db
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT sql FROM sqlite_master \
                     WHERE sql IS NOT NULL AND name NOT LIKE 'sqlite_%' \
                     ORDER BY CASE type WHEN 'table' THEN 0 WHEN 'index' THEN 1 \
                     WHEN 'view' THEN 2 ELSE 3 END, name",
                )?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                let statements: Result<Vec<_>, _> = rows.collect();
                Ok(statements?)
            })
            .await
            .map_err(|e| MigrationError::snapshot(e.to_string()))?;

        Ok(render_snapshot(statements))
    }
}

#[async_trait::async_trait]
impl SchemaSnapshotNotifier for SqliteSchemaDumper {
    async fn write_snapshot(&self, destination: &Path) -> MigrateResult<()> {
        let contents = self.dump().await?;
        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MigrationError::snapshot(format!("{}: {}", parent.display(), e)))?;
        }
        tokio::fs::write(destination, contents)
            .await
            .map_err(|e| MigrationError::snapshot(format!("{}: {}", destination.display(), e)))?;
        info!(path = %destination.display(), "Wrote schema snapshot");
        Ok(())
    }
}
