//! # erd-migrate
//!
//! Migration tracker and runner.
//!
//! This crate provides functionality for:
//! - Discovering `<version>_<name>.<ext>` migration files across search paths
//! - Reconciling them with the applied versions recorded in a tracking table
//! - Running requested migrations up or down, in the order given
//! - Writing a schema snapshot after a successful run
//! - Scaffolding new migration files through a pluggable generator
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌────────────────┐
//! │ Search Paths │────▶│ MigrationCatalog │◀────│  VersionStore  │
//! └──────────────┘     └──────────────────┘     └────────────────┘
//!                               │ status()              ▲
//!                               ▼                       │ insert/delete
//!                      ┌──────────────────┐     ┌────────────────┐
//!   MigrationRequest──▶│ MigrationRunner  │────▶│ MigrationExec. │
//!                      └──────────────────┘     └────────────────┘
//!                               │
//!                               ▼
//!                      ┌──────────────────┐
//!                      │ Snapshot Notifier│
//!                      └──────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use erd_migrate::{MigrationCatalog, MigrationRequest, MigrationRunner, MigratorConfig, SqliteDatabase};
//!
//! async fn migrate() -> erd_migrate::MigrateResult<()> {
//!     let config = MigratorConfig::new().project_root("./app").with_env();
//!     let db = SqliteDatabase::open("./app/db/development.sqlite3", &config.tracking_table).await?;
//!     db.ensure_tracking_table().await?;
//!
//!     let catalog = MigrationCatalog::new(&config, db.version_store());
//!     for entry in catalog.status().await? {
//!         println!("{:>4}  {}  {}", entry.status, entry.version, entry.name);
//!     }
//!
//!     let runner = MigrationRunner::new(config.clone(), db.executor(config.extension.clone()))
//!         .with_notifier(Arc::new(db.schema_dumper()));
//!     let request = MigrationRequest::new()
//!         .down(vec!["20120609010203", "20120512020202"])
//!         .up("db/migrate/20120423023323_create_products.sql");
//!     let report = runner.run(&request).await?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Migration Files
//!
//! ```text
//! db/migrate/
//! ├── 001_create_users.sql
//! ├── 002_add_index.sql
//! └── 20120423023323_create_products.sql
//! ```
//!
//! Each SQL file holds an up section and an optional down section:
//!
//! ```sql
//! -- migrate:up
//! CREATE TABLE users (id INTEGER PRIMARY KEY);
//!
//! -- migrate:down
//! DROP TABLE users;
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod generator;
pub mod runner;
pub mod snapshot;
pub mod sqlite;
pub mod store;
pub mod version;

// Re-exports
pub use catalog::{MigrationCatalog, MigrationState, MigrationUnit, NO_FILE, StatusEntry, StatusSummary};
pub use config::{MigratorConfig, SCHEMA_ENV};
pub use error::{MigrateResult, MigrationError};
pub use executor::{MigrationExecutor, MigrationScript, locate_unit};
pub use generator::{
    Generator, GeneratorContext, GeneratorKind, GeneratorOutput, MigrationGenerator,
    ScaffoldGenerator, ScopedArgs,
};
pub use runner::{MigrationRequest, MigrationRunner, RunReport, RunStep, Targets};
pub use snapshot::SchemaSnapshotNotifier;
pub use sqlite::{SqliteDatabase, SqliteExecutor, SqliteSchemaDumper, SqliteVersionStore};
pub use store::{InMemoryVersionStore, TrackingTable, VersionStore};
pub use version::{Direction, MigrationVersion};
