//! Schema snapshot notification.

use std::path::Path;

use crate::error::MigrateResult;

/// Receives control after a successful run and persists the resulting schema.
#[async_trait::async_trait]
pub trait SchemaSnapshotNotifier: Send + Sync {
    /// Write a snapshot of the current schema to `destination`.
    async fn write_snapshot(&self, destination: &Path) -> MigrateResult<()>;
}

#[async_trait::async_trait]
impl<T: SchemaSnapshotNotifier + ?Sized> SchemaSnapshotNotifier for std::sync::Arc<T> {
    async fn write_snapshot(&self, destination: &Path) -> MigrateResult<()> {
        (**self).write_snapshot(destination).await
    }
}

/// Header written at the top of generated snapshot files.
pub const SNAPSHOT_HEADER: &str = "\
-- This file is auto-generated from the current state of the database.
-- Edit the migrations instead, then run them to regenerate it.
";

/// Render snapshot statements into file contents.
pub fn render_snapshot<I, S>(statements: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::from(SNAPSHOT_HEADER);
    for statement in statements {
        let statement = statement.as_ref().trim().trim_end_matches(';');
        if statement.is_empty() {
            continue;
        }
        out.push('\n');
        out.push_str(statement);
        out.push_str(";\n");
    }
    out
}
