//! Database Connection and Setup
//!
//! Manages the SQLite connection and migrations.

use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::DomainResult;

/// Shared connection handle
pub type SharedConnection = Arc<Mutex<Connection>>;

/// Open the database at `db_path` (":memory:" for an in-memory store)
pub async fn init_db(db_path: &Path) -> DomainResult<SharedConnection> {
    let conn = if db_path == Path::new(":memory:") {
        Connection::open_in_memory()?
    } else {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| crate::domain::DomainError::Internal(format!("Failed to create db dir: {}", e)))?;
        }
        Connection::open(db_path)?
    };

    run_migrations(&conn)?;
    log::info!("Database ready at {}", db_path.display());

    Ok(Arc::new(Mutex::new(conn)))
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> DomainResult<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            collection TEXT NOT NULL,
            owner_id TEXT NOT NULL,
            body TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
         );",
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_documents_owner ON documents(collection, owner_id)",
        [],
    )?;

    Ok(())
}
