//! Database Connection and Setup
//!
//! Manages SQLite database connection and migrations.

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult};

/// Path understood as "no file, keep everything in memory"
pub const IN_MEMORY: &str = ":memory:";

impl From<rusqlite::Error> for DomainError {
    fn from(e: rusqlite::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

/// Shared connection slot. `None` until `init_db` has run.
pub type SharedConnection = Arc<Mutex<Option<Connection>>>;

/// Database state wrapper
#[derive(Clone)]
pub struct DbState {
    pub conn: SharedConnection,
    db_path: PathBuf,
}

impl DbState {
    pub fn new(db_path: PathBuf) -> Self {
        Self {
            conn: Arc::new(Mutex::new(None)),
            db_path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }
}

/// Open (or create) the database at `db_path` and bring the schema up to date.
pub async fn init_db(db_path: &Path) -> DomainResult<DbState> {
    let path = db_path.to_path_buf();
    let conn = tokio::task::spawn_blocking(move || open_connection(&path))
        .await
        .map_err(|e| DomainError::Internal(format!("Database init task failed: {}", e)))??;

    let state = DbState::new(db_path.to_path_buf());
    *state.conn.lock().await = Some(conn);
    log::info!("Database ready at {}", db_path.display());
    Ok(state)
}

fn open_connection(db_path: &Path) -> DomainResult<Connection> {
    let conn = if db_path.as_os_str() == IN_MEMORY {
        Connection::open_in_memory()?
    } else {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| DomainError::Internal(format!("Failed to create {}: {}", parent.display(), e)))?;
        }
        let conn = Connection::open(db_path)?;
        let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        log::debug!("journal_mode={}", mode);
        conn
    };

    run_migrations(&conn)?;
    Ok(conn)
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> DomainResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> DomainResult<()> {
    // Items table - create if not exists
    conn.execute(
        "CREATE TABLE IF NOT EXISTS items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL CHECK (length(trim(title)) > 0),
            status TEXT NOT NULL DEFAULT 'PENDING' CHECK (status IN ('PENDING', 'DONE')),
            owner_id TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
        [],
    )?;

    // Soft-expiry deadline came after the first schema
    if !column_exists(conn, "items", "expired_at")? {
        conn.execute("ALTER TABLE items ADD COLUMN expired_at INTEGER", [])
            .map_err(|e| DomainError::Internal(format!("Failed to add expired_at: {}", e)))?;
    }

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_items_owner ON items(owner_id)",
        [],
    )?;

    Ok(())
}
