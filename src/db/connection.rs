use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;
use anyhow::{Context, Result};
use crate::config::Config;
use crate::db::migrations::MigrationManager;

/// How long a writer waits on another connection's lock before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database connection manager
pub struct DbConnection;

impl DbConnection {
    /// Connect to the configured database, creating it and parent directories if needed
    pub fn connect(config: &Config) -> Result<Connection> {
        Self::open(&config.data_location)
    }

    /// Open (or create) the database at `db_path` and bring its schema up to date
    pub fn open(db_path: &Path) -> Result<Connection> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
        log::debug!("Opened database {}", db_path.display());

        Self::prepare(&conn)?;
        Ok(conn)
    }

    /// Connect to an in-memory database (for testing)
    pub fn connect_in_memory() -> Result<Connection> {
        let conn = Connection::open_in_memory()
            .context("Failed to open in-memory database")?;

        Self::prepare(&conn)?;
        Ok(conn)
    }

    fn prepare(conn: &Connection) -> Result<()> {
        // foreign_keys is per connection and a no-op inside a transaction
        conn.execute_batch("PRAGMA foreign_keys=ON")
            .context("Failed to enable foreign keys")?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .context("Failed to set busy timeout")?;

        MigrationManager::initialize(conn)
            .context("Failed to initialize database schema")?;
        Ok(())
    }
}
