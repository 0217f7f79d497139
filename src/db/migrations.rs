use rusqlite::{Connection, Result};
use std::collections::HashMap;

/// Current database schema version
const CURRENT_VERSION: u32 = 1;

/// Migration system for managing database schema versions
pub struct MigrationManager;

impl MigrationManager {
    /// Initialize the database with the current schema
    /// This creates the schema_version table and applies all migrations
    pub fn initialize(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            [],
        )?;

        let current_version = Self::get_version(conn)?;

        for version in (current_version + 1)..=CURRENT_VERSION {
            Self::apply_migration(conn, version)?;
        }

        Ok(())
    }

    /// Apply a specific migration by version number
    fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
        let migrations = get_migrations();
        if let Some(migration) = migrations.get(&version) {
            let tx = conn.unchecked_transaction()?;
            migration(&tx)?;
            tx.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [version],
            )?;
            tx.commit()?;
            log::info!("Applied schema migration v{}", version);
            Ok(())
        } else {
            Err(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_MISUSE),
                Some(format!("No migration found for version {}", version)),
            ))
        }
    }

    /// Get the current schema version
    pub fn get_version(conn: &Connection) -> Result<u32> {
        conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
    }
}

type Migration = fn(&rusqlite::Transaction) -> Result<(), rusqlite::Error>;

/// Get all migrations indexed by version
fn get_migrations() -> HashMap<u32, Migration> {
    let mut migrations: HashMap<u32, Migration> = HashMap::new();
    migrations.insert(1, migration_v1);
    migrations
}

/// Migration v1: Initial schema
fn migration_v1(tx: &rusqlite::Transaction) -> Result<(), rusqlite::Error> {
    tx.execute(
        "CREATE TABLE contacts (
            id INTEGER PRIMARY KEY,
            name TEXT NULL,
            email TEXT NOT NULL UNIQUE,
            instagram TEXT NULL UNIQUE,
            phone TEXT NULL,
            company TEXT NULL,
            city TEXT NULL,
            country TEXT NULL,
            created_ts INTEGER NOT NULL,
            modified_ts INTEGER NOT NULL
        )",
        [],
    )?;
    tx.execute(
        "CREATE INDEX idx_contacts_name ON contacts(name)",
        [],
    )?;

    tx.execute(
        "CREATE TABLE pipelines (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT NULL,
            created_ts INTEGER NOT NULL
        )",
        [],
    )?;

    // Stage positions are contiguous per pipeline; kept so by StageRepo.
    tx.execute(
        "CREATE TABLE stages (
            id INTEGER PRIMARY KEY,
            pipeline_id INTEGER NOT NULL REFERENCES pipelines(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            color TEXT NULL,
            position INTEGER NOT NULL,
            created_ts INTEGER NOT NULL
        )",
        [],
    )?;
    tx.execute(
        "CREATE INDEX idx_stages_pipeline_position ON stages(pipeline_id, position)",
        [],
    )?;

    // Lead positions are contiguous per stage. No UNIQUE(stage_id, position):
    // shift UPDATEs pass through transient duplicates before the moved lead is written.
    tx.execute(
        "CREATE TABLE leads (
            id INTEGER PRIMARY KEY,
            contact_id INTEGER NOT NULL UNIQUE REFERENCES contacts(id) ON DELETE CASCADE,
            pipeline_id INTEGER NULL REFERENCES pipelines(id),
            stage_id INTEGER NULL REFERENCES stages(id),
            position INTEGER NULL,
            status TEXT NOT NULL CHECK(status IN ('cold','warm','hot')),
            priority TEXT NOT NULL CHECK(priority IN ('low','medium','high')),
            score INTEGER NULL,
            value REAL NULL,
            source TEXT NULL,
            last_interaction_ts INTEGER NULL,
            created_ts INTEGER NOT NULL,
            modified_ts INTEGER NOT NULL,
            CHECK((stage_id IS NULL) = (position IS NULL))
        )",
        [],
    )?;
    tx.execute(
        "CREATE INDEX idx_leads_stage_position ON leads(stage_id, position)",
        [],
    )?;
    tx.execute(
        "CREATE INDEX idx_leads_status ON leads(status)",
        [],
    )?;
    tx.execute(
        "CREATE INDEX idx_leads_created_ts ON leads(created_ts)",
        [],
    )?;

    tx.execute(
        "CREATE TABLE tasks (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            pending INTEGER NOT NULL DEFAULT 1,
            due_ts INTEGER NULL,
            contact_id INTEGER NULL REFERENCES contacts(id) ON DELETE CASCADE,
            lead_id INTEGER NULL REFERENCES leads(id) ON DELETE SET NULL,
            created_ts INTEGER NOT NULL
        )",
        [],
    )?;
    tx.execute(
        "CREATE INDEX idx_tasks_pending_due ON tasks(pending, due_ts)",
        [],
    )?;

    tx.execute(
        "CREATE TABLE messages (
            id INTEGER PRIMARY KEY,
            contact_id INTEGER NOT NULL REFERENCES contacts(id) ON DELETE CASCADE,
            channel TEXT NOT NULL,
            content TEXT NOT NULL,
            ts INTEGER NOT NULL
        )",
        [],
    )?;
    tx.execute(
        "CREATE INDEX idx_messages_contact ON messages(contact_id)",
        [],
    )?;
    tx.execute(
        "CREATE INDEX idx_messages_ts ON messages(ts)",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        MigrationManager::initialize(&conn).unwrap();
        MigrationManager::initialize(&conn).unwrap();
        assert_eq!(MigrationManager::get_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_lead_position_requires_stage() {
        let conn = Connection::open_in_memory().unwrap();
        MigrationManager::initialize(&conn).unwrap();
        conn.execute(
            "INSERT INTO contacts (email, created_ts, modified_ts) VALUES ('a@x.io', 0, 0)",
            [],
        ).unwrap();

        let result = conn.execute(
            "INSERT INTO leads (contact_id, position, status, priority, created_ts, modified_ts)
             VALUES (1, 0, 'cold', 'medium', 0, 0)",
            [],
        );
        assert!(result.is_err());
    }
}
