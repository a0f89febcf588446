use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};
use std::path::PathBuf;
use tracing::{debug, info};

mod contacts;
mod invalid;
mod schema;
mod settings;

pub use contacts::{diff_fields, SearchResults, UpsertOutcome};
pub use invalid::{INVALID_FORMAT_REASON, MANUAL_INVALID_REASON};
pub use schema::SCHEMA_VERSION;

/// Environment variable that overrides the default database location.
pub const ENV_DB_PATH: &str = "CONTACTSORT_DB";

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database, creating if needed, running migrations
    pub fn open() -> Result<Self> {
        let path = Self::default_path()?;
        Self::open_at(path)
    }

    pub fn open_at(path: PathBuf) -> Result<Self> {
        // Create parent directories
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        debug!(path = %path.display(), "opened database");

        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open in-memory database for testing
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(ENV_DB_PATH) {
            if !path.trim().is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join("contactsort").join("contacts.db"))
    }

    /// Apply every migration newer than the stored version, each in its own transaction.
    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(schema::SCHEMA_VERSION_TABLE)?;
        let current = self.get_schema_version()?;

        for (idx, sql) in schema::MIGRATIONS.iter().enumerate() {
            let version = idx as i32 + 1;
            if version <= current {
                continue;
            }
            let tx = self.conn.unchecked_transaction()?;
            tx.execute_batch(sql)?;
            tx.execute(
                "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?)",
                [version],
            )?;
            tx.commit()?;
            info!(version, "applied schema migration");
        }

        Ok(())
    }

    fn get_schema_version(&self) -> Result<i32> {
        let version = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(version.unwrap_or(0))
    }
}
