pub mod agents;
pub mod locations;
pub mod migrations;
pub mod models;
pub mod reports;
pub mod users;

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::error::{Error, Result};

pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// A SQLite database file. Every operation acquires its own connection
/// through [`Database::handle`] and releases it when the handle drops.
#[derive(Debug, Clone)]
pub struct Database {
    pub path: PathBuf,
    busy_timeout: Duration,
}

impl Database {
    /// Open (or create) the database at the given path and apply migrations.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT_MS)
    }

    pub fn open_with_timeout(path: &Path, busy_timeout_ms: u64) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database {
            path: path.to_path_buf(),
            busy_timeout: Duration::from_millis(busy_timeout_ms),
        };

        let mut conn = db.handle()?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        migrations::run_migrations(&mut conn)?;

        info!("Opened database: {}", path.display());

        Ok(db)
    }

    /// Default database path: ~/.agent-discoveries/agent-discoveries.db
    pub fn default_db_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| Error::Config {
            reason: "could not determine home directory".to_string(),
        })?;
        Ok(home.join(".agent-discoveries").join("agent-discoveries.db"))
    }

    /// Acquire a connection scoped to the caller. It is closed on drop, on
    /// every exit path.
    pub fn handle(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    pub fn schema_version(&self) -> Result<i64> {
        let conn = self.handle()?;
        migrations::schema_version(&conn)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::models::{NewAgent, NewLocation, NewLocationStatusReport, NewUser};
    use super::Database;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    /// A database in a throwaway directory. Keep the `TempDir` alive for the
    /// duration of the test.
    pub fn temp_db() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::open(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    pub fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            full_name: String::new(),
        }
    }

    /// Insert `count` users; on a fresh database their ids are `1..=count`.
    pub fn seed_users(db: &Database, count: i64) -> Vec<i64> {
        (1..=count)
            .map(|n| db.add_user(&new_user(&format!("user-{n}"))).unwrap())
            .collect()
    }

    pub fn new_agent(call_sign: &str, user_id: i64) -> NewAgent {
        NewAgent {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1985, 6, 15).unwrap(),
            rank: 3,
            call_sign: call_sign.to_string(),
            user_id,
        }
    }

    pub fn new_location(site_name: &str, region_id: Option<i64>) -> NewLocation {
        NewLocation {
            site_name: site_name.to_string(),
            location: "Harbour district".to_string(),
            time_zone: "Europe/London".to_string(),
            region_id,
        }
    }

    pub fn new_report(agent_id: i64, location_id: i64, report_time: &str) -> NewLocationStatusReport {
        NewLocationStatusReport {
            agent_id,
            location_id,
            status: 50,
            report_time: report_time.to_string(),
            report_body: "All quiet".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::temp_db;
    use super::*;

    #[test]
    fn test_open_creates_parent_and_migrates() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("dir").join("db.sqlite");
        let db = Database::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(db.schema_version().unwrap(), 4);
    }

    #[test]
    fn test_reopen_keeps_schema() {
        let (dir, db) = temp_db();
        let again = Database::open(&db.path).unwrap();
        assert_eq!(again.schema_version().unwrap(), 4);
        drop(dir);
    }

    #[test]
    fn test_handle_enables_foreign_keys() {
        let (_dir, db) = temp_db();
        let conn = db.handle().unwrap();
        let enabled: bool = conn
            .query_row("PRAGMA foreign_keys", [], |r| r.get(0))
            .unwrap();
        assert!(enabled);
    }
}
