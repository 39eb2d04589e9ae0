use rusqlite::Connection;
use tracing::{info, warn};

use crate::error::Result;

/// Numbered schema migrations, applied in order and at most once each.
const MIGRATIONS: &[(i64, &str, &str)] = &[
    (
        1,
        "create_agents",
        "CREATE TABLE agents (
            agent_id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            date_of_birth TEXT NOT NULL,
            rank INTEGER NOT NULL DEFAULT 0,
            call_sign TEXT NOT NULL UNIQUE,
            user_id INTEGER NOT NULL UNIQUE
        );",
    ),
    (
        2,
        "create_regions_and_locations",
        "CREATE TABLE regions (
            region_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            summary TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE locations (
            location_id INTEGER PRIMARY KEY AUTOINCREMENT,
            site_name TEXT NOT NULL,
            location TEXT NOT NULL DEFAULT '',
            time_zone TEXT NOT NULL DEFAULT 'UTC',
            region_id INTEGER REFERENCES regions(region_id) ON DELETE SET NULL
        );",
    ),
    (
        3,
        "create_location_status_reports",
        "CREATE TABLE location_status_reports (
            report_id INTEGER PRIMARY KEY AUTOINCREMENT,
            agent_id INTEGER NOT NULL REFERENCES agents(agent_id) ON DELETE CASCADE,
            location_id INTEGER NOT NULL REFERENCES locations(location_id) ON DELETE CASCADE,
            status INTEGER NOT NULL DEFAULT 0,
            report_time TEXT NOT NULL,
            report_body TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX idx_reports_agent ON location_status_reports(agent_id);
        CREATE INDEX idx_reports_location ON location_status_reports(location_id);
        CREATE INDEX idx_reports_time ON location_status_reports(report_time);",
    ),
    (
        4,
        "create_users",
        "CREATE TABLE users (
            user_id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            full_name TEXT NOT NULL DEFAULT ''
        );

        INSERT INTO users (user_id, username)
            SELECT user_id, 'user-' || user_id FROM agents;

        CREATE TABLE agents_new (
            agent_id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            date_of_birth TEXT NOT NULL,
            rank INTEGER NOT NULL DEFAULT 0,
            call_sign TEXT NOT NULL UNIQUE,
            user_id INTEGER NOT NULL UNIQUE REFERENCES users(user_id) ON DELETE CASCADE
        );

        INSERT INTO agents_new SELECT agent_id, first_name, last_name, date_of_birth,
            rank, call_sign, user_id FROM agents;
        DROP TABLE agents;
        ALTER TABLE agents_new RENAME TO agents;",
    ),
];

/// Run all pending migrations.
///
/// Foreign keys are off while migrating so table rebuilds don't cascade;
/// they are checked once all migrations have run.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = OFF;
        CREATE TABLE IF NOT EXISTS schema_migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        );",
    )?;

    for &(id, name, sql) in MIGRATIONS {
        run_migration(conn, id, name, sql)?;
    }

    let violations: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_foreign_key_check",
        [],
        |row| row.get(0),
    )?;
    if violations > 0 {
        warn!("{violations} foreign key violation(s) after migrations");
    }

    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(())
}

fn run_migration(conn: &mut Connection, id: i64, name: &str, sql: &str) -> Result<()> {
    let already_applied: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM schema_migrations WHERE id = ?1",
        [id],
        |row| row.get(0),
    )?;

    if already_applied {
        return Ok(());
    }

    let tx = conn.transaction()?;
    tx.execute_batch(sql)?;
    tx.execute(
        "INSERT INTO schema_migrations (id, name) VALUES (?1, ?2)",
        rusqlite::params![id, name],
    )?;
    tx.commit()?;

    info!("Applied migration {id}: {name}");
    Ok(())
}

/// Highest applied migration id, or 0 on an empty database.
pub fn schema_version(conn: &Connection) -> Result<i64> {
    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(id), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}
