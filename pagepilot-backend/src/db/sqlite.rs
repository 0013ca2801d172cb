//! SQLite database - schema definitions and connection management
//!
//! This file contains:
//! - Database struct definition
//! - Connection management (new, init)
//! - Schema creation
//! - Timestamp helpers shared by the table modules
//!
//! All table operations are in the tables/ subdirectory.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Main database wrapper, a single connection behind a Mutex
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database and initialize schema.
    /// Pass ":memory:" for a throwaway in-memory database.
    pub fn new(database_url: &str) -> SqliteResult<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(database_url).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }

        let conn = Connection::open(database_url)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    /// Lock the connection. A poisoned lock is recovered since every
    /// statement runs to completion or fails atomically.
    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Initialize all database tables
    fn init(&self) -> SqliteResult<()> {
        let conn = self.conn();

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        // Per-page auto-hide configuration
        conn.execute(
            "CREATE TABLE IF NOT EXISTS auto_hide_configs (
                page_id TEXT PRIMARY KEY NOT NULL,
                enabled INTEGER NOT NULL DEFAULT 0,
                post_token TEXT,
                hide_types TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        // Ledger of posts already hidden; the composite key makes inserts idempotent
        conn.execute(
            "CREATE TABLE IF NOT EXISTS hidden_posts (
                page_id TEXT NOT NULL,
                post_id TEXT NOT NULL,
                hidden_at TEXT NOT NULL,
                PRIMARY KEY (page_id, post_id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_hidden_posts_hidden_at ON hidden_posts(page_id, hidden_at)",
            [],
        )?;

        // Recurring auto-post schedules
        conn.execute(
            "CREATE TABLE IF NOT EXISTS auto_post_schedules (
                page_id TEXT PRIMARY KEY NOT NULL,
                enabled INTEGER NOT NULL DEFAULT 0,
                interval_minutes INTEGER NOT NULL DEFAULT 60,
                schedule_minutes TEXT NOT NULL DEFAULT '00,15,30,45',
                post_token TEXT,
                last_post_at TEXT,
                next_post_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        // Quote library used by the auto-poster
        conn.execute(
            "CREATE TABLE IF NOT EXISTS quotes (
                id TEXT PRIMARY KEY NOT NULL,
                quote_text TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS quote_usages (
                quote_id TEXT NOT NULL REFERENCES quotes(id) ON DELETE CASCADE,
                page_id TEXT NOT NULL,
                used_at TEXT NOT NULL,
                PRIMARY KEY (quote_id, page_id)
            )",
            [],
        )?;

        // Auto-post attempt history
        conn.execute(
            "CREATE TABLE IF NOT EXISTS auto_post_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                page_id TEXT NOT NULL,
                quote_id TEXT,
                quote_text TEXT,
                status TEXT NOT NULL,
                error_message TEXT,
                facebook_post_id TEXT,
                scheduled_for TEXT,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_auto_post_logs_page ON auto_post_logs(page_id, created_at)",
            [],
        )?;

        Ok(())
    }
}

/// Format a timestamp for storage. Whole seconds in UTC with a `Z` suffix, so
/// that string comparison in SQL matches chronological order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a stored timestamp inside a row mapper
pub(crate) fn parse_timestamp(idx: usize, value: &str) -> SqliteResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Parse a nullable stored timestamp inside a row mapper
pub(crate) fn parse_optional_timestamp(
    idx: usize,
    value: Option<String>,
) -> SqliteResult<Option<DateTime<Utc>>> {
    value.map(|v| parse_timestamp(idx, &v)).transpose()
}
