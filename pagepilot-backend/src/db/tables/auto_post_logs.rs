//! Auto-post log database operations

use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{Result as SqliteResult, Row};
use std::str::FromStr;

use super::super::sqlite::{format_timestamp, parse_optional_timestamp, parse_timestamp};
use super::super::Database;
use crate::models::{AutoPostLog, AutoPostLogStatus, NewAutoPostLog};

fn row_to_log(row: &Row) -> SqliteResult<AutoPostLog> {
    let status_str: String = row.get(4)?;
    let created_at_str: String = row.get(8)?;

    let status = AutoPostLogStatus::from_str(&status_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(AutoPostLog {
        id: row.get(0)?,
        page_id: row.get(1)?,
        quote_id: row.get(2)?,
        quote_text: row.get(3)?,
        status,
        error_message: row.get(5)?,
        facebook_post_id: row.get(6)?,
        scheduled_for: parse_optional_timestamp(7, row.get(7)?)?,
        created_at: parse_timestamp(8, &created_at_str)?,
    })
}

impl Database {
    pub fn insert_auto_post_log(&self, log: &NewAutoPostLog<'_>) -> SqliteResult<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO auto_post_logs
                (page_id, quote_id, quote_text, status, error_message, facebook_post_id, scheduled_for, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                log.page_id,
                log.quote_id,
                log.quote_text,
                log.status.as_ref(),
                log.error_message,
                log.facebook_post_id,
                log.scheduled_for.map(format_timestamp),
                format_timestamp(Utc::now()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Latest log entries for a page, newest first
    pub fn list_auto_post_logs(&self, page_id: &str, limit: usize) -> SqliteResult<Vec<AutoPostLog>> {
        let conn = self.conn();

        let mut stmt = conn.prepare(
            "SELECT id, page_id, quote_id, quote_text, status, error_message, facebook_post_id, scheduled_for, created_at
             FROM auto_post_logs WHERE page_id = ?1
             ORDER BY id DESC LIMIT ?2",
        )?;

        let logs = stmt
            .query_map(rusqlite::params![page_id, limit as i64], row_to_log)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::models::{AutoPostLogStatus, NewAutoPostLog};

    #[test]
    fn test_insert_and_list_newest_first() {
        let db = Database::new(":memory:").unwrap();

        db.insert_auto_post_log(&NewAutoPostLog {
            page_id: "page-1",
            quote_id: Some("q1"),
            quote_text: Some("hello"),
            status: AutoPostLogStatus::Success,
            error_message: None,
            facebook_post_id: Some("123_456"),
            scheduled_for: None,
        })
        .unwrap();
        db.insert_auto_post_log(&NewAutoPostLog {
            page_id: "page-1",
            quote_id: None,
            quote_text: None,
            status: AutoPostLogStatus::Failed,
            error_message: Some("boom"),
            facebook_post_id: None,
            scheduled_for: None,
        })
        .unwrap();

        let logs = db.list_auto_post_logs("page-1", 10).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].status, AutoPostLogStatus::Failed);
        assert_eq!(logs[0].error_message.as_deref(), Some("boom"));
        assert_eq!(logs[1].facebook_post_id.as_deref(), Some("123_456"));

        assert!(db.list_auto_post_logs("page-2", 10).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_status_fails_the_listing() {
        let db = Database::new(":memory:").unwrap();
        db.conn()
            .execute(
                "INSERT INTO auto_post_logs (page_id, status, created_at)
                 VALUES ('page-1', 'exploded', '2024-01-01T00:00:00Z')",
                [],
            )
            .unwrap();

        assert!(db.list_auto_post_logs("page-1", 10).is_err());
    }
}
