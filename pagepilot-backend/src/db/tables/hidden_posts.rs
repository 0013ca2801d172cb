//! Hidden post ledger operations
//!
//! One row per (page_id, post_id). Rows are only ever inserted, never
//! updated, so a post is recorded as hidden at most once no matter how many
//! sweeps overlap.

use chrono::{DateTime, Utc};
use rusqlite::{Result as SqliteResult, Row};

use super::super::sqlite::{format_timestamp, parse_timestamp};
use super::super::Database;
use crate::models::HiddenPost;

fn row_to_hidden_post(row: &Row) -> SqliteResult<HiddenPost> {
    let hidden_at_str: String = row.get(2)?;
    Ok(HiddenPost {
        page_id: row.get(0)?,
        post_id: row.get(1)?,
        hidden_at: parse_timestamp(2, &hidden_at_str)?,
    })
}

impl Database {
    /// Whether the post has already been recorded as hidden for this page
    pub fn is_post_hidden(&self, page_id: &str, post_id: &str) -> SqliteResult<bool> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM hidden_posts WHERE page_id = ?1 AND post_id = ?2",
            [page_id, post_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Record a confirmed hide. Returns false when the pair was already present.
    pub fn record_hidden_post(
        &self,
        page_id: &str,
        post_id: &str,
        hidden_at: DateTime<Utc>,
    ) -> SqliteResult<bool> {
        let conn = self.conn();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO hidden_posts (page_id, post_id, hidden_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![page_id, post_id, format_timestamp(hidden_at)],
        )?;
        Ok(inserted > 0)
    }

    /// Most recent ledger entries for a page, newest first
    pub fn list_hidden_posts(&self, page_id: &str, limit: usize) -> SqliteResult<Vec<HiddenPost>> {
        let conn = self.conn();

        let mut stmt = conn.prepare(
            "SELECT page_id, post_id, hidden_at FROM hidden_posts
             WHERE page_id = ?1 ORDER BY hidden_at DESC, rowid DESC LIMIT ?2",
        )?;

        let posts = stmt
            .query_map(rusqlite::params![page_id, limit as i64], row_to_hidden_post)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(posts)
    }
}
