//! Auto-hide config database operations

use chrono::Utc;
use rusqlite::{OptionalExtension, Result as SqliteResult, Row};

use super::super::sqlite::{format_timestamp, parse_timestamp};
use super::super::Database;
use crate::auto_hide::classifier::parse_hide_types;
use crate::models::AutoHideConfig;

const AUTO_HIDE_COLUMNS: &str = "page_id, enabled, post_token, hide_types, created_at, updated_at";

fn row_to_auto_hide_config(row: &Row) -> SqliteResult<AutoHideConfig> {
    let enabled: i64 = row.get(1)?;
    let hide_types: Option<String> = row.get(3)?;
    let created_at_str: String = row.get(4)?;
    let updated_at_str: String = row.get(5)?;

    Ok(AutoHideConfig {
        page_id: row.get(0)?,
        enabled: enabled != 0,
        post_token: row.get(2)?,
        hide_types: parse_hide_types(hide_types.as_deref()),
        created_at: parse_timestamp(4, &created_at_str)?,
        updated_at: parse_timestamp(5, &updated_at_str)?,
    })
}

impl Database {
    /// List every config with auto-hide enabled, ordered by page id
    pub fn list_enabled_auto_hide_configs(&self) -> SqliteResult<Vec<AutoHideConfig>> {
        let conn = self.conn();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM auto_hide_configs WHERE enabled = 1 ORDER BY page_id",
            AUTO_HIDE_COLUMNS
        ))?;

        let configs = stmt
            .query_map([], row_to_auto_hide_config)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(configs)
    }

    /// Get the config for a single page
    pub fn get_auto_hide_config(&self, page_id: &str) -> SqliteResult<Option<AutoHideConfig>> {
        let conn = self.conn();

        conn.query_row(
            &format!("SELECT {} FROM auto_hide_configs WHERE page_id = ?1", AUTO_HIDE_COLUMNS),
            [page_id],
            row_to_auto_hide_config,
        )
        .optional()
    }

    /// Insert or update a page's config.
    ///
    /// `enabled` is always overwritten; `post_token` and `hide_types` keep the
    /// stored value when `None` is passed.
    pub fn upsert_auto_hide_config(
        &self,
        page_id: &str,
        enabled: bool,
        post_token: Option<&str>,
        hide_types: Option<&[String]>,
    ) -> SqliteResult<AutoHideConfig> {
        let conn = self.conn();
        let now = format_timestamp(Utc::now());
        let hide_types = hide_types.map(|types| types.join(","));

        conn.execute(
            "INSERT INTO auto_hide_configs (page_id, enabled, post_token, hide_types, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(page_id) DO UPDATE SET
                enabled = excluded.enabled,
                post_token = COALESCE(excluded.post_token, auto_hide_configs.post_token),
                hide_types = COALESCE(excluded.hide_types, auto_hide_configs.hide_types),
                updated_at = excluded.updated_at",
            rusqlite::params![page_id, enabled, post_token, hide_types, &now],
        )?;

        drop(conn);

        self.get_auto_hide_config(page_id)?
            .ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    /// Delete a page's config. Ledger entries are kept.
    pub fn delete_auto_hide_config(&self, page_id: &str) -> SqliteResult<bool> {
        let conn = self.conn();
        let rows_affected = conn.execute(
            "DELETE FROM auto_hide_configs WHERE page_id = ?1",
            [page_id],
        )?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::models::DEFAULT_HIDE_TYPES;

    fn types(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_upsert_defaults_hide_types() {
        let db = Database::new(":memory:").unwrap();

        let config = db.upsert_auto_hide_config("page-1", true, Some("tok"), None).unwrap();
        assert!(config.enabled);
        assert_eq!(config.post_token.as_deref(), Some("tok"));
        assert_eq!(config.hide_types, types(DEFAULT_HIDE_TYPES));
    }

    #[test]
    fn test_upsert_keeps_token_and_types_when_omitted() {
        let db = Database::new(":memory:").unwrap();

        let only_shared = types(&["shared_story"]);
        db.upsert_auto_hide_config("page-1", true, Some("tok"), Some(only_shared.as_slice()))
            .unwrap();
        let updated = db.upsert_auto_hide_config("page-1", false, None, None).unwrap();

        assert!(!updated.enabled);
        assert_eq!(updated.post_token.as_deref(), Some("tok"));
        assert_eq!(updated.hide_types, types(&["shared_story"]));
    }

    #[test]
    fn test_list_enabled_only() {
        let db = Database::new(":memory:").unwrap();

        db.upsert_auto_hide_config("page-b", true, Some("b"), None).unwrap();
        db.upsert_auto_hide_config("page-a", true, None, None).unwrap();
        db.upsert_auto_hide_config("page-c", false, Some("c"), None).unwrap();

        let enabled: Vec<String> = db
            .list_enabled_auto_hide_configs()
            .unwrap()
            .into_iter()
            .map(|c| c.page_id)
            .collect();
        assert_eq!(enabled, vec!["page-a", "page-b"]);
    }

    #[test]
    fn test_delete() {
        let db = Database::new(":memory:").unwrap();

        db.upsert_auto_hide_config("page-1", true, None, None).unwrap();
        assert!(db.delete_auto_hide_config("page-1").unwrap());
        assert!(!db.delete_auto_hide_config("page-1").unwrap());
        assert!(db.get_auto_hide_config("page-1").unwrap().is_none());
    }
}
