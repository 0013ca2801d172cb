//! Quote library database operations
//!
//! Usage is tracked per page in `quote_usages`; a quote is "unused" for a
//! page when no usage row links the two.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Result as SqliteResult, Row};
use uuid::Uuid;

use super::super::sqlite::{format_timestamp, parse_timestamp};
use super::super::Database;
use crate::models::{Quote, QuoteCounts, QuoteFilter, QuoteListItem};

fn row_to_quote(row: &Row) -> SqliteResult<Quote> {
    let created_at_str: String = row.get(2)?;
    Ok(Quote {
        id: row.get(0)?,
        quote_text: row.get(1)?,
        created_at: parse_timestamp(2, &created_at_str)?,
    })
}

impl Database {
    /// Bulk import quote texts. Blank entries are skipped; returns the number inserted.
    pub fn insert_quotes(&self, texts: &[String]) -> SqliteResult<usize> {
        let mut conn = self.conn();
        let now = format_timestamp(Utc::now());
        let tx = conn.transaction()?;

        let mut inserted = 0;
        {
            let mut stmt =
                tx.prepare("INSERT INTO quotes (id, quote_text, created_at) VALUES (?1, ?2, ?3)")?;
            for text in texts {
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                stmt.execute(rusqlite::params![Uuid::new_v4().to_string(), text, &now])?;
                inserted += 1;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    /// Every quote, oldest first
    pub fn list_all_quotes(&self) -> SqliteResult<Vec<Quote>> {
        let conn = self.conn();

        let mut stmt = conn.prepare(
            "SELECT id, quote_text, created_at FROM quotes ORDER BY created_at ASC, rowid ASC",
        )?;

        let quotes = stmt
            .query_map([], row_to_quote)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(quotes)
    }

    /// Page through the library with usage flags for `page_id`
    pub fn list_quotes(
        &self,
        page_id: Option<&str>,
        filter: QuoteFilter,
        limit: usize,
        offset: usize,
    ) -> SqliteResult<Vec<QuoteListItem>> {
        let conn = self.conn();

        let condition = match filter {
            QuoteFilter::All => "1 = 1",
            QuoteFilter::Unused => "NOT EXISTS (SELECT 1 FROM quote_usages u WHERE u.quote_id = q.id)",
            QuoteFilter::Used => {
                "EXISTS (SELECT 1 FROM quote_usages u
                         WHERE u.quote_id = q.id AND (?1 IS NULL OR u.page_id = ?1))"
            }
        };

        let mut stmt = conn.prepare(&format!(
            "SELECT q.id, q.quote_text, q.created_at,
                EXISTS (SELECT 1 FROM quote_usages u WHERE u.quote_id = q.id),
                EXISTS (SELECT 1 FROM quote_usages u WHERE u.quote_id = q.id AND u.page_id = ?1)
             FROM quotes q
             WHERE {}
             ORDER BY q.created_at ASC, q.rowid ASC
             LIMIT ?2 OFFSET ?3",
            condition
        ))?;

        let items = stmt
            .query_map(
                rusqlite::params![page_id, limit as i64, offset as i64],
                |row| {
                    let created_at_str: String = row.get(2)?;
                    let is_used: i64 = row.get(3)?;
                    let used_here: i64 = row.get(4)?;
                    Ok(QuoteListItem {
                        id: row.get(0)?,
                        quote_text: row.get(1)?,
                        created_at: parse_timestamp(2, &created_at_str)?,
                        is_used: is_used != 0,
                        is_used_by_this_page: used_here != 0,
                    })
                },
            )?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(items)
    }

    /// Library totals. `used` counts quotes used by `page_id`, or by any page when none is given.
    pub fn quote_counts(&self, page_id: Option<&str>) -> SqliteResult<QuoteCounts> {
        let conn = self.conn();

        let (total, unused, used): (i64, i64, i64) = conn.query_row(
            "SELECT
                COUNT(*),
                COALESCE(SUM(NOT EXISTS (SELECT 1 FROM quote_usages u WHERE u.quote_id = q.id)), 0),
                COALESCE(SUM(EXISTS (SELECT 1 FROM quote_usages u
                                     WHERE u.quote_id = q.id AND (?1 IS NULL OR u.page_id = ?1))), 0)
             FROM quotes q",
            [page_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        Ok(QuoteCounts {
            total: total as usize,
            unused: unused as usize,
            used: used as usize,
        })
    }

    /// Oldest quote the page has not posted yet
    pub fn next_unused_quote(&self, page_id: &str) -> SqliteResult<Option<Quote>> {
        let conn = self.conn();

        conn.query_row(
            "SELECT q.id, q.quote_text, q.created_at FROM quotes q
             WHERE NOT EXISTS (SELECT 1 FROM quote_usages u WHERE u.quote_id = q.id AND u.page_id = ?1)
             ORDER BY q.created_at ASC, q.rowid ASC
             LIMIT 1",
            [page_id],
            row_to_quote,
        )
        .optional()
    }

    pub fn mark_quote_used(&self, quote_id: &str, page_id: &str, used_at: DateTime<Utc>) -> SqliteResult<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR IGNORE INTO quote_usages (quote_id, page_id, used_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![quote_id, page_id, format_timestamp(used_at)],
        )?;
        Ok(())
    }

    /// Delete quotes by id (usage rows cascade). Returns the number removed.
    pub fn delete_quotes(&self, ids: &[String]) -> SqliteResult<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let mut deleted = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM quotes WHERE id = ?1")?;
            for id in ids {
                deleted += stmt.execute([id])?;
            }
        }

        tx.commit()?;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::models::QuoteFilter;
    use chrono::Utc;

    fn seed(db: &Database, texts: &[&str]) -> Vec<String> {
        let texts: Vec<String> = texts.iter().map(|s| s.to_string()).collect();
        db.insert_quotes(&texts).unwrap();
        db.list_all_quotes().unwrap().into_iter().map(|q| q.id).collect()
    }

    #[test]
    fn test_insert_skips_blank_and_keeps_order() {
        let db = Database::new(":memory:").unwrap();

        let texts = vec!["first".to_string(), "   ".to_string(), " second ".to_string()];
        assert_eq!(db.insert_quotes(&texts).unwrap(), 2);

        let quotes = db.list_all_quotes().unwrap();
        let texts: Vec<&str> = quotes.iter().map(|q| q.quote_text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn test_next_unused_is_per_page() {
        let db = Database::new(":memory:").unwrap();
        let ids = seed(&db, &["a", "b"]);

        db.mark_quote_used(&ids[0], "page-1", Utc::now()).unwrap();
        // Marking twice is harmless
        db.mark_quote_used(&ids[0], "page-1", Utc::now()).unwrap();

        assert_eq!(db.next_unused_quote("page-1").unwrap().unwrap().quote_text, "b");
        assert_eq!(db.next_unused_quote("page-2").unwrap().unwrap().quote_text, "a");

        db.mark_quote_used(&ids[1], "page-1", Utc::now()).unwrap();
        assert!(db.next_unused_quote("page-1").unwrap().is_none());
    }

    #[test]
    fn test_filters_and_counts() {
        let db = Database::new(":memory:").unwrap();
        let ids = seed(&db, &["a", "b", "c"]);

        db.mark_quote_used(&ids[0], "page-1", Utc::now()).unwrap();
        db.mark_quote_used(&ids[1], "page-2", Utc::now()).unwrap();

        let unused = db.list_quotes(Some("page-1"), QuoteFilter::Unused, 50, 0).unwrap();
        assert_eq!(unused.len(), 1);
        assert_eq!(unused[0].quote_text, "c");

        let used_here = db.list_quotes(Some("page-1"), QuoteFilter::Used, 50, 0).unwrap();
        assert_eq!(used_here.len(), 1);
        assert!(used_here[0].is_used_by_this_page);

        let used_anywhere = db.list_quotes(None, QuoteFilter::Used, 50, 0).unwrap();
        assert_eq!(used_anywhere.len(), 2);

        let page = db.list_quotes(None, QuoteFilter::All, 2, 1).unwrap();
        let texts: Vec<&str> = page.iter().map(|q| q.quote_text.as_str()).collect();
        assert_eq!(texts, vec!["b", "c"]);

        let counts = db.quote_counts(Some("page-1")).unwrap();
        assert_eq!((counts.total, counts.unused, counts.used), (3, 1, 1));
        let counts = db.quote_counts(None).unwrap();
        assert_eq!((counts.total, counts.unused, counts.used), (3, 1, 2));
    }

    #[test]
    fn test_delete_cascades_usage() {
        let db = Database::new(":memory:").unwrap();
        let ids = seed(&db, &["a", "b"]);

        db.mark_quote_used(&ids[0], "page-1", Utc::now()).unwrap();
        assert_eq!(db.delete_quotes(&[ids[0].clone(), "missing".to_string()]).unwrap(), 1);

        let counts = db.quote_counts(None).unwrap();
        assert_eq!((counts.total, counts.used), (1, 0));
    }
}
