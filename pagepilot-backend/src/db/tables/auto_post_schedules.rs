//! Auto-post schedule database operations

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Result as SqliteResult, Row};

use super::super::sqlite::{format_timestamp, parse_optional_timestamp, parse_timestamp};
use super::super::Database;
use crate::models::{
    AutoPostSchedule, AutoPostScheduleUpdate, DEFAULT_INTERVAL_MINUTES, DEFAULT_SCHEDULE_MINUTES,
};

const SCHEDULE_COLUMNS: &str = "page_id, enabled, interval_minutes, schedule_minutes, post_token, \
     last_post_at, next_post_at, created_at, updated_at";

fn row_to_schedule(row: &Row) -> SqliteResult<AutoPostSchedule> {
    let enabled: i64 = row.get(1)?;
    let created_at_str: String = row.get(7)?;
    let updated_at_str: String = row.get(8)?;

    Ok(AutoPostSchedule {
        page_id: row.get(0)?,
        enabled: enabled != 0,
        interval_minutes: row.get(2)?,
        schedule_minutes: row.get(3)?,
        post_token: row.get(4)?,
        last_post_at: parse_optional_timestamp(5, row.get(5)?)?,
        next_post_at: parse_optional_timestamp(6, row.get(6)?)?,
        created_at: parse_timestamp(7, &created_at_str)?,
        updated_at: parse_timestamp(8, &updated_at_str)?,
    })
}

impl Database {
    pub fn get_auto_post_schedule(&self, page_id: &str) -> SqliteResult<Option<AutoPostSchedule>> {
        let conn = self.conn();

        conn.query_row(
            &format!("SELECT {} FROM auto_post_schedules WHERE page_id = ?1", SCHEDULE_COLUMNS),
            [page_id],
            row_to_schedule,
        )
        .optional()
    }

    /// Insert or partially update a schedule. Unset fields keep their stored
    /// value, or take the defaults on first insert.
    pub fn upsert_auto_post_schedule(
        &self,
        page_id: &str,
        update: &AutoPostScheduleUpdate<'_>,
    ) -> SqliteResult<AutoPostSchedule> {
        let conn = self.conn();
        let now = format_timestamp(Utc::now());

        conn.execute(
            "INSERT INTO auto_post_schedules
                (page_id, enabled, interval_minutes, schedule_minutes, post_token, created_at, updated_at)
             VALUES (?1, COALESCE(?2, 0), COALESCE(?3, ?7), COALESCE(?4, ?8), ?5, ?6, ?6)
             ON CONFLICT(page_id) DO UPDATE SET
                enabled = COALESCE(?2, auto_post_schedules.enabled),
                interval_minutes = COALESCE(?3, auto_post_schedules.interval_minutes),
                schedule_minutes = COALESCE(?4, auto_post_schedules.schedule_minutes),
                post_token = COALESCE(?5, auto_post_schedules.post_token),
                updated_at = ?6",
            rusqlite::params![
                page_id,
                update.enabled,
                update.interval_minutes,
                update.schedule_minutes,
                update.post_token,
                &now,
                DEFAULT_INTERVAL_MINUTES,
                DEFAULT_SCHEDULE_MINUTES,
            ],
        )?;

        drop(conn);

        self.get_auto_post_schedule(page_id)?
            .ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    /// Set (or clear) the next posting time
    pub fn set_next_post_at(&self, page_id: &str, next_post_at: Option<DateTime<Utc>>) -> SqliteResult<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE auto_post_schedules SET next_post_at = ?1, updated_at = ?2 WHERE page_id = ?3",
            rusqlite::params![
                next_post_at.map(format_timestamp),
                format_timestamp(Utc::now()),
                page_id
            ],
        )?;
        Ok(())
    }

    /// Record a completed post and advance the schedule
    pub fn record_auto_post(
        &self,
        page_id: &str,
        posted_at: DateTime<Utc>,
        next_post_at: DateTime<Utc>,
    ) -> SqliteResult<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE auto_post_schedules
             SET last_post_at = ?1, next_post_at = ?2, updated_at = ?1
             WHERE page_id = ?3",
            rusqlite::params![format_timestamp(posted_at), format_timestamp(next_post_at), page_id],
        )?;
        Ok(())
    }

    pub fn disable_auto_post_schedule(&self, page_id: &str) -> SqliteResult<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE auto_post_schedules SET enabled = 0, updated_at = ?1 WHERE page_id = ?2",
            rusqlite::params![format_timestamp(Utc::now()), page_id],
        )?;
        Ok(())
    }

    /// Enabled schedules with no next time yet, or one at or before `window_end`
    pub fn list_due_auto_post_schedules(
        &self,
        window_end: DateTime<Utc>,
    ) -> SqliteResult<Vec<AutoPostSchedule>> {
        let conn = self.conn();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM auto_post_schedules
             WHERE enabled = 1 AND (next_post_at IS NULL OR next_post_at <= ?1)
             ORDER BY page_id",
            SCHEDULE_COLUMNS
        ))?;

        let schedules = stmt
            .query_map([format_timestamp(window_end)], row_to_schedule)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(schedules)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::models::AutoPostScheduleUpdate;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_insert_applies_defaults() {
        let db = Database::new(":memory:").unwrap();

        let schedule = db
            .upsert_auto_post_schedule("page-1", &AutoPostScheduleUpdate::default())
            .unwrap();
        assert!(!schedule.enabled);
        assert_eq!(schedule.interval_minutes, 60);
        assert_eq!(schedule.schedule_minutes, "00,15,30,45");
        assert!(schedule.next_post_at.is_none());
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let db = Database::new(":memory:").unwrap();

        db.upsert_auto_post_schedule(
            "page-1",
            &AutoPostScheduleUpdate {
                enabled: Some(true),
                schedule_minutes: Some("05,35"),
                post_token: Some("tok"),
                ..Default::default()
            },
        )
        .unwrap();

        let schedule = db
            .upsert_auto_post_schedule(
                "page-1",
                &AutoPostScheduleUpdate {
                    interval_minutes: Some(30),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(schedule.enabled);
        assert_eq!(schedule.interval_minutes, 30);
        assert_eq!(schedule.schedule_minutes, "05,35");
        assert_eq!(schedule.post_token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_due_schedules() {
        let db = Database::new(":memory:").unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let enabled = AutoPostScheduleUpdate {
            enabled: Some(true),
            ..Default::default()
        };

        db.upsert_auto_post_schedule("never-run", &enabled).unwrap();
        db.upsert_auto_post_schedule("due", &enabled).unwrap();
        db.set_next_post_at("due", Some(now + Duration::minutes(10))).unwrap();
        db.upsert_auto_post_schedule("later", &enabled).unwrap();
        db.set_next_post_at("later", Some(now + Duration::hours(2))).unwrap();
        db.upsert_auto_post_schedule("disabled", &AutoPostScheduleUpdate::default())
            .unwrap();

        let due: Vec<String> = db
            .list_due_auto_post_schedules(now + Duration::minutes(15))
            .unwrap()
            .into_iter()
            .map(|s| s.page_id)
            .collect();
        assert_eq!(due, vec!["due", "never-run"]);
    }

    #[test]
    fn test_record_and_disable() {
        let db = Database::new(":memory:").unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let next = now + Duration::minutes(30);

        db.upsert_auto_post_schedule(
            "page-1",
            &AutoPostScheduleUpdate {
                enabled: Some(true),
                ..Default::default()
            },
        )
        .unwrap();
        db.record_auto_post("page-1", now, next).unwrap();
        db.disable_auto_post_schedule("page-1").unwrap();

        let schedule = db.get_auto_post_schedule("page-1").unwrap().unwrap();
        assert!(!schedule.enabled);
        assert_eq!(schedule.last_post_at, Some(now));
        assert_eq!(schedule.next_post_at, Some(next));
    }
}
