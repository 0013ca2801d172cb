use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_INTERVAL_MINUTES: i64 = 60;
pub const DEFAULT_SCHEDULE_MINUTES: &str = "00,15,30,45";

/// Recurring auto-post schedule for a page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoPostSchedule {
    pub page_id: String,
    pub enabled: bool,
    pub interval_minutes: i64,
    /// Comma-separated minutes of the hour, e.g. "00,15,30,45"
    pub schedule_minutes: String,
    pub post_token: Option<String>,
    pub last_post_at: Option<DateTime<Utc>>,
    pub next_post_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AutoPostSchedule {
    pub fn usable_token(&self) -> Option<&str> {
        self.post_token.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// Partial update for an auto-post schedule; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct AutoPostScheduleUpdate<'a> {
    pub enabled: Option<bool>,
    pub interval_minutes: Option<i64>,
    pub schedule_minutes: Option<&'a str>,
    pub post_token: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertAutoPostScheduleRequest {
    pub page_id: Option<String>,
    pub enabled: Option<bool>,
    pub interval_minutes: Option<i64>,
    pub schedule_minutes: Option<String>,
    pub post_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoPostScheduleResponse {
    pub page_id: String,
    pub enabled: bool,
    pub interval_minutes: i64,
    pub schedule_minutes: String,
    pub has_post_token: bool,
    pub last_post_at: Option<DateTime<Utc>>,
    pub next_post_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<AutoPostSchedule> for AutoPostScheduleResponse {
    fn from(schedule: AutoPostSchedule) -> Self {
        Self {
            has_post_token: schedule.usable_token().is_some(),
            page_id: schedule.page_id,
            enabled: schedule.enabled,
            interval_minutes: schedule.interval_minutes,
            schedule_minutes: schedule.schedule_minutes,
            last_post_at: schedule.last_post_at,
            next_post_at: schedule.next_post_at,
            updated_at: schedule.updated_at,
        }
    }
}

/// Outcome of a single auto-post attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AutoPostLogStatus {
    Success,
    Failed,
}

/// History entry written by the auto-post runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoPostLog {
    pub id: i64,
    pub page_id: String,
    pub quote_id: Option<String>,
    pub quote_text: Option<String>,
    pub status: AutoPostLogStatus,
    pub error_message: Option<String>,
    pub facebook_post_id: Option<String>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new log entry
#[derive(Debug, Clone)]
pub struct NewAutoPostLog<'a> {
    pub page_id: &'a str,
    pub quote_id: Option<&'a str>,
    pub quote_text: Option<&'a str>,
    pub status: AutoPostLogStatus,
    pub error_message: Option<&'a str>,
    pub facebook_post_id: Option<&'a str>,
    pub scheduled_for: Option<DateTime<Utc>>,
}
