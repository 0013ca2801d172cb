//! Auto-post runner
//!
//! Each run picks up enabled schedules that are due within the look-ahead
//! window and hands one quote per page to Facebook as a scheduled post.
//! Slot selection avoids times the page already has something scheduled at.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::auto_hide::SweepError;
use crate::db::Database;
use crate::facebook::{GraphError, PageGraph};
use crate::models::{AutoPostLogStatus, AutoPostSchedule, NewAutoPostLog};
use crate::schedule::{next_available_slot, next_scheduled_time};

/// Schedules due before now + this are handled in the current run
const DUE_WINDOW_MINUTES: i64 = 15;
/// Minimum distance between now and a chosen slot
const SLOT_LEAD_MINUTES: i64 = 15;
/// Minimum retry delay after a failed attempt
const RETRY_DELAY_MINUTES: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoPostStatus {
    Success,
    Skipped,
    Disabled,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoPostResult {
    pub page_id: String,
    pub status: AutoPostStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook_post_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AutoPostResult {
    fn without_post(page_id: &str, status: AutoPostStatus, reason: String) -> Self {
        Self {
            page_id: page_id.to_string(),
            status,
            quote_id: None,
            facebook_post_id: None,
            scheduled_for: None,
            reason: Some(reason),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoPostReport {
    pub success: bool,
    pub processed: usize,
    pub posted: usize,
    pub results: Vec<AutoPostResult>,
}

#[derive(Debug, thiserror::Error)]
enum PostError {
    #[error("{0}")]
    Graph(#[from] GraphError),
    #[error("Database error: {0}")]
    Store(#[from] rusqlite::Error),
}

pub struct AutoPoster {
    db: Arc<Database>,
    graph: Arc<dyn PageGraph>,
}

impl AutoPoster {
    pub fn new(db: Arc<Database>, graph: Arc<dyn PageGraph>) -> Self {
        Self { db, graph }
    }

    /// Run one pass over the due schedules.
    ///
    /// Only a failure to load the schedules is an error. Everything that goes
    /// wrong for a single page is logged, written to the post log and reported
    /// in that page's result.
    pub async fn run_auto_post(&self) -> Result<AutoPostReport, SweepError> {
        let now = Utc::now();
        let schedules = self
            .db
            .list_due_auto_post_schedules(now + Duration::minutes(DUE_WINDOW_MINUTES))?;

        if schedules.is_empty() {
            log::debug!("[auto-post] No schedules due");
        } else {
            log::info!("[auto-post] {} schedules due", schedules.len());
        }

        let mut results = Vec::with_capacity(schedules.len());
        for schedule in &schedules {
            results.push(self.process_schedule(schedule, now).await);
        }

        let posted = results
            .iter()
            .filter(|r| r.status == AutoPostStatus::Success)
            .count();

        Ok(AutoPostReport {
            success: true,
            processed: schedules.len(),
            posted,
            results,
        })
    }

    async fn process_schedule(&self, schedule: &AutoPostSchedule, now: DateTime<Utc>) -> AutoPostResult {
        let page_id = schedule.page_id.as_str();

        let Some(token) = schedule.usable_token() else {
            log::info!("[auto-post] Page {}: no token, skipping", page_id);
            return AutoPostResult::without_post(page_id, AutoPostStatus::Skipped, "no_token".to_string());
        };

        let quote = match self.db.next_unused_quote(page_id) {
            Ok(Some(quote)) => quote,
            Ok(None) => {
                log::warn!("[auto-post] Page {}: out of quotes, disabling schedule", page_id);
                if let Err(e) = self.db.disable_auto_post_schedule(page_id) {
                    log::error!("[auto-post] Failed to disable schedule for {}: {}", page_id, e);
                }
                return AutoPostResult::without_post(page_id, AutoPostStatus::Disabled, "no_quotes".to_string());
            }
            Err(e) => return self.fail(schedule, None, None, now, PostError::Store(e)),
        };

        let mut taken = match self.graph.scheduled_publish_times(page_id, token).await {
            Ok(times) => times,
            Err(e) => {
                log::warn!("[auto-post] Page {}: could not list scheduled posts: {}", page_id, e);
                Vec::new()
            }
        };

        let lead = Duration::minutes(SLOT_LEAD_MINUTES);
        let slot = next_available_slot(&schedule.schedule_minutes, now, &taken, lead);

        let post_id = match self
            .graph
            .publish_text_post(page_id, token, &quote.quote_text, Some(slot))
            .await
        {
            Ok(id) => id,
            Err(e) => {
                let quote_ref = (quote.id.as_str(), quote.quote_text.as_str());
                return self.fail(schedule, Some(quote_ref), Some(slot), now, e.into());
            }
        };

        log::info!(
            "[auto-post] Page {}: scheduled quote {} for {} as {}",
            page_id,
            quote.id,
            slot,
            post_id
        );

        taken.push(slot.timestamp());
        let next = next_available_slot(&schedule.schedule_minutes, now, &taken, lead);

        let bookkeeping = self
            .db
            .mark_quote_used(&quote.id, page_id, now)
            .and_then(|_| self.db.record_auto_post(page_id, now, next))
            .and_then(|_| {
                self.db.insert_auto_post_log(&NewAutoPostLog {
                    page_id,
                    quote_id: Some(&quote.id),
                    quote_text: Some(&quote.quote_text),
                    status: AutoPostLogStatus::Success,
                    error_message: None,
                    facebook_post_id: Some(&post_id),
                    scheduled_for: Some(slot),
                })
            });
        if let Err(e) = bookkeeping {
            // The post is already with Facebook, so this still counts as posted
            log::error!("[auto-post] Page {}: failed to record post {}: {}", page_id, post_id, e);
        }

        AutoPostResult {
            page_id: page_id.to_string(),
            status: AutoPostStatus::Success,
            quote_id: Some(quote.id),
            facebook_post_id: Some(post_id),
            scheduled_for: Some(slot),
            reason: None,
        }
    }

    /// Log the failure and retry at the first scheduled minute after the delay
    fn fail(
        &self,
        schedule: &AutoPostSchedule,
        quote: Option<(&str, &str)>,
        scheduled_for: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        err: PostError,
    ) -> AutoPostResult {
        let page_id = schedule.page_id.as_str();
        let message = err.to_string();
        log::error!("[auto-post] Page {} failed: {}", page_id, message);

        let retry_at = next_scheduled_time(
            &schedule.schedule_minutes,
            now + Duration::minutes(RETRY_DELAY_MINUTES),
        );
        if let Err(e) = self.db.set_next_post_at(page_id, Some(retry_at)) {
            log::error!("[auto-post] Failed to reschedule {}: {}", page_id, e);
        }

        let entry = NewAutoPostLog {
            page_id,
            quote_id: quote.map(|(id, _)| id),
            quote_text: quote.map(|(_, text)| text),
            status: AutoPostLogStatus::Failed,
            error_message: Some(&message),
            facebook_post_id: None,
            scheduled_for,
        };
        if let Err(e) = self.db.insert_auto_post_log(&entry) {
            log::error!("[auto-post] Failed to write log for {}: {}", page_id, e);
        }

        AutoPostResult {
            page_id: page_id.to_string(),
            status: AutoPostStatus::Failed,
            quote_id: quote.map(|(id, _)| id.to_string()),
            facebook_post_id: None,
            scheduled_for,
            reason: Some(message),
        }
    }
}
