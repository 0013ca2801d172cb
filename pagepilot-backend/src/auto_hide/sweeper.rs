//! Hide sweep orchestration
//!
//! Pages are processed one at a time. Within a page: list recent posts,
//! keep the ones on the hide list that aren't in the ledger, hide at most
//! `batch_cap` of them and record each confirmed hide.
//!
//! Delivery is at-least-once for the hide call and at-most-once for the
//! ledger row. Anything not confirmed stays out of the ledger and is picked
//! up again by the next sweep; there is no other retry.

use chrono::Utc;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

use super::classifier::should_hide;
use crate::db::Database;
use crate::facebook::{GraphError, PageGraph};
use crate::models::AutoHideConfig;

pub const DEFAULT_FETCH_LIMIT: usize = 50;
pub const DEFAULT_BATCH_CAP: usize = 5;
const MIN_FETCH_LIMIT: usize = 20;

/// Per-run bounds for a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepLimits {
    /// Posts requested per page
    pub fetch_limit: usize,
    /// Hide attempts per page per sweep
    pub batch_cap: usize,
}

impl SweepLimits {
    pub fn new(fetch_limit: usize, batch_cap: usize) -> Self {
        Self {
            fetch_limit: fetch_limit.clamp(MIN_FETCH_LIMIT, DEFAULT_FETCH_LIMIT),
            batch_cap: batch_cap.max(1),
        }
    }
}

impl Default for SweepLimits {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_LIMIT, DEFAULT_BATCH_CAP)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSweepStatus {
    Success,
    Skipped,
    Error,
}

/// Outcome for one page in a sweep
#[derive(Debug, Clone, Serialize)]
pub struct PageSweepResult {
    pub page_id: String,
    pub status: PageSweepStatus,
    pub hidden: usize,
    /// Candidates left for a later sweep (over the cap, or failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PageSweepResult {
    fn success(page_id: &str, hidden: usize, pending: usize) -> Self {
        Self {
            page_id: page_id.to_string(),
            status: PageSweepStatus::Success,
            hidden,
            pending: Some(pending),
            reason: None,
        }
    }

    fn skipped(page_id: &str, reason: &str) -> Self {
        Self {
            page_id: page_id.to_string(),
            status: PageSweepStatus::Skipped,
            hidden: 0,
            pending: None,
            reason: Some(reason.to_string()),
        }
    }

    fn error(page_id: &str, reason: String) -> Self {
        Self {
            page_id: page_id.to_string(),
            status: PageSweepStatus::Error,
            hidden: 0,
            pending: None,
            reason: Some(reason),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub success: bool,
    pub processed: usize,
    pub total_hidden: usize,
    pub results: Vec<PageSweepResult>,
}

/// Sweep-level failure. Anything scoped to a single page ends up in that
/// page's result instead.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("Row store unavailable: {0}")]
    StoreUnavailable(#[from] rusqlite::Error),
}

/// Failure while processing one page
#[derive(Debug, thiserror::Error)]
enum PageError {
    #[error("{0}")]
    Graph(#[from] GraphError),
    #[error("Ledger lookup failed: {0}")]
    Ledger(#[from] rusqlite::Error),
}

struct PageOutcome {
    hidden: usize,
    pending: usize,
}

pub struct HideSweeper {
    db: Arc<Database>,
    graph: Arc<dyn PageGraph>,
    limits: SweepLimits,
}

impl HideSweeper {
    pub fn new(db: Arc<Database>, graph: Arc<dyn PageGraph>, limits: SweepLimits) -> Self {
        Self { db, graph, limits }
    }

    /// Run one sweep over every enabled page.
    ///
    /// Only a failure to load the configs is an error; page-level failures
    /// are reported in the page's result and the sweep moves on.
    pub async fn run_hide_sweep(&self) -> Result<SweepReport, SweepError> {
        let configs = self.db.list_enabled_auto_hide_configs()?;

        if configs.is_empty() {
            log::info!("[auto-hide] No pages with auto-hide enabled");
            return Ok(SweepReport {
                success: true,
                processed: 0,
                total_hidden: 0,
                results: Vec::new(),
            });
        }

        log::info!("[auto-hide] Processing {} pages", configs.len());

        let mut results = Vec::with_capacity(configs.len());
        for config in &configs {
            let result = match config.usable_token() {
                None => {
                    log::info!("[auto-hide] Page {}: no token, skipping", config.page_id);
                    PageSweepResult::skipped(&config.page_id, "no_token")
                }
                Some(token) => match self.sweep_page(config, token).await {
                    Ok(outcome) => {
                        log::info!(
                            "[auto-hide] Page {}: hidden {} posts, {} pending",
                            config.page_id,
                            outcome.hidden,
                            outcome.pending
                        );
                        PageSweepResult::success(&config.page_id, outcome.hidden, outcome.pending)
                    }
                    Err(e) => {
                        log::error!("[auto-hide] Page {} failed: {}", config.page_id, e);
                        PageSweepResult::error(&config.page_id, e.to_string())
                    }
                },
            };
            results.push(result);
        }

        let total_hidden = results.iter().map(|r| r.hidden).sum();

        Ok(SweepReport {
            success: true,
            processed: configs.len(),
            total_hidden,
            results,
        })
    }

    async fn sweep_page(&self, config: &AutoHideConfig, token: &str) -> Result<PageOutcome, PageError> {
        let hide_types: HashSet<String> = config.hide_types.iter().cloned().collect();

        let posts = self
            .graph
            .list_recent_posts(&config.page_id, token, self.limits.fetch_limit)
            .await?;

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for post in &posts {
            if !should_hide(&post.status_type, &hide_types) || !seen.insert(post.id.as_str()) {
                continue;
            }
            if !self.db.is_post_hidden(&config.page_id, &post.id)? {
                candidates.push(post.id.as_str());
            }
        }

        let over_cap = candidates.len().saturating_sub(self.limits.batch_cap);
        candidates.truncate(self.limits.batch_cap);

        let mut hidden = 0;
        let mut failed = 0;
        for post_id in candidates {
            match self.graph.hide_post(post_id, token).await {
                Ok(true) => {
                    // The post is hidden either way; a missed ledger write only
                    // means a redundant hide call next sweep
                    if let Err(e) = self.db.record_hidden_post(&config.page_id, post_id, Utc::now()) {
                        log::error!("[auto-hide] Failed to record hidden post {}: {}", post_id, e);
                    }
                    hidden += 1;
                }
                Ok(false) => {
                    log::warn!("[auto-hide] Hide of post {} was not confirmed", post_id);
                    failed += 1;
                }
                Err(e) => {
                    log::warn!("[auto-hide] Error hiding post {}: {}", post_id, e);
                    failed += 1;
                }
            }
        }

        Ok(PageOutcome {
            hidden,
            pending: over_cap + failed,
        })
    }
}
