//! Facebook Graph API collaborator
//!
//! The rest of the crate talks to Facebook only through the [`PageGraph`]
//! trait, so the sweeper and the auto-poster can run against a fake in tests.
//! Responses are narrowed to the few fields we use at this boundary.

mod client;

pub use client::GraphClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Facebook rejects scheduled posts closer than this to the present
pub const MIN_SCHEDULE_LEAD_MINUTES: i64 = 10;

/// A page post reduced to what the classifier needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagePost {
    pub id: String,
    pub status_type: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),
    #[error("Graph API error {code}: {message}")]
    Api { code: i64, message: String },
    #[error("Invalid Graph API response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for GraphError {
    fn from(err: reqwest::Error) -> Self {
        // Request URLs carry the access token, keep them out of error messages
        GraphError::Http(err.without_url())
    }
}

#[async_trait]
pub trait PageGraph: Send + Sync {
    /// Most recent posts of a page with their status type
    async fn list_recent_posts(
        &self,
        page_id: &str,
        token: &str,
        limit: usize,
    ) -> Result<Vec<PagePost>, GraphError>;

    /// Hide a post from the page timeline. Ok(true) only when Facebook confirms.
    async fn hide_post(&self, post_id: &str, token: &str) -> Result<bool, GraphError>;

    /// Unix timestamps of posts already scheduled on the page
    async fn scheduled_publish_times(&self, page_id: &str, token: &str) -> Result<Vec<i64>, GraphError>;

    /// Publish a text post, scheduled when `scheduled_at` is far enough ahead.
    /// Returns the Facebook post id.
    async fn publish_text_post(
        &self,
        page_id: &str,
        token: &str,
        message: &str,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Result<String, GraphError>;
}
