use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status types hidden when a page has no explicit list
pub const DEFAULT_HIDE_TYPES: &[&str] = &["shared_story", "mobile_status_update", "added_photos"];

/// Per-page auto-hide configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoHideConfig {
    pub page_id: String,
    pub enabled: bool,
    /// Page access token used for Graph calls; the page is skipped when absent
    pub post_token: Option<String>,
    pub hide_types: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AutoHideConfig {
    /// Token to use for Graph calls, treating an empty string as missing
    pub fn usable_token(&self) -> Option<&str> {
        self.post_token.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// A post the sweeper has already hidden
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HiddenPost {
    pub page_id: String,
    pub post_id: String,
    pub hidden_at: DateTime<Utc>,
}

/// Request body for saving an auto-hide config
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertAutoHideConfigRequest {
    pub page_id: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    pub post_token: Option<String>,
    pub hide_types: Option<String>,
}

/// Auto-hide config as returned to the dashboard (token never echoed back)
#[derive(Debug, Clone, Serialize)]
pub struct AutoHideConfigResponse {
    pub page_id: String,
    pub enabled: bool,
    pub has_post_token: bool,
    pub hide_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<AutoHideConfig> for AutoHideConfigResponse {
    fn from(config: AutoHideConfig) -> Self {
        Self {
            has_post_token: config.usable_token().is_some(),
            page_id: config.page_id,
            enabled: config.enabled,
            hide_types: config.hide_types,
            updated_at: Some(config.updated_at),
        }
    }
}

impl AutoHideConfigResponse {
    /// Placeholder returned for pages that were never configured
    pub fn unconfigured(page_id: &str) -> Self {
        Self {
            page_id: page_id.to_string(),
            enabled: false,
            has_post_token: false,
            hide_types: DEFAULT_HIDE_TYPES.iter().map(|s| s.to_string()).collect(),
            updated_at: None,
        }
    }
}
