use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Quote text available to the auto-poster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub id: String,
    pub quote_text: String,
    pub created_at: DateTime<Utc>,
}

/// Quote row annotated with usage, for the library listing
#[derive(Debug, Clone, Serialize)]
pub struct QuoteListItem {
    pub id: String,
    pub quote_text: String,
    pub created_at: DateTime<Utc>,
    /// Used by any page
    pub is_used: bool,
    pub is_used_by_this_page: bool,
}

/// Listing filter: "unused" means no page has used the quote, "used" means
/// the requesting page has (or any page, when no page is given)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteFilter {
    #[default]
    All,
    Unused,
    Used,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct QuoteCounts {
    pub total: usize,
    pub unused: usize,
    pub used: usize,
}
