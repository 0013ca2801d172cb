use std::collections::HashSet;

use crate::models::DEFAULT_HIDE_TYPES;

/// True iff the post's status type is on the hide list. Exact match only,
/// status types are Facebook's own vocabulary.
pub fn should_hide(status_type: &str, hide_types: &HashSet<String>) -> bool {
    hide_types.contains(status_type)
}

/// Split a comma-separated list, trimming entries and dropping empty ones
pub fn split_hide_types(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Hide types as stored on a config, falling back to the defaults when unset or empty
pub fn parse_hide_types(stored: Option<&str>) -> Vec<String> {
    let types = stored.map(split_hide_types).unwrap_or_default();
    if types.is_empty() {
        DEFAULT_HIDE_TYPES.iter().map(|t| t.to_string()).collect()
    } else {
        types
    }
}
