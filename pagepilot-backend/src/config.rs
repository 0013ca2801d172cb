use std::env;

use crate::auto_hide::sweeper::{DEFAULT_BATCH_CAP, DEFAULT_FETCH_LIMIT};
use crate::scheduler::SchedulerConfig;

pub const DEFAULT_GRAPH_API_BASE: &str = "https://graph.facebook.com/v21.0";

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Bearer secret for the cron endpoints; open when unset
    pub cron_secret: Option<String>,
    pub graph_api_base: String,
    pub scheduler_enabled: bool,
    pub scheduler: SchedulerConfig,
    pub auto_hide_fetch_limit: usize,
    pub auto_hide_batch_cap: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = SchedulerConfig::default();
        Self {
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .expect("PORT must be a valid number"),
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| "./.db/pagepilot.db".to_string()),
            cron_secret: lookup("CRON_SECRET").filter(|s| !s.trim().is_empty()),
            graph_api_base: lookup("GRAPH_API_BASE").unwrap_or_else(|| DEFAULT_GRAPH_API_BASE.to_string()),
            scheduler_enabled: lookup("SCHEDULER_ENABLED")
                .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "no" | "off"))
                .unwrap_or(true),
            scheduler: SchedulerConfig {
                auto_hide_cron: lookup("AUTO_HIDE_CRON").unwrap_or(defaults.auto_hide_cron),
                auto_post_cron: lookup("AUTO_POST_CRON").unwrap_or(defaults.auto_post_cron),
            },
            auto_hide_fetch_limit: lookup("AUTO_HIDE_FETCH_LIMIT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_FETCH_LIMIT),
            auto_hide_batch_cap: lookup("AUTO_HIDE_BATCH_CAP")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_BATCH_CAP),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.database_url, "./.db/pagepilot.db");
        assert!(config.cron_secret.is_none());
        assert_eq!(config.graph_api_base, DEFAULT_GRAPH_API_BASE);
        assert!(config.scheduler_enabled);
        assert_eq!(config.scheduler.auto_hide_cron, "0 */5 * * * *");
        assert_eq!(config.auto_hide_fetch_limit, 50);
        assert_eq!(config.auto_hide_batch_cap, 5);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "9000"),
            ("CRON_SECRET", "s3cret"),
            ("SCHEDULER_ENABLED", "false"),
            ("AUTO_HIDE_BATCH_CAP", "3"),
            ("AUTO_HIDE_FETCH_LIMIT", "not-a-number"),
        ]);
        assert_eq!(config.port, 9000);
        assert_eq!(config.cron_secret.as_deref(), Some("s3cret"));
        assert!(!config.scheduler_enabled);
        assert_eq!(config.auto_hide_batch_cap, 3);
        assert_eq!(config.auto_hide_fetch_limit, 50);
    }

    #[test]
    fn test_blank_cron_secret_is_unset() {
        assert!(config_from(&[("CRON_SECRET", "  ")]).cron_secret.is_none());
    }
}
