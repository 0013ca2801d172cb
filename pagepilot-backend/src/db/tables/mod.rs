//! Database table modules - extends Database with domain-specific methods
//!
//! Each module adds `impl Database` blocks with methods for a specific table group.

mod auto_hide_configs;   // auto_hide_configs
mod hidden_posts;        // hidden_posts (dedup ledger)
mod auto_post_schedules; // auto_post_schedules
mod auto_post_logs;      // auto_post_logs
mod quotes;              // quotes, quote_usages
