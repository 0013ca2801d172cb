//! Auto-hide: hides page posts whose status type is on the page's list
//!
//! - `classifier` decides whether a post qualifies
//! - `sweeper` runs one sweep over every enabled page
//!
//! The `hidden_posts` table is the ledger that keeps a post from being
//! recorded twice across overlapping sweeps.

pub mod classifier;
pub mod sweeper;

pub use sweeper::{HideSweeper, SweepError, SweepLimits};
