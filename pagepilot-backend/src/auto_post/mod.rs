//! Auto-post: publishes the next unused quote on each page's schedule

pub mod runner;

pub use runner::AutoPoster;
