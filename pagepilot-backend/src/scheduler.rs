//! Background scheduler
//!
//! Runs the hide sweep and the auto-poster on their own cron expressions
//! until cancelled. A job never overlaps with itself: the next fire time is
//! computed only after the current run finishes.

use chrono::Utc;
use cron::Schedule;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::auto_hide::HideSweeper;
use crate::auto_post::AutoPoster;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Cron expression (with seconds) for the hide sweep
    pub auto_hide_cron: String,
    /// Cron expression (with seconds) for the auto-poster
    pub auto_post_cron: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            auto_hide_cron: "0 */5 * * * *".to_string(),
            auto_post_cron: "0 * * * * *".to_string(),
        }
    }
}

pub struct Scheduler {
    sweeper: Arc<HideSweeper>,
    poster: Arc<AutoPoster>,
    hide_schedule: Schedule,
    post_schedule: Schedule,
}

impl Scheduler {
    pub fn new(
        sweeper: Arc<HideSweeper>,
        poster: Arc<AutoPoster>,
        config: &SchedulerConfig,
    ) -> Result<Self, String> {
        let hide_schedule = Schedule::from_str(&config.auto_hide_cron)
            .map_err(|e| format!("Invalid auto-hide cron '{}': {}", config.auto_hide_cron, e))?;
        let post_schedule = Schedule::from_str(&config.auto_post_cron)
            .map_err(|e| format!("Invalid auto-post cron '{}': {}", config.auto_post_cron, e))?;

        Ok(Self {
            sweeper,
            poster,
            hide_schedule,
            post_schedule,
        })
    }

    /// Run both jobs until `cancel` fires
    pub async fn start(&self, cancel: CancellationToken) {
        log::info!("[scheduler] Started");

        let sweeper = self.sweeper.clone();
        let hide_job = run_on_schedule("auto-hide", &self.hide_schedule, &cancel, move || {
            let sweeper = sweeper.clone();
            async move {
                match sweeper.run_hide_sweep().await {
                    Ok(report) => log::info!(
                        "[scheduler] auto-hide: {} pages, {} hidden",
                        report.processed,
                        report.total_hidden
                    ),
                    Err(e) => log::error!("[scheduler] auto-hide failed: {}", e),
                }
            }
        });

        let poster = self.poster.clone();
        let post_job = run_on_schedule("auto-post", &self.post_schedule, &cancel, move || {
            let poster = poster.clone();
            async move {
                match poster.run_auto_post().await {
                    Ok(report) if report.processed > 0 => log::info!(
                        "[scheduler] auto-post: {} due, {} posted",
                        report.processed,
                        report.posted
                    ),
                    Ok(_) => {}
                    Err(e) => log::error!("[scheduler] auto-post failed: {}", e),
                }
            }
        });

        tokio::join!(hide_job, post_job);
        log::info!("[scheduler] Stopped");
    }
}

async fn run_on_schedule<F, Fut>(name: &str, schedule: &Schedule, cancel: &CancellationToken, job: F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = ()>,
{
    loop {
        let Some(next) = schedule.upcoming(Utc).next() else {
            log::warn!("[scheduler] {} has no upcoming fire times", name);
            return;
        };
        let wait = (next - Utc::now()).to_std().unwrap_or_default();

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(wait) => {}
        }

        log::debug!("[scheduler] Running {}", name);
        job().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_expressions_parse() {
        let config = SchedulerConfig::default();
        assert!(Schedule::from_str(&config.auto_hide_cron).is_ok());
        assert!(Schedule::from_str(&config.auto_post_cron).is_ok());
    }

    #[test]
    fn test_hide_schedule_fires_every_five_minutes() {
        let schedule = Schedule::from_str(&SchedulerConfig::default().auto_hide_cron).unwrap();
        let times: Vec<_> = schedule.upcoming(Utc).take(2).collect();
        assert_eq!((times[1] - times[0]).num_minutes(), 5);
        assert_eq!(times[0].timestamp() % 300, 0);
    }

    #[tokio::test]
    async fn test_cancel_stops_the_loop() {
        let schedule = Schedule::from_str("0 0 0 1 1 *").unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let ran = std::sync::atomic::AtomicBool::new(false);
        let flag = &ran;
        run_on_schedule("test", &schedule, &cancel, move || async move {
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
        })
        .await;
        assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));
    }
}
