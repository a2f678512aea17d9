//! Background scheduler.
//!
//! Wakes up every `tick_secs`, runs page checks and news collection when
//! their intervals have elapsed, then analyzes and notifies whatever is
//! pending. Once a day, during the configured UTC hour, it also posts a
//! digest of the last 24 hours of alerts. Failures are logged and the loop
//! keeps going.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::SchedulerConfig;
use crate::pipeline::{run_cycle, run_digest, CycleOptions, Services};

/// Periodic monitoring loop.
pub struct Scheduler {
    services: Arc<Services>,
    tick: Duration,
    page_interval: Duration,
    news_interval: Duration,
    news_days_back: i64,
    last_page_check: Option<Instant>,
    last_news_run: Option<Instant>,
    digest_hour: Option<u32>,
    last_digest: Option<NaiveDate>,
}

impl Scheduler {
    pub fn new(services: Arc<Services>, config: &SchedulerConfig) -> Self {
        Self {
            services,
            tick: Duration::from_secs(config.tick_secs.max(1)),
            page_interval: Duration::from_secs(config.page_check_interval_secs),
            news_interval: Duration::from_secs(config.news_interval_secs),
            news_days_back: config.news_days_back,
            last_page_check: None,
            last_news_run: None,
            digest_hour: config.digest_enabled.then_some(config.digest_hour),
            last_digest: None,
        }
    }

    fn is_due(last: Option<Instant>, every: Duration, now: Instant) -> bool {
        match last {
            None => true,
            Some(last) => now.duration_since(last) >= every,
        }
    }

    /// Stages to run at `now`, recording the ones that start.
    fn plan(&mut self, now: Instant) -> CycleOptions {
        let check_pages = Self::is_due(self.last_page_check, self.page_interval, now);
        let collect_news = Self::is_due(self.last_news_run, self.news_interval, now);
        if check_pages {
            self.last_page_check = Some(now);
        }
        if collect_news {
            self.last_news_run = Some(now);
        }

        CycleOptions {
            check_pages,
            force_pages: false,
            collect_news,
            news_days_back: self.news_days_back,
            analyze: true,
            notify: true,
        }
    }

    /// Whether the daily digest should run at `now`, recording the run.
    fn digest_due(&mut self, now: DateTime<Utc>) -> bool {
        let Some(hour) = self.digest_hour else {
            return false;
        };
        let today = now.date_naive();
        if now.hour() != hour || self.last_digest == Some(today) {
            return false;
        }
        self.last_digest = Some(today);
        true
    }

    /// Run the loop forever.
    pub async fn run(mut self) {
        info!(
            "Scheduler started (tick: {}s, pages every {}s, news every {}s)",
            self.tick.as_secs(),
            self.page_interval.as_secs(),
            self.news_interval.as_secs()
        );
        if let Some(hour) = self.digest_hour {
            info!("Daily digest at {:02}:00 UTC", hour);
        }

        let mut timer = interval(self.tick);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            timer.tick().await;
            let options = self.plan(Instant::now());
            debug!(
                pages = options.check_pages,
                news = options.collect_news,
                "Scheduler tick"
            );

            let report = run_cycle(&self.services, options).await;
            for error in &report.errors {
                warn!("Scheduled stage failed: {}", error);
            }

            if self.digest_due(Utc::now()) {
                if let Err(e) = run_digest(&self.services).await {
                    warn!("Daily digest failed: {}", e);
                }
            }
        }
    }
}

/// Spawn the scheduler on the tokio runtime.
pub fn start_scheduler(services: Arc<Services>, config: &SchedulerConfig) -> JoinHandle<()> {
    let scheduler = Scheduler::new(services, config);
    tokio::spawn(scheduler.run())
}
