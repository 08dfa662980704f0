//! Recurring automation scheduler
//!
//! Fires the posting/monitoring pass on a fixed cadence. Run state is
//! owned here and only mutated through these methods; status endpoints
//! read it through [`AutomationScheduler::status`].

use crate::config::settings::SchedulerSettings;
use crate::types::{RunStats, StatusResponse};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The posting/monitoring routine driven by the scheduler
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Cheap existence check for pending work. Runs on every tick, so it
    /// must not spin up a browser.
    async fn pending_count(&self) -> Result<u64>;

    /// Execute one full posting/monitoring pass
    async fn process_pending(&self) -> Result<RunStats>;
}

/// Recurring single-flight scheduler over a [`JobRunner`]
pub struct AutomationScheduler {
    runner: Arc<dyn JobRunner>,
    settings: SchedulerSettings,
    enabled: AtomicBool,
    running: AtomicBool,
    timer: Mutex<Option<tokio::task::JoinHandle<()>>>,
    last_tick: Mutex<Option<DateTime<Utc>>>,
}

impl AutomationScheduler {
    /// Create a scheduler; auto-scheduling starts in the configured state
    pub fn new(runner: Arc<dyn JobRunner>, settings: SchedulerSettings) -> Self {
        let enabled = AtomicBool::new(settings.auto_start);
        Self {
            runner,
            settings,
            enabled,
            running: AtomicBool::new(false),
            timer: Mutex::new(None),
            last_tick: Mutex::new(None),
        }
    }

    /// Install the recurring timer.
    ///
    /// The first pass runs after the configured initial delay so the rest
    /// of the process finishes starting up first.
    pub fn start(self: Arc<Self>) {
        let mut timer = self.timer.lock().expect("timer mutex poisoned");
        if timer.is_some() {
            tracing::warn!("Automation scheduler already started");
            return;
        }

        tracing::info!(
            "Starting automation scheduler, interval {:?}",
            self.settings.interval
        );

        let scheduler = Arc::clone(&self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(scheduler.settings.initial_delay).await;
            let mut interval = tokio::time::interval(scheduler.settings.interval);
            loop {
                interval.tick().await;
                scheduler.tick().await;
            }
        });

        *timer = Some(handle);
    }

    /// One scheduling tick. Public so manual frontends and tests can
    /// drive the same path the timer does.
    pub async fn tick(&self) {
        // Single-flight: a prior pass still holding the flag means this
        // tick is dropped, not queued
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::info!("Previous automation pass still running, skipping tick");
            return;
        }

        if !self.enabled.load(Ordering::SeqCst) {
            tracing::debug!("Auto-scheduling disabled, skipping tick");
            self.running.store(false, Ordering::SeqCst);
            return;
        }

        *self.last_tick.lock().expect("tick mutex poisoned") = Some(Utc::now());

        // Existence check before paying for a browser
        match self.runner.pending_count().await {
            Ok(0) => {
                tracing::debug!("No pending work this cycle");
            }
            Ok(count) => {
                tracing::info!("Processing {} pending job/group pairs", count);
                match self.runner.process_pending().await {
                    Ok(stats) => {
                        tracing::info!(
                            "Automation pass completed: {}/{} successful",
                            stats.successful,
                            stats.total
                        );
                    }
                    Err(e) => {
                        // Degrade to "nothing processed this cycle"; the
                        // next tick tries again
                        tracing::error!("Automation pass failed: {}", e);
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Pending-work check failed: {}", e);
            }
        }

        self.running.store(false, Ordering::SeqCst);
    }

    /// Run one pass immediately on behalf of an operator.
    ///
    /// Unlike a timer tick this propagates the failure to the caller and
    /// ignores the enabled flag.
    pub async fn run_now(&self) -> Result<RunStats> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::scheduler("an automation pass is already running"));
        }

        *self.last_tick.lock().expect("tick mutex poisoned") = Some(Utc::now());
        let result = self.runner.process_pending().await;
        self.running.store(false, Ordering::SeqCst);
        result
    }

    /// Enable auto-scheduling
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
        tracing::info!("Auto-scheduling enabled");
    }

    /// Disable auto-scheduling; the timer keeps firing but ticks no-op
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
        tracing::info!("Auto-scheduling disabled");
    }

    /// Current run state
    pub fn status(&self) -> StatusResponse {
        StatusResponse {
            scheduled: self
                .timer
                .lock()
                .expect("timer mutex poisoned")
                .as_ref()
                .is_some_and(|handle| !handle.is_finished()),
            running: self.running.load(Ordering::SeqCst),
            enabled: self.enabled.load(Ordering::SeqCst),
            last_tick: *self.last_tick.lock().expect("tick mutex poisoned"),
        }
    }

    /// Cancel the timer. In-flight work is not awaited; posting status is
    /// recorded per job/group pair, so a half-finished pass resumes on
    /// the next start.
    pub fn shutdown(&self) {
        if let Some(handle) = self.timer.lock().expect("timer mutex poisoned").take() {
            handle.abort();
            tracing::info!("Automation scheduler stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use std::time::Duration;

    /// Runner that records invocations and can be made slow or failing
    struct CountingRunner {
        pending: u64,
        process_calls: AtomicU64,
        delay: Duration,
        fail: bool,
    }

    impl CountingRunner {
        fn new(pending: u64) -> Self {
            Self {
                pending,
                process_calls: AtomicU64::new(0),
                delay: Duration::ZERO,
                fail: false,
            }
        }
    }

    #[async_trait]
    impl JobRunner for CountingRunner {
        async fn pending_count(&self) -> Result<u64> {
            Ok(self.pending)
        }

        async fn process_pending(&self) -> Result<RunStats> {
            self.process_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(Error::scheduler("boom"));
            }
            Ok(RunStats {
                total: self.pending,
                successful: self.pending,
                failed: 0,
            })
        }
    }

    fn quick_settings() -> SchedulerSettings {
        SchedulerSettings {
            interval: Duration::from_millis(50),
            initial_delay: Duration::ZERO,
            auto_start: true,
        }
    }

    #[tokio::test]
    async fn test_tick_processes_pending_work() {
        let runner = Arc::new(CountingRunner::new(2));
        let scheduler = AutomationScheduler::new(runner.clone(), quick_settings());

        scheduler.tick().await;
        assert_eq!(runner.process_calls.load(Ordering::SeqCst), 1);
        assert!(scheduler.status().last_tick.is_some());
    }

    #[tokio::test]
    async fn test_tick_skips_when_nothing_pending() {
        let runner = Arc::new(CountingRunner::new(0));
        let scheduler = AutomationScheduler::new(runner.clone(), quick_settings());

        scheduler.tick().await;
        assert_eq!(runner.process_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_tick_skips_when_disabled() {
        let runner = Arc::new(CountingRunner::new(5));
        let scheduler = AutomationScheduler::new(runner.clone(), quick_settings());

        scheduler.disable();
        scheduler.tick().await;
        assert_eq!(runner.process_calls.load(Ordering::SeqCst), 0);

        scheduler.enable();
        scheduler.tick().await;
        assert_eq!(runner.process_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_single_flight() {
        let mut runner = CountingRunner::new(1);
        runner.delay = Duration::from_millis(200);
        let runner = Arc::new(runner);
        let scheduler = Arc::new(AutomationScheduler::new(runner.clone(), quick_settings()));

        let slow = {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move { scheduler.tick().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Second tick while the first is mid-pass must not start another
        scheduler.tick().await;
        slow.await.unwrap();

        assert_eq!(runner.process_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_pass_does_not_wedge_the_flag() {
        let mut runner = CountingRunner::new(1);
        runner.fail = true;
        let runner = Arc::new(runner);
        let scheduler = AutomationScheduler::new(runner.clone(), quick_settings());

        scheduler.tick().await;
        assert!(!scheduler.status().running);

        scheduler.tick().await;
        assert_eq!(runner.process_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_run_now_conflicts_while_running() {
        let mut runner = CountingRunner::new(1);
        runner.delay = Duration::from_millis(200);
        let runner = Arc::new(runner);
        let scheduler = Arc::new(AutomationScheduler::new(runner.clone(), quick_settings()));

        let slow = {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move { scheduler.run_now().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let conflict = scheduler.run_now().await;
        assert!(conflict.is_err());

        let stats = slow.await.unwrap().unwrap();
        assert_eq!(stats.total, 1);
    }

    #[tokio::test]
    async fn test_run_now_ignores_disabled() {
        let runner = Arc::new(CountingRunner::new(1));
        let scheduler = AutomationScheduler::new(runner.clone(), quick_settings());

        scheduler.disable();
        let stats = scheduler.run_now().await.unwrap();
        assert_eq!(stats.successful, 1);
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let runner = Arc::new(CountingRunner::new(0));
        let scheduler = Arc::new(AutomationScheduler::new(runner, quick_settings()));

        assert!(!scheduler.status().scheduled);
        Arc::clone(&scheduler).start();
        assert!(scheduler.status().scheduled);

        scheduler.shutdown();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!scheduler.status().scheduled);
    }
}
