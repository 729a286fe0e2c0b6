//! Periodic background jobs
//!
//! - verifier: probes records awaiting verification
//! - rescheduler: gives `verification-failed` records a new cycle

mod rescheduler;
mod schedule;
mod verifier;

pub use rescheduler::ReschedulerTask;
pub use schedule::JobSchedule;
pub use verifier::VerifierTask;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::services::DomainRecordService;
use crate::traits::Clock;

/// Counters of a single tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Records that became active during the tick (verifier only)
    pub activated: usize,
}

/// Body of a periodic job. Errors are handled inside; a tick never fails.
#[async_trait]
pub trait JobTask: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn run(&self) -> TickSummary;
}

struct Running {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Timer-driven runner for a [`JobTask`].
///
/// Ticks are single-flight: a tick that fires while the previous one is
/// still running is skipped.
pub struct PeriodicJob {
    task: Arc<dyn JobTask>,
    schedule: JobSchedule,
    clock: Arc<dyn Clock>,
    in_flight: Arc<Mutex<()>>,
    running: Mutex<Option<Running>>,
}

impl PeriodicJob {
    #[must_use]
    pub fn new(task: Arc<dyn JobTask>, schedule: JobSchedule, clock: Arc<dyn Clock>) -> Self {
        Self {
            task,
            schedule,
            clock,
            in_flight: Arc::new(Mutex::new(())),
            running: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.task.name()
    }

    #[must_use]
    pub fn schedule(&self) -> JobSchedule {
        self.schedule
    }

    /// Run one tick now. `None` when a tick is already in flight.
    pub async fn run_once(&self) -> Option<TickSummary> {
        Self::tick(&self.task, &self.in_flight).await
    }

    /// Spawn the timer loop. Calling `start` on a started job does nothing.
    pub async fn start(&self) {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return;
        }

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let task = Arc::clone(&self.task);
        let in_flight = Arc::clone(&self.in_flight);
        let clock = Arc::clone(&self.clock);
        let schedule = self.schedule;

        log::info!("Starting job {} ({schedule})", task.name());
        let handle = tokio::spawn(async move {
            loop {
                let delay = schedule.next_delay(clock.now());
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    () = async {
                        tokio::time::sleep(delay).await;
                        Self::tick(&task, &in_flight).await;
                    } => {}
                }
            }
            log::info!("Job {} stopped", task.name());
        });

        *running = Some(Running { shutdown, handle });
    }

    /// Stop the timer loop. A tick in flight is abandoned.
    pub async fn stop(&self) {
        let Some(Running { shutdown, handle }) = self.running.lock().await.take() else {
            return;
        };
        // the receiver is gone if the loop already exited
        let _ = shutdown.send(true);
        if let Err(e) = handle.await {
            if !e.is_cancelled() {
                log::error!("Job {} terminated abnormally: {e}", self.name());
            }
        }
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    async fn tick(task: &Arc<dyn JobTask>, in_flight: &Mutex<()>) -> Option<TickSummary> {
        let Ok(_guard) = in_flight.try_lock() else {
            log::warn!("Job {} is still running, skipping tick", task.name());
            return None;
        };

        let summary = task.run().await;
        log::info!(
            "Job {} finished: processed={} succeeded={} failed={} activated={}",
            task.name(),
            summary.processed,
            summary.succeeded,
            summary.failed,
            summary.activated
        );
        Some(summary)
    }
}

/// The verifier and rescheduler jobs, configured from the service's
/// [`VerificationConfig`](crate::config::VerificationConfig).
pub struct VerificationJobs {
    pub verifier: PeriodicJob,
    pub rescheduler: PeriodicJob,
}

impl VerificationJobs {
    #[must_use]
    pub fn new(service: Arc<DomainRecordService>) -> Self {
        let ctx = Arc::clone(service.context());
        let verifier = PeriodicJob::new(
            Arc::new(VerifierTask::new(Arc::clone(&service))),
            ctx.config.verifier_schedule,
            Arc::clone(&ctx.clock),
        );
        let rescheduler = PeriodicJob::new(
            Arc::new(ReschedulerTask::new(service)),
            ctx.config.rescheduler_schedule,
            Arc::clone(&ctx.clock),
        );
        Self {
            verifier,
            rescheduler,
        }
    }

    pub async fn start(&self) {
        self.verifier.start().await;
        self.rescheduler.start().await;
    }

    pub async fn stop(&self) {
        self.verifier.stop().await;
        self.rescheduler.stop().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::test_utils::{test_now, FixedClock};

    struct CountingTask {
        runs: AtomicUsize,
        hold: Duration,
    }

    #[async_trait]
    impl JobTask for CountingTask {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn run(&self) -> TickSummary {
            self.runs.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.hold).await;
            TickSummary {
                processed: 1,
                succeeded: 1,
                ..TickSummary::default()
            }
        }
    }

    fn counting(hold: Duration) -> Arc<CountingTask> {
        Arc::new(CountingTask {
            runs: AtomicUsize::new(0),
            hold,
        })
    }

    fn job(task: Arc<CountingTask>, every: Duration) -> PeriodicJob {
        PeriodicJob::new(
            task,
            JobSchedule::Every(every),
            Arc::new(FixedClock::new(test_now())),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_tick_is_skipped() {
        let task = counting(Duration::from_secs(10));
        let job = Arc::new(job(task.clone(), Duration::from_secs(60)));

        let first = {
            let job = Arc::clone(&job);
            tokio::spawn(async move { job.run_once().await })
        };
        tokio::task::yield_now().await;

        assert!(job.run_once().await.is_none());
        assert_eq!(first.await.unwrap().unwrap().processed, 1);
        assert_eq!(task.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_on_schedule_until_stopped() {
        let task = counting(Duration::ZERO);
        let job = job(task.clone(), Duration::from_secs(60));

        job.start().await;
        job.start().await;
        assert!(job.is_running().await);

        tokio::time::sleep(Duration::from_secs(185)).await;
        assert_eq!(task.runs.load(Ordering::SeqCst), 3);

        job.stop().await;
        assert!(!job.is_running().await);
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(task.runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_abandons_tick_in_flight() {
        let task = counting(Duration::from_secs(3600));
        let job = job(task.clone(), Duration::from_secs(1));

        job.start().await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(task.runs.load(Ordering::SeqCst), 1);

        job.stop().await;
        // guard released, a manual tick can run
        assert!(job.run_once().await.is_some());
    }

    #[tokio::test]
    async fn stop_without_start_is_noop() {
        let job = job(counting(Duration::ZERO), Duration::from_secs(1));
        job.stop().await;
        assert!(!job.is_running().await);
    }
}
