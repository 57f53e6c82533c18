use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Outcome counts for one stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageSummary {
    /// Items the stage ran on and that succeeded.
    pub succeeded: usize,
    /// Items that failed in this stage.
    pub failed: usize,
    /// Items skipped because an earlier stage failed them.
    pub skipped: usize,
}

impl StageSummary {
    /// Items still usable after the stage.
    pub fn remaining(&self) -> usize {
        self.succeeded
    }
}

/// Execution events emitted by the engine.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted { items: usize },
    StageStarted { stage: &'static str, active: usize },
    ThrottleWaited { duration: Duration },
    TaskStarted { stage: &'static str, index: usize },
    TaskFinished { stage: &'static str, index: usize, ok: bool },
    StageFinished { stage: &'static str, summary: StageSummary },
    RunFinished {
        elapsed: Duration,
        metrics: ExecutionMetricsSnapshot,
    },
}

/// Observer hook for execution events.
pub trait ExecutionObserver: Send + Sync {
    fn on_event(&self, event: &ExecutionEvent);
}

/// Forwards execution events to the `log` facade at debug level.
#[derive(Debug, Default)]
pub struct LogExecutionObserver;

impl ExecutionObserver for LogExecutionObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        log::debug!("{event:?}");
    }
}

/// Real-time metrics for an ingestion run.
///
/// The engine updates these counters while stages execute; callers can snapshot them at any time.
pub struct ExecutionMetrics {
    run_id: AtomicU64,
    started_at: Mutex<Option<Instant>>,
    elapsed_ns: AtomicU64,

    stages_run: AtomicU64,
    tasks_started: AtomicU64,
    tasks_finished: AtomicU64,
    tasks_failed: AtomicU64,
    throttle_wait_ns: AtomicU64,

    active_tasks: AtomicUsize,
    max_active_tasks: AtomicUsize,
}

impl ExecutionMetrics {
    pub fn new() -> Self {
        Self {
            run_id: AtomicU64::new(0),
            started_at: Mutex::new(None),
            elapsed_ns: AtomicU64::new(0),
            stages_run: AtomicU64::new(0),
            tasks_started: AtomicU64::new(0),
            tasks_finished: AtomicU64::new(0),
            tasks_failed: AtomicU64::new(0),
            throttle_wait_ns: AtomicU64::new(0),
            active_tasks: AtomicUsize::new(0),
            max_active_tasks: AtomicUsize::new(0),
        }
    }

    pub fn begin_run(&self) {
        let _ = self.run_id.fetch_add(1, Ordering::SeqCst);
        *self.started_at.lock().unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());

        self.elapsed_ns.store(0, Ordering::SeqCst);
        self.stages_run.store(0, Ordering::SeqCst);
        self.tasks_started.store(0, Ordering::SeqCst);
        self.tasks_finished.store(0, Ordering::SeqCst);
        self.tasks_failed.store(0, Ordering::SeqCst);
        self.throttle_wait_ns.store(0, Ordering::SeqCst);
        self.active_tasks.store(0, Ordering::SeqCst);
        self.max_active_tasks.store(0, Ordering::SeqCst);
    }

    pub fn end_run(&self, elapsed: Duration) {
        self.elapsed_ns
            .store(elapsed.as_nanos().min(u64::MAX as u128) as u64, Ordering::SeqCst);
    }

    pub fn on_stage(&self) {
        let _ = self.stages_run.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_task_start(&self) {
        let _ = self.tasks_started.fetch_add(1, Ordering::SeqCst);
        let now = self.active_tasks.fetch_add(1, Ordering::SeqCst) + 1;
        update_max_usize(&self.max_active_tasks, now);
    }

    pub fn on_task_end(&self, ok: bool) {
        let _ = self.tasks_finished.fetch_add(1, Ordering::SeqCst);
        if !ok {
            let _ = self.tasks_failed.fetch_add(1, Ordering::SeqCst);
        }
        let _ = self.active_tasks.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn on_throttle_wait(&self, d: Duration) {
        let add = d.as_nanos().min(u64::MAX as u128) as u64;
        let _ = self.throttle_wait_ns.fetch_add(add, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ExecutionMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        let elapsed = if elapsed_ns > 0 {
            Some(Duration::from_nanos(elapsed_ns))
        } else {
            None
        };

        ExecutionMetricsSnapshot {
            run_id: self.run_id.load(Ordering::SeqCst),
            elapsed,
            stages_run: self.stages_run.load(Ordering::SeqCst),
            tasks_started: self.tasks_started.load(Ordering::SeqCst),
            tasks_finished: self.tasks_finished.load(Ordering::SeqCst),
            tasks_failed: self.tasks_failed.load(Ordering::SeqCst),
            throttle_wait: Duration::from_nanos(self.throttle_wait_ns.load(Ordering::SeqCst)),
            max_active_tasks: self.max_active_tasks.load(Ordering::SeqCst),
        }
    }
}

impl Default for ExecutionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn update_max_usize(dst: &AtomicUsize, now: usize) {
    let _ = dst.fetch_max(now, Ordering::SeqCst);
}

/// Immutable snapshot of [`ExecutionMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionMetricsSnapshot {
    pub run_id: u64,
    pub elapsed: Option<Duration>,
    pub stages_run: u64,
    pub tasks_started: u64,
    pub tasks_finished: u64,
    pub tasks_failed: u64,
    pub throttle_wait: Duration,
    pub max_active_tasks: usize,
}

impl fmt::Display for ExecutionMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={}, stages={}, tasks={}/{} (failed {}), max_active_tasks={}, throttle_wait={:?}, elapsed={:?}",
            self.run_id,
            self.stages_run,
            self.tasks_finished,
            self.tasks_started,
            self.tasks_failed,
            self.max_active_tasks,
            self.throttle_wait,
            self.elapsed
        )
    }
}
