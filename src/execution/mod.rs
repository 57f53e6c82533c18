//! Stage-by-stage parallel execution for the ingestion pipeline.
//!
//! The engine owns a dedicated rayon pool. [`ExecutionEngine::run_stage`] runs one task per
//! still-active item concurrently and returns only once every task has finished, so a stage
//! never overlaps the next one. This module provides:
//!
//! - Scatter/gather per stage with partial-failure tolerance (a failed task only marks its item)
//! - Resource limits / throttling (in-flight tasks)
//! - Real-time metrics + observer hooks for monitoring

mod observer;
mod semaphore;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::ThreadPool;
use rayon::ThreadPoolBuilder;

use crate::error::{BurnInError, BurnInResult};

pub use observer::{
    ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver, LogExecutionObserver,
    StageSummary,
};

use semaphore::Semaphore;

/// An item that flows through pipeline stages and can be failed out of them.
pub trait StageItem: Send {
    /// `false` once an earlier stage has failed the item.
    fn is_active(&self) -> bool;

    /// Record a failure in `stage`; the item is skipped by every later stage.
    fn fail(&mut self, stage: &'static str, error: BurnInError);
}

/// Configuration for the [`ExecutionEngine`].
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Upper bound on concurrently executing tasks within a stage.
    ///
    /// This is an additional throttle on top of `num_threads`.
    pub max_in_flight: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        let n = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self {
            num_threads: Some(n),
            max_in_flight: n.max(1),
        }
    }
}

/// Runs pipeline stages over a set of items on a dedicated thread pool.
pub struct ExecutionEngine {
    pool: ThreadPool,
    opts: ExecutionOptions,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl ExecutionEngine {
    /// Create a new engine with the given options.
    ///
    /// Fails if `max_in_flight == 0`, `num_threads == Some(0)`, or the pool cannot be built.
    pub fn new(opts: ExecutionOptions) -> BurnInResult<Self> {
        if opts.max_in_flight == 0 {
            return Err(BurnInError::invalid_argument("max_in_flight must be > 0"));
        }
        if opts.num_threads == Some(0) {
            return Err(BurnInError::invalid_argument("num_threads must be > 0 when set"));
        }

        let n_threads = opts
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
            .max(1);

        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .thread_name(|i| format!("burnin-ingest-{i}"))
            .build()?;

        Ok(Self {
            pool,
            opts,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        })
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Mark the start of a multi-stage run over `items` items.
    pub fn begin_run(&self, items: usize) -> Instant {
        self.metrics.begin_run();
        self.emit(ExecutionEvent::RunStarted { items });
        Instant::now()
    }

    /// Mark the end of a run started with [`Self::begin_run`].
    pub fn finish_run(&self, started: Instant) {
        let elapsed = started.elapsed();
        self.metrics.end_run(elapsed);
        self.emit(ExecutionEvent::RunFinished {
            elapsed,
            metrics: self.metrics.snapshot(),
        });
    }

    /// Run `task` once for every active item, in parallel, and wait for all of them.
    ///
    /// A task error fails only its own item. Items already failed are skipped.
    pub fn run_stage<T, F>(&self, stage: &'static str, items: &mut [T], task: F) -> StageSummary
    where
        T: StageItem,
        F: Fn(&mut T) -> BurnInResult<()> + Send + Sync,
    {
        self.pool.install(|| self.run_stage_impl(stage, items, &task))
    }

    fn run_stage_impl<T, F>(&self, stage: &'static str, items: &mut [T], task: &F) -> StageSummary
    where
        T: StageItem,
        F: Fn(&mut T) -> BurnInResult<()> + Send + Sync,
    {
        let active = items.iter().filter(|i| i.is_active()).count();
        self.metrics.on_stage();
        self.emit(ExecutionEvent::StageStarted { stage, active });

        let sem = Semaphore::new(self.opts.max_in_flight);
        let succeeded = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);

        items.par_iter_mut().enumerate().for_each(|(index, item)| {
            if !item.is_active() {
                return;
            }
            let (_permit, waited) = sem.guard();
            if waited > Duration::ZERO {
                self.metrics.on_throttle_wait(waited);
                self.emit(ExecutionEvent::ThrottleWaited { duration: waited });
            }

            self.metrics.on_task_start();
            self.emit(ExecutionEvent::TaskStarted { stage, index });

            let ok = match task(item) {
                Ok(()) => true,
                Err(err) => {
                    log::error!("stage '{stage}' failed for item {index}: {err}");
                    item.fail(stage, err);
                    false
                }
            };
            if ok {
                succeeded.fetch_add(1, Ordering::SeqCst);
            } else {
                failed.fetch_add(1, Ordering::SeqCst);
            }

            self.emit(ExecutionEvent::TaskFinished { stage, index, ok });
            self.metrics.on_task_end(ok);
        });

        let summary = StageSummary {
            succeeded: succeeded.into_inner(),
            failed: failed.into_inner(),
            skipped: items.len() - active,
        };
        self.emit(ExecutionEvent::StageFinished { stage, summary });
        summary
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ExecutionEngine, ExecutionOptions, StageItem};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use crate::error::BurnInError;
    use crate::execution::{ExecutionEvent, ExecutionObserver};

    struct Item {
        value: usize,
        error: Option<BurnInError>,
    }

    impl StageItem for Item {
        fn is_active(&self) -> bool {
            self.error.is_none()
        }

        fn fail(&mut self, _stage: &'static str, error: BurnInError) {
            self.error = Some(error);
        }
    }

    fn items(n: usize) -> Vec<Item> {
        (0..n).map(|value| Item { value, error: None }).collect()
    }

    fn engine(threads: usize, in_flight: usize) -> ExecutionEngine {
        ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(threads),
            max_in_flight: in_flight,
        })
        .unwrap()
    }

    #[test]
    fn zero_limits_are_rejected() {
        assert!(ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(0),
            max_in_flight: 1
        })
        .is_err());
        assert!(ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(1),
            max_in_flight: 0
        })
        .is_err());
    }

    #[test]
    fn failures_are_isolated_and_skipped_later() {
        let engine = engine(4, 4);
        let mut xs = items(10);

        let s1 = engine.run_stage("odd", &mut xs, |it| {
            if it.value % 2 == 1 {
                Err(BurnInError::invalid_argument("odd"))
            } else {
                it.value *= 10;
                Ok(())
            }
        });
        assert_eq!((s1.succeeded, s1.failed, s1.skipped), (5, 5, 0));

        let calls = AtomicUsize::new(0);
        let s2 = engine.run_stage("count", &mut xs, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!((s2.succeeded, s2.failed, s2.skipped), (5, 0, 5));
        assert_eq!(xs[4].value, 40);
        assert!(xs[3].error.is_some());
    }

    #[test]
    fn stage_runs_with_concurrency() {
        let engine = engine(4, 4);
        let mut xs = items(40);
        let active = AtomicUsize::new(0);
        let max_active = AtomicUsize::new(0);

        engine.run_stage("sleep", &mut xs, |_| {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            max_active.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(2));
            active.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        });

        assert!(max_active.load(Ordering::SeqCst) > 1);
    }

    struct ConcurrencyObserver {
        active_tasks: AtomicUsize,
        max_active_tasks: AtomicUsize,
    }

    impl ConcurrencyObserver {
        fn new() -> Self {
            Self {
                active_tasks: AtomicUsize::new(0),
                max_active_tasks: AtomicUsize::new(0),
            }
        }
        fn max(&self) -> usize {
            self.max_active_tasks.load(Ordering::SeqCst)
        }
    }

    impl ExecutionObserver for ConcurrencyObserver {
        fn on_event(&self, event: &ExecutionEvent) {
            match event {
                ExecutionEvent::TaskStarted { .. } => {
                    let now = self.active_tasks.fetch_add(1, Ordering::SeqCst) + 1;
                    self.max_active_tasks.fetch_max(now, Ordering::SeqCst);
                }
                ExecutionEvent::TaskFinished { .. } => {
                    let _ = self.active_tasks.fetch_sub(1, Ordering::SeqCst);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn max_in_flight_throttles_task_concurrency() {
        let observer = Arc::new(ConcurrencyObserver::new());
        let obs_trait: Arc<dyn ExecutionObserver> = observer.clone();
        let engine = engine(4, 1).with_observer(obs_trait);
        let mut xs = items(30);

        engine.run_stage("sleep", &mut xs, |_| {
            std::thread::sleep(Duration::from_millis(1));
            Ok(())
        });

        assert_eq!(observer.max(), 1);
    }

    #[test]
    fn metrics_are_available_after_run() {
        let engine = engine(4, 1);
        let metrics = engine.metrics();
        let mut xs = items(12);

        let started = engine.begin_run(xs.len());
        engine.run_stage("a", &mut xs, |_| {
            std::thread::sleep(Duration::from_millis(2));
            Ok(())
        });
        engine.run_stage("b", &mut xs, |it| {
            if it.value < 2 {
                Err(BurnInError::invalid_argument("small"))
            } else {
                Ok(())
            }
        });
        engine.finish_run(started);

        let snap = metrics.snapshot();
        assert_eq!(snap.stages_run, 2);
        assert_eq!(snap.tasks_started, 24);
        assert_eq!(snap.tasks_finished, 24);
        assert_eq!(snap.tasks_failed, 2);
        assert_eq!(snap.max_active_tasks, 1);
        assert!(snap.throttle_wait > Duration::ZERO);
        assert!(snap.elapsed.is_some());
        assert!(snap.to_string().contains("failed 2"));
    }
}
