use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{oneshot, Mutex};

use crate::config::{DispatcherConfig, KindConfig};
use crate::error::{DispatchError, Result};
use crate::executor::{DynExecutor, Executors};
use crate::job::{Job, JobKind, JobPayload, Ticket};
use crate::limiter::{Admission, RateLimiter};
use crate::metrics::{Metrics, NoopMetrics};
use crate::pool::WorkerPool;
use crate::queue::JobQueue;
use crate::stats::{Counters, KindStats, Stats, StatsReporter};

/// A kind's pool and queue, guarded together: every scheduling
/// decision for a kind reads and writes both, so one lock covers the
/// pair.
struct KindState {
    pool: WorkerPool,
    queue: JobQueue,
}

/// Everything the dispatcher holds for one kind.
struct KindRuntime {
    limits: KindConfig,
    executor: DynExecutor,
    state: Mutex<KindState>,
    counters: Counters,
}

pub(crate) struct Inner {
    max_retries: u32,
    // Indexed by `JobKind as usize`, one entry per kind.
    kinds: Vec<KindRuntime>,
    limiter: RateLimiter,
    metrics: Arc<dyn Metrics>,
    shutdown: AtomicBool,
}

/// The orchestrating component: admits submissions against the rate
/// limits, queues them per kind, and feeds free worker slots from the
/// queue heads, retrying failed attempts up to the configured budget.
///
/// A `Dispatcher` is a cheap-to-clone handle; construct one at your
/// composition root and hand clones to whatever submits work. All
/// limits are fixed at construction.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    /// Construct a dispatcher with no-op metrics.
    ///
    /// Must be called from within a Tokio runtime: the scheduling
    /// sweep and rate-window timers are spawned here.
    pub fn new(config: DispatcherConfig, executors: Executors) -> Result<Self> {
        Self::from_parts(config, executors, Arc::new(NoopMetrics))
    }

    /// Lower-level constructor that lets you provide a metrics
    /// implementation. Useful for tests or when wiring the dispatcher
    /// into an existing observability stack.
    pub fn from_parts(
        config: DispatcherConfig,
        executors: Executors,
        metrics: Arc<dyn Metrics>,
    ) -> Result<Self> {
        config.validate()?;

        let mut kinds = Vec::with_capacity(JobKind::ALL.len());
        for kind in JobKind::ALL {
            let limits = config.limits_for(kind);
            let executor = executors
                .get(kind)
                .ok_or(DispatchError::MissingExecutor(kind))?;
            kinds.push(KindRuntime {
                state: Mutex::new(KindState {
                    pool: WorkerPool::new(limits.pool_size),
                    queue: JobQueue::new(),
                }),
                counters: Counters::default(),
                limits,
                executor,
            });
        }

        let inner = Arc::new(Inner {
            max_retries: config.max_retries,
            kinds,
            limiter: RateLimiter::new(config.system_per_minute),
            metrics,
            shutdown: AtomicBool::new(false),
        });
        spawn_timers(&inner, &config);
        Ok(Self { inner })
    }

    /// Submit a job on behalf of `user_id`.
    ///
    /// Admission is resolved before this returns: a user over their
    /// concurrency cap or per-minute ceiling gets `RateLimited`, and a
    /// full system-wide window gets `SystemBusy`, both without queuing
    /// anything. An admitted job is appended to its kind's queue and
    /// the returned `Ticket` settles when it completes or is finally
    /// rejected.
    pub async fn submit(
        &self,
        user_id: impl Into<String>,
        payload: JobPayload,
    ) -> Result<Ticket> {
        let user_id = user_id.into();
        let kind = payload.kind();
        let rt = self.inner.runtime(kind);

        match self.inner.limiter.try_admit(&user_id, &rt.limits).await {
            Admission::Granted => {}
            Admission::DeniedUser => {
                self.inner.metrics.job_rejected(kind);
                return Err(DispatchError::RateLimited { kind });
            }
            Admission::DeniedGlobal => {
                self.inner.metrics.job_rejected(kind);
                return Err(DispatchError::SystemBusy);
            }
        }

        let (tx, rx) = oneshot::channel();
        let job = Job::new(user_id, payload, tx);
        let id = job.id;
        tracing::debug!(job_id = %id, kind = %kind, "job admitted");

        {
            let mut state = rt.state.lock().await;
            state.queue.push_back(job);
            self.inner.metrics.queue_depth(kind, state.queue.len());
        }
        rt.counters.submitted.fetch_add(1, Ordering::Relaxed);
        self.inner.metrics.job_submitted(kind);

        self.inner.schedule(kind).await;

        Ok(Ticket { id, kind, rx })
    }

    /// Read-only utilization snapshot across all kinds.
    pub async fn stats(&self) -> Stats {
        self.inner.stats().await
    }

    /// A clonable monitoring handle, for polling by a display surface.
    pub fn reporter(&self) -> StatsReporter {
        StatsReporter {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Request that the background timers stop.
    ///
    /// This method is cooperative: in-flight executors run to
    /// completion and already-queued work keeps draining through the
    /// event-driven scheduling path; only the fallback sweep and the
    /// window reset stop.
    pub fn request_shutdown(&self) {
        self.inner.shutdown.store(true, Ordering::SeqCst);
    }
}

impl Inner {
    fn runtime(&self, kind: JobKind) -> &KindRuntime {
        &self.kinds[kind as usize]
    }

    /// Scheduling pass for one kind: start queued jobs on free slots
    /// until either runs out. Idempotent, and safe to invoke
    /// redundantly from any trigger.
    fn schedule<'a>(
        self: &'a Arc<Self>,
        kind: JobKind,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        let this = Arc::clone(self);
        Box::pin(async move {
            let rt = this.runtime(kind);
            let mut state = rt.state.lock().await;
            loop {
                let Some(slot) = state.pool.find_free() else { break };
                let Some(job) = state.queue.pop_front() else { break };
                state.pool.acquire(slot, job.id);
                this.metrics.queue_depth(kind, state.queue.len());
                let inner = Arc::clone(&this);
                tokio::spawn(async move {
                    inner.run_job(kind, slot, job).await;
                });
            }
        })
    }

    /// One execution attempt on an acquired slot, plus the bookkeeping
    /// for its outcome. No lock is held while the executor runs.
    async fn run_job(self: Arc<Self>, kind: JobKind, slot: usize, mut job: Job) {
        let rt = self.runtime(kind);
        self.metrics.job_started(kind);
        tracing::debug!(
            job_id = %job.id,
            kind = %kind,
            slot,
            attempt = job.retry_count + 1,
            "executing"
        );
        let started = Instant::now();
        let result = rt.executor.execute(job.payload.clone()).await;

        match result {
            Ok(output) => {
                debug_assert_eq!(output.kind(), kind, "executor returned wrong output kind");
                rt.counters.completed.fetch_add(1, Ordering::Relaxed);
                self.metrics.job_completed(kind, started.elapsed());
                let user_id = job.user_id.clone();
                job.resolve(Ok(output));
                self.finish_cycle(kind, slot, &user_id).await;
            }
            Err(err) if job.retry_count < self.max_retries => {
                job.retry_count += 1;
                tracing::debug!(
                    job_id = %job.id,
                    kind = %kind,
                    retry = job.retry_count,
                    error = %err,
                    "attempt failed, re-queuing at head"
                );
                self.metrics.job_failed(kind, true);
                // The retried job keeps its rate-limiter admission: a
                // retry is a continuation of the same admitted unit of
                // work, so nothing from the same user can slip in
                // between attempts.
                {
                    let mut state = rt.state.lock().await;
                    state.queue.push_front(job);
                    state.pool.release(slot);
                    self.metrics.queue_depth(kind, state.queue.len());
                }
                self.schedule(kind).await;
            }
            Err(err) => {
                let attempts = job.retry_count + 1;
                tracing::debug!(
                    job_id = %job.id,
                    kind = %kind,
                    attempts,
                    error = %err,
                    "retry budget exhausted"
                );
                self.metrics.job_failed(kind, false);
                rt.counters.failed.fetch_add(1, Ordering::Relaxed);
                let user_id = job.user_id.clone();
                job.resolve(Err(DispatchError::Failed {
                    attempts,
                    source: err,
                }));
                self.finish_cycle(kind, slot, &user_id).await;
            }
        }
    }

    /// End of a terminal attempt cycle: free the slot, give back the
    /// rate-limiter admission, and look for more work for the freed
    /// slot.
    async fn finish_cycle(self: &Arc<Self>, kind: JobKind, slot: usize, user_id: &str) {
        {
            let mut state = self.runtime(kind).state.lock().await;
            state.pool.release(slot);
        }
        self.limiter.release(user_id, kind).await;
        self.schedule(kind).await;
    }

    pub(crate) async fn kind_stats(&self, kind: JobKind) -> KindStats {
        let rt = self.runtime(kind);
        let (pool_size, busy, queued) = {
            let state = rt.state.lock().await;
            (state.pool.size(), state.pool.busy(), state.queue.len())
        };
        KindStats {
            pool_size,
            busy_workers: busy,
            free_workers: pool_size - busy,
            queued,
            submitted: rt.counters.submitted.load(Ordering::Relaxed),
            completed: rt.counters.completed.load(Ordering::Relaxed),
            failed: rt.counters.failed.load(Ordering::Relaxed),
        }
    }

    pub(crate) async fn stats(&self) -> Stats {
        let mut kinds = std::collections::HashMap::new();
        for kind in JobKind::ALL {
            kinds.insert(kind, self.kind_stats(kind).await);
        }
        Stats { kinds }
    }
}

/// The two autonomous background activities: the fallback scheduling
/// sweep and the rate-window reset. Both hold only a weak reference,
/// so an abandoned dispatcher is not kept alive by its own timers.
fn spawn_timers(inner: &Arc<Inner>, config: &DispatcherConfig) {
    let weak = Arc::downgrade(inner);
    let sweep = config.sweep_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep);
        ticker.tick().await; // the first tick completes immediately
        loop {
            ticker.tick().await;
            let Some(inner) = weak.upgrade() else { break };
            if inner.shutdown.load(Ordering::SeqCst) {
                break;
            }
            for kind in JobKind::ALL {
                inner.schedule(kind).await;
            }
        }
    });

    let weak = Arc::downgrade(inner);
    let window = config.window;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(window);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(inner) = weak.upgrade() else { break };
            if inner.shutdown.load(Ordering::SeqCst) {
                break;
            }
            inner.limiter.reset_windows().await;
        }
    });
}
