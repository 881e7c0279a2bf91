use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ExecutorError;
use crate::job::{JobKind, JobOutput, JobPayload};

/// Trait implemented by the opaque backends that actually perform the
/// work: the plan generator, the chat model, the photo analyzer.
///
/// The dispatcher neither knows nor cares what an executor does
/// internally; it only sees the payload go in and an output or error
/// come out. Executors are expected to carry their own timeouts, and
/// a timeout failure is retried like any other failure.
#[async_trait]
pub trait Executor: Send + Sync + 'static {
    async fn execute(&self, payload: JobPayload)
        -> std::result::Result<JobOutput, ExecutorError>;
}

pub type DynExecutor = Arc<dyn Executor>;

/// Small adapter that turns a plain async closure into an `Executor`.
/// Handy in tests and demos.
struct FnExecutor<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Executor for FnExecutor<F>
where
    F: Fn(JobPayload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<JobOutput, ExecutorError>> + Send + 'static,
{
    async fn execute(
        &self,
        payload: JobPayload,
    ) -> std::result::Result<JobOutput, ExecutorError> {
        (self.f)(payload).await
    }
}

/// The executor bindings for a dispatcher, exactly one per kind.
///
/// Bindings are supplied at construction and immutable afterwards;
/// `Dispatcher::new` refuses a registry with an unbound kind, so a
/// running dispatcher can never pop a job it has no executor for.
#[derive(Default)]
pub struct Executors {
    map: HashMap<JobKind, DynExecutor>,
}

impl Executors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `executor` to `kind`, replacing any earlier binding.
    pub fn bind<E>(mut self, kind: JobKind, executor: E) -> Self
    where
        E: Executor,
    {
        self.map.insert(kind, Arc::new(executor));
        self
    }

    /// Bind an async closure to `kind`.
    pub fn bind_fn<F, Fut>(self, kind: JobKind, f: F) -> Self
    where
        F: Fn(JobPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<JobOutput, ExecutorError>> + Send + 'static,
    {
        self.bind(kind, FnExecutor { f })
    }

    pub(crate) fn get(&self, kind: JobKind) -> Option<DynExecutor> {
        self.map.get(&kind).cloned()
    }
}
