use std::time::Duration;

use crate::job::JobKind;

/// Hook points for integrating the dispatcher with an observability
/// stack.
///
/// Implement this trait for Prometheus, StatsD, OpenTelemetry, or
/// whatever you use to ship metrics in production. `job_failed` with
/// `will_retry = true` fires once per failed attempt; the terminal
/// rejection fires it with `will_retry = false`.
pub trait Metrics: Send + Sync {
    fn job_submitted(&self, kind: JobKind);
    fn job_rejected(&self, kind: JobKind);
    fn job_started(&self, kind: JobKind);
    fn job_completed(&self, kind: JobKind, duration: Duration);
    fn job_failed(&self, kind: JobKind, will_retry: bool);
    fn queue_depth(&self, kind: JobKind, depth: usize);
}

#[derive(Clone, Default)]
/// Default no-op metrics implementation, used unless a dispatcher is
/// constructed with `from_parts`. Keeps the core library free of any
/// mandatory metrics dependency.
pub struct NoopMetrics;

impl Metrics for NoopMetrics {
    fn job_submitted(&self, _kind: JobKind) {}

    fn job_rejected(&self, _kind: JobKind) {}

    fn job_started(&self, _kind: JobKind) {}

    fn job_completed(&self, _kind: JobKind, _duration: Duration) {}

    fn job_failed(&self, _kind: JobKind, _will_retry: bool) {}

    fn queue_depth(&self, _kind: JobKind, _depth: usize) {}
}
