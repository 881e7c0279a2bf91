//! Usher: rate-limited async dispatch for Rust.
//!
//! This crate routes latency-heavy asynchronous requests (AI plan
//! generation, coaching chat turns, food-photo analysis) to bounded
//! per-kind worker pools. The public API is intentionally small: you
//! bind one executor per job kind, submit payloads through a
//! `Dispatcher`, and await the returned `Ticket`. The dispatcher
//! enforces per-user and system-wide rate limits at submission time,
//! retries failed attempts ahead of newer work, and exposes a live
//! utilization snapshot for monitoring.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod job;
pub mod metrics;
pub mod stats;

mod limiter;
mod pool;
mod queue;

pub use crate::config::{DispatcherConfig, KindConfig};
pub use crate::dispatcher::Dispatcher;
pub use crate::error::{DispatchError, ExecutorError, Result};
pub use crate::executor::{Executor, Executors};
pub use crate::job::{
    ChatReply, ChatTurn, FoodPhoto, FoodReport, JobKind, JobOutput, JobPayload, PlanDraft,
    PlanRequest, Ticket,
};
pub use crate::metrics::{Metrics, NoopMetrics};
pub use crate::stats::{KindStats, Stats, StatsReporter};
