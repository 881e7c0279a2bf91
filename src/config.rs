use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};
use crate::job::JobKind;

/// High-level configuration for a `Dispatcher`.
///
/// These types are serializable so deployments can load them from
/// files or environment-specific config management if they like. The
/// configuration is fixed at construction time; limits do not change
/// for the life of the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Per-kind pool sizes and user-facing ceilings. Every kind must
    /// appear at most once; kinds without an entry use that kind's
    /// defaults.
    pub kinds: Vec<KindConfig>,
    /// System-wide admissions allowed per rate window, across all
    /// users and kinds.
    pub system_per_minute: u32,
    /// How many times a failed job is re-attempted before it is
    /// finally rejected. 2 means up to 3 total attempts.
    pub max_retries: u32,
    /// Length of the rate window. Window counters reset to zero on
    /// this cadence regardless of job activity.
    pub window: Duration,
    /// Fallback cadence for the scheduling sweep. Dispatch is driven
    /// by submission and completion events; the sweep only guarantees
    /// forward progress if an event is missed.
    pub sweep_interval: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KindConfig {
    pub kind: JobKind,
    /// Maximum concurrent executions of this kind, system-wide.
    pub pool_size: usize,
    /// How many jobs of this kind one user may have in flight at once.
    pub per_user_concurrency: u32,
    /// How many jobs of this kind one user may submit per rate window.
    pub per_user_per_minute: u32,
}

impl KindConfig {
    /// The reference limits for a kind: small pools sized to how heavy
    /// each request is on the backing model, one in-flight job per
    /// user.
    pub fn for_kind(kind: JobKind) -> Self {
        let (pool_size, per_user_per_minute) = match kind {
            JobKind::PlanGeneration => (2, 3),
            JobKind::CoachChat => (4, 10),
            JobKind::FoodAnalysis => (3, 6),
        };
        Self {
            kind,
            pool_size,
            per_user_concurrency: 1,
            per_user_per_minute,
        }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            kinds: JobKind::ALL.iter().map(|k| KindConfig::for_kind(*k)).collect(),
            system_per_minute: 60,
            max_retries: 2,
            window: Duration::from_secs(60),
            sweep_interval: Duration::from_millis(500),
        }
    }
}

impl DispatcherConfig {
    /// Resolve the limits for one kind, falling back to the reference
    /// defaults when no entry was configured.
    pub fn limits_for(&self, kind: JobKind) -> KindConfig {
        self.kinds
            .iter()
            .find(|c| c.kind == kind)
            .cloned()
            .unwrap_or_else(|| KindConfig::for_kind(kind))
    }

    pub fn validate(&self) -> Result<()> {
        for kind in JobKind::ALL {
            if self.kinds.iter().filter(|c| c.kind == kind).count() > 1 {
                return Err(DispatchError::Config(format!(
                    "kind `{kind}` is configured more than once"
                )));
            }
        }
        for cfg in &self.kinds {
            if cfg.pool_size == 0 {
                return Err(DispatchError::Config(format!(
                    "pool size for `{}` must be greater than zero",
                    cfg.kind
                )));
            }
            if cfg.per_user_concurrency == 0 || cfg.per_user_per_minute == 0 {
                return Err(DispatchError::Config(format!(
                    "per-user limits for `{}` must be greater than zero",
                    cfg.kind
                )));
            }
        }
        if self.system_per_minute == 0 {
            return Err(DispatchError::Config(
                "system_per_minute must be greater than zero".to_string(),
            ));
        }
        if self.window.is_zero() || self.sweep_interval.is_zero() {
            return Err(DispatchError::Config(
                "window and sweep_interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
