use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::config::KindConfig;
use crate::job::JobKind;

/// Outcome of an admission check.
///
/// `DeniedUser` covers both the per-user concurrency cap and the
/// per-user window ceiling; `DeniedGlobal` means the system-wide
/// window ceiling was hit. Neither denial mutates any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    Granted,
    DeniedUser,
    DeniedGlobal,
}

#[derive(Default)]
struct UserRate {
    in_flight: u32,
    window_count: u32,
}

#[derive(Default)]
struct LimiterState {
    users: HashMap<(String, JobKind), UserRate>,
    global_window: u32,
}

/// Tracks per-user in-flight and per-minute counts plus the global
/// per-minute count, and answers admission checks atomically.
///
/// The check-and-increment in `try_admit` happens under one lock, so
/// two concurrent submissions can never both pass when a single unit
/// of capacity remains. The limiter itself never errors; exhaustion is
/// only ever communicated through the `Admission` decision.
pub(crate) struct RateLimiter {
    state: Mutex<LimiterState>,
    system_per_minute: u32,
}

impl RateLimiter {
    pub fn new(system_per_minute: u32) -> Self {
        Self {
            state: Mutex::new(LimiterState::default()),
            system_per_minute,
        }
    }

    /// Admit a submission if the user's in-flight count, the user's
    /// window count and the global window count are all below their
    /// ceilings, incrementing all three. Denials leave every counter
    /// untouched.
    pub async fn try_admit(&self, user_id: &str, limits: &KindConfig) -> Admission {
        let mut state = self.state.lock().await;

        if state.global_window >= self.system_per_minute {
            return Admission::DeniedGlobal;
        }

        let key = (user_id.to_string(), limits.kind);
        let user = state.users.entry(key).or_default();
        if user.in_flight >= limits.per_user_concurrency
            || user.window_count >= limits.per_user_per_minute
        {
            return Admission::DeniedUser;
        }

        user.in_flight += 1;
        user.window_count += 1;
        state.global_window += 1;
        Admission::Granted
    }

    /// Drop one unit of in-flight work for `(user_id, kind)`.
    ///
    /// Called once per admitted job when it reaches a terminal state,
    /// never between retries. A release with nothing in flight
    /// indicates a bookkeeping bug upstream; the counter clamps at
    /// zero rather than taking down unrelated jobs.
    pub async fn release(&self, user_id: &str, kind: JobKind) {
        let mut state = self.state.lock().await;
        match state.users.get_mut(&(user_id.to_string(), kind)) {
            Some(user) if user.in_flight > 0 => user.in_flight -= 1,
            _ => {
                tracing::warn!(user_id, kind = %kind, "in-flight release with nothing in flight");
            }
        }
    }

    /// Zero every window counter. Runs on the window timer regardless
    /// of job activity. Entries that are fully idle are dropped so the
    /// map stays bounded by the set of recently active users.
    pub async fn reset_windows(&self) {
        let mut state = self.state.lock().await;
        state.global_window = 0;
        state.users.retain(|_, user| {
            user.window_count = 0;
            user.in_flight > 0
        });
    }
}
