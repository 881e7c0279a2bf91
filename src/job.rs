use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::error::{DispatchError, Result};

/// The fixed set of request categories the dispatcher routes.
///
/// Each kind owns an independent worker pool, queue and rate-limit
/// configuration; a burst on one kind never starves another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    PlanGeneration,
    CoachChat,
    FoodAnalysis,
}

impl JobKind {
    /// Every kind, in a stable order. Useful for wiring executors and
    /// iterating per-kind state.
    pub const ALL: [JobKind; 3] = [
        JobKind::PlanGeneration,
        JobKind::CoachChat,
        JobKind::FoodAnalysis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::PlanGeneration => "plan_generation",
            JobKind::CoachChat => "coach_chat",
            JobKind::FoodAnalysis => "food_analysis",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for a plan-generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    pub goal: String,
    pub days_per_week: u8,
    pub calorie_target: Option<u32>,
}

/// One turn of a coaching conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub message: String,
    pub history: Vec<String>,
}

/// A food photo queued for analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodPhoto {
    pub image_url: String,
}

/// Result of a completed plan-generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDraft {
    pub summary: String,
    pub daily_calories: u32,
}

/// The coach's reply for one chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

/// What the analyzer saw in a food photo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodReport {
    pub description: String,
    pub calories: u32,
}

/// Request payload, tagged by kind.
///
/// Each variant carries the strongly-typed input for its kind, so the
/// kind a job targets is always the kind its payload was built for;
/// there is no separate kind argument to get wrong.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPayload {
    PlanGeneration(PlanRequest),
    CoachChat(ChatTurn),
    FoodAnalysis(FoodPhoto),
}

impl JobPayload {
    pub fn kind(&self) -> JobKind {
        match self {
            JobPayload::PlanGeneration(_) => JobKind::PlanGeneration,
            JobPayload::CoachChat(_) => JobKind::CoachChat,
            JobPayload::FoodAnalysis(_) => JobKind::FoodAnalysis,
        }
    }
}

/// Successful executor output, tagged by kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutput {
    PlanGeneration(PlanDraft),
    CoachChat(ChatReply),
    FoodAnalysis(FoodReport),
}

impl JobOutput {
    pub fn kind(&self) -> JobKind {
        match self {
            JobOutput::PlanGeneration(_) => JobKind::PlanGeneration,
            JobOutput::CoachChat(_) => JobKind::CoachChat,
            JobOutput::FoodAnalysis(_) => JobKind::FoodAnalysis,
        }
    }
}

/// Internal representation of one admitted unit of work.
///
/// A job is owned by exactly one place at a time: its kind's queue, the
/// task executing it, or nobody once it has been resolved. Retries move
/// the same job (same id, same reply channel) back to the queue head,
/// so the caller is never handed two result channels for one
/// submission.
pub(crate) struct Job {
    pub id: Uuid,
    pub user_id: String,
    pub payload: JobPayload,
    pub submitted_at: DateTime<Utc>,
    pub retry_count: u32,
    pub reply: oneshot::Sender<Result<JobOutput>>,
}

impl Job {
    pub fn new(
        user_id: String,
        payload: JobPayload,
        reply: oneshot::Sender<Result<JobOutput>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            payload,
            submitted_at: Utc::now(),
            retry_count: 0,
            reply,
        }
    }

    pub fn kind(&self) -> JobKind {
        self.payload.kind()
    }

    /// Resolve the caller's ticket. A caller that dropped its ticket is
    /// not an error; the result is simply discarded.
    pub fn resolve(self, result: Result<JobOutput>) {
        let _ = self.reply.send(result);
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("kind", &self.kind())
            .field("submitted_at", &self.submitted_at)
            .field("retry_count", &self.retry_count)
            .finish()
    }
}

/// The caller's half of a submission: await `outcome` to observe the
/// job's terminal result.
pub struct Ticket {
    pub(crate) id: Uuid,
    pub(crate) kind: JobKind,
    pub(crate) rx: oneshot::Receiver<Result<JobOutput>>,
}

impl Ticket {
    pub fn job_id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    /// Wait for the job to complete or finally fail.
    ///
    /// The caller sees exactly one of: the executor's successful
    /// output, a `Failed` error once the retry budget is exhausted, or
    /// `Shutdown` if the dispatcher went away before resolving the job.
    pub async fn outcome(self) -> Result<JobOutput> {
        self.rx.await.unwrap_or(Err(DispatchError::Shutdown))
    }
}
