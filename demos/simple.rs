//! Small end-to-end example that wires a `Dispatcher` with stub
//! executors and pushes a few requests through it. Run with:
//!
//! ```bash
//! cargo run --example simple
//! ```
//!
//! You should see each job's outcome followed by a stats snapshot.

use std::time::Duration;

use usher::{
    ChatReply, ChatTurn, DispatcherConfig, Dispatcher, Executors, FoodPhoto, FoodReport, JobKind,
    JobOutput, JobPayload, PlanDraft, PlanRequest,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Stub executors standing in for the real AI backends. In a real
    // deployment each of these would call out to a model endpoint.
    let executors = Executors::new()
        .bind_fn(JobKind::PlanGeneration, |payload| async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            let JobPayload::PlanGeneration(req) = payload else {
                return Err("unexpected payload".into());
            };
            Ok(JobOutput::PlanGeneration(PlanDraft {
                summary: format!("{}-day split for goal: {}", req.days_per_week, req.goal),
                daily_calories: req.calorie_target.unwrap_or(2200),
            }))
        })
        .bind_fn(JobKind::CoachChat, |payload| async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let JobPayload::CoachChat(turn) = payload else {
                return Err("unexpected payload".into());
            };
            Ok(JobOutput::CoachChat(ChatReply {
                reply: format!("Good question about \"{}\"!", turn.message),
            }))
        })
        .bind_fn(JobKind::FoodAnalysis, |payload| async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            let JobPayload::FoodAnalysis(photo) = payload else {
                return Err("unexpected payload".into());
            };
            Ok(JobOutput::FoodAnalysis(FoodReport {
                description: format!("grilled chicken bowl ({})", photo.image_url),
                calories: 640,
            }))
        });

    let dispatcher = Dispatcher::new(DispatcherConfig::default(), executors)?;

    let plan = dispatcher
        .submit(
            "user-1",
            JobPayload::PlanGeneration(PlanRequest {
                goal: "build muscle".into(),
                days_per_week: 3,
                calorie_target: Some(2600),
            }),
        )
        .await?;

    let chat = dispatcher
        .submit(
            "user-2",
            JobPayload::CoachChat(ChatTurn {
                message: "how much protein per day?".into(),
                history: vec![],
            }),
        )
        .await?;

    let photo = dispatcher
        .submit(
            "user-3",
            JobPayload::FoodAnalysis(FoodPhoto {
                image_url: "https://example.com/lunch.jpg".into(),
            }),
        )
        .await?;

    for ticket in [plan, chat, photo] {
        let kind = ticket.kind();
        match ticket.outcome().await {
            Ok(output) => println!("{kind}: {output:?}"),
            Err(err) => println!("{kind} failed: {err}"),
        }
    }

    let stats = dispatcher.stats().await;
    for kind in JobKind::ALL {
        if let Some(s) = stats.get(kind) {
            println!(
                "{kind}: {}/{} workers busy, {} queued, {} completed, {} failed",
                s.busy_workers, s.pool_size, s.queued, s.completed, s.failed
            );
        }
    }

    dispatcher.request_shutdown();
    Ok(())
}
