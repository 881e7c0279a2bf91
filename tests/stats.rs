use std::time::Duration;

use usher::{
    ChatReply, ChatTurn, Dispatcher, DispatcherConfig, Executors, FoodPhoto, JobKind, JobOutput,
    JobPayload, KindConfig, PlanDraft,
};

fn config() -> DispatcherConfig {
    DispatcherConfig {
        kinds: JobKind::ALL
            .iter()
            .map(|k| KindConfig {
                kind: *k,
                pool_size: 3,
                per_user_concurrency: 1,
                per_user_per_minute: 30,
            })
            .collect(),
        system_per_minute: 1000,
        max_retries: 2,
        window: Duration::from_secs(60),
        sweep_interval: Duration::from_millis(50),
    }
}

fn executors() -> Executors {
    Executors::new()
        .bind_fn(JobKind::PlanGeneration, |_payload| async {
            Ok(JobOutput::PlanGeneration(PlanDraft {
                summary: "full body".into(),
                daily_calories: 2000,
            }))
        })
        .bind_fn(JobKind::CoachChat, |_payload| async {
            Ok(JobOutput::CoachChat(ChatReply {
                reply: "nice work".into(),
            }))
        })
        .bind_fn(JobKind::FoodAnalysis, |_payload| async {
            Err("blurry photo".into())
        })
}

#[tokio::test]
async fn fresh_dispatcher_reports_idle_pools() {
    let dispatcher = Dispatcher::new(config(), executors()).expect("dispatcher");

    let stats = dispatcher.stats().await;
    for kind in JobKind::ALL {
        let s = stats.get(kind).expect("kind present");
        assert_eq!(s.pool_size, 3);
        assert_eq!(s.busy_workers, 0);
        assert_eq!(s.free_workers, 3);
        assert_eq!(s.queued, 0);
        assert_eq!(s.submitted, 0);
        assert_eq!(s.completed, 0);
        assert_eq!(s.failed, 0);
    }
}

#[tokio::test]
async fn counters_accumulate_per_kind_across_outcomes() {
    let dispatcher = Dispatcher::new(config(), executors()).expect("dispatcher");
    let reporter = dispatcher.reporter();

    for user in ["alice", "bob"] {
        let ticket = dispatcher
            .submit(
                user,
                JobPayload::CoachChat(ChatTurn {
                    message: "hello".into(),
                    history: vec![],
                }),
            )
            .await
            .expect("admitted");
        ticket.outcome().await.expect("completes");
    }

    // The food executor always fails, so this submission burns its
    // whole retry budget and lands in the failed counter.
    let doomed = dispatcher
        .submit(
            "carol",
            JobPayload::FoodAnalysis(FoodPhoto {
                image_url: "https://example.com/blur.jpg".into(),
            }),
        )
        .await
        .expect("admitted");
    assert!(doomed.outcome().await.is_err());

    let chat = reporter.kind_stats(JobKind::CoachChat).await;
    assert_eq!(chat.submitted, 2);
    assert_eq!(chat.completed, 2);
    assert_eq!(chat.failed, 0);

    let food = reporter.kind_stats(JobKind::FoodAnalysis).await;
    assert_eq!(food.submitted, 1);
    assert_eq!(food.completed, 0);
    assert_eq!(food.failed, 1);

    // Untouched kind stays at zero.
    let plan = reporter.kind_stats(JobKind::PlanGeneration).await;
    assert_eq!(plan.submitted, 0);

    // The snapshot agrees with the per-kind reads.
    let snapshot = reporter.snapshot().await;
    assert_eq!(snapshot.get(JobKind::CoachChat).expect("kind present").completed, 2);
}
