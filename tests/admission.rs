use std::time::Duration;

use usher::{
    ChatReply, ChatTurn, DispatchError, Dispatcher, DispatcherConfig, Executors, FoodPhoto,
    FoodReport, JobKind, JobOutput, JobPayload, KindConfig, PlanDraft,
};

fn config(per_user_concurrency: u32, per_user_per_minute: u32, system: u32) -> DispatcherConfig {
    DispatcherConfig {
        kinds: JobKind::ALL
            .iter()
            .map(|k| KindConfig {
                kind: *k,
                pool_size: 4,
                per_user_concurrency,
                per_user_per_minute,
            })
            .collect(),
        system_per_minute: system,
        max_retries: 2,
        window: Duration::from_secs(60),
        sweep_interval: Duration::from_millis(50),
    }
}

fn instant_executors() -> Executors {
    Executors::new()
        .bind_fn(JobKind::PlanGeneration, |_payload| async {
            Ok(JobOutput::PlanGeneration(PlanDraft {
                summary: "three day split".into(),
                daily_calories: 2200,
            }))
        })
        .bind_fn(JobKind::CoachChat, |_payload| async {
            Ok(JobOutput::CoachChat(ChatReply {
                reply: "keep it up".into(),
            }))
        })
        .bind_fn(JobKind::FoodAnalysis, |_payload| async {
            Ok(JobOutput::FoodAnalysis(FoodReport {
                description: "oatmeal".into(),
                calories: 350,
            }))
        })
}

fn chat(message: &str) -> JobPayload {
    JobPayload::CoachChat(ChatTurn {
        message: message.to_string(),
        history: vec![],
    })
}

#[tokio::test]
async fn second_submit_from_same_user_rejects_synchronously() {
    let dispatcher = Dispatcher::new(config(1, 10, 100), instant_executors()).expect("dispatcher");

    let first = dispatcher
        .submit("alice", chat("first"))
        .await
        .expect("first admitted");

    // The first job is still admitted (queued or executing), so the
    // same user's second submission must reject before it completes.
    let second = dispatcher.submit("alice", chat("second")).await;
    match second {
        Err(DispatchError::RateLimited { kind }) => assert_eq!(kind, JobKind::CoachChat),
        Err(other) => panic!("expected RateLimited, got {other}"),
        Ok(_) => panic!("expected RateLimited, got an admitted ticket"),
    }

    // A different user is unaffected.
    let bob = dispatcher.submit("bob", chat("hello")).await;
    assert!(bob.is_ok());

    // Once the first job terminates, the in-flight unit is released
    // and the same user may submit again.
    first.outcome().await.expect("first completes");
    let third = dispatcher.submit("alice", chat("third")).await;
    assert!(third.is_ok());
}

#[tokio::test(start_paused = true)]
async fn per_user_window_ceiling_resets_after_a_minute() {
    let dispatcher = Dispatcher::new(config(10, 2, 100), instant_executors()).expect("dispatcher");

    for n in 0..2 {
        let ticket = dispatcher
            .submit("alice", chat(&format!("msg {n}")))
            .await
            .expect("within window ceiling");
        ticket.outcome().await.expect("completes");
    }

    // In-flight count is back to zero, so only the window ceiling can
    // be the reason for a denial now.
    let denied = dispatcher.submit("alice", chat("one too many")).await;
    assert!(matches!(denied, Err(DispatchError::RateLimited { .. })));

    // Let the 60-second window timer fire.
    tokio::time::advance(Duration::from_secs(61)).await;
    tokio::time::sleep(Duration::from_millis(1)).await;

    let admitted = dispatcher.submit("alice", chat("fresh window")).await;
    assert!(admitted.is_ok());
}

#[tokio::test(start_paused = true)]
async fn global_ceiling_rejects_with_system_busy() {
    let dispatcher = Dispatcher::new(config(10, 10, 3), instant_executors()).expect("dispatcher");

    for n in 0..3 {
        let ticket = dispatcher
            .submit(format!("user-{n}"), chat("hi"))
            .await
            .expect("within global ceiling");
        ticket.outcome().await.expect("completes");
    }

    // The fourth admission in the window trips the system-wide
    // ceiling, even for a user and kind with headroom of their own.
    let denied = dispatcher
        .submit(
            "user-99",
            JobPayload::FoodAnalysis(FoodPhoto {
                image_url: "https://example.com/p.jpg".into(),
            }),
        )
        .await;
    assert!(matches!(denied, Err(DispatchError::SystemBusy)));

    tokio::time::advance(Duration::from_secs(61)).await;
    tokio::time::sleep(Duration::from_millis(1)).await;

    let admitted = dispatcher.submit("user-99", chat("next window")).await;
    assert!(admitted.is_ok());
}
