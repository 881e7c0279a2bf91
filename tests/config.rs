use std::time::Duration;

use usher::{DispatchError, DispatcherConfig, JobKind, KindConfig};

#[test]
fn default_config_is_valid_and_carries_reference_limits() {
    let config = DispatcherConfig::default();
    assert!(config.validate().is_ok());

    assert_eq!(config.max_retries, 2);
    assert_eq!(config.window, Duration::from_secs(60));

    for kind in JobKind::ALL {
        let limits = config.limits_for(kind);
        assert_eq!(limits.per_user_concurrency, 1);
        assert!(limits.pool_size > 0);
        assert!(limits.per_user_per_minute > 0);
    }
}

#[test]
fn unconfigured_kind_falls_back_to_its_defaults() {
    let config = DispatcherConfig {
        kinds: vec![KindConfig {
            kind: JobKind::CoachChat,
            pool_size: 8,
            per_user_concurrency: 2,
            per_user_per_minute: 20,
        }],
        ..DispatcherConfig::default()
    };
    assert!(config.validate().is_ok());

    assert_eq!(config.limits_for(JobKind::CoachChat).pool_size, 8);

    let plan = config.limits_for(JobKind::PlanGeneration);
    assert_eq!(plan.pool_size, KindConfig::for_kind(JobKind::PlanGeneration).pool_size);
    assert_eq!(plan.per_user_concurrency, 1);
}

#[test]
fn duplicate_kind_entries_are_rejected() {
    let mut config = DispatcherConfig::default();
    config.kinds.push(KindConfig::for_kind(JobKind::CoachChat));

    assert!(matches!(config.validate(), Err(DispatchError::Config(_))));
}

#[test]
fn zero_sized_limits_are_rejected() {
    let mut config = DispatcherConfig::default();
    config.kinds[0].pool_size = 0;
    assert!(matches!(config.validate(), Err(DispatchError::Config(_))));

    let mut config = DispatcherConfig::default();
    config.kinds[0].per_user_per_minute = 0;
    assert!(matches!(config.validate(), Err(DispatchError::Config(_))));

    let mut config = DispatcherConfig::default();
    config.system_per_minute = 0;
    assert!(matches!(config.validate(), Err(DispatchError::Config(_))));

    let mut config = DispatcherConfig::default();
    config.window = Duration::ZERO;
    assert!(matches!(config.validate(), Err(DispatchError::Config(_))));
}
