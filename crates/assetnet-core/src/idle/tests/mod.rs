use std::collections::HashMap;
use std::time::Duration;

use super::*;
use crate::types::ResourceType;

fn record(request_id: &str, url: &str) -> RequestRecord {
    RequestRecord {
        url: url.to_string(),
        method: "GET".to_string(),
        headers: HashMap::new(),
        resource_type: ResourceType::Document,
        request_id: request_id.to_string(),
        intercept_id: Some(format!("i-{request_id}")),
        frame_id: None,
        redirect_chain: vec![],
        response: None,
    }
}

#[tokio::test]
async fn resolves_immediately_when_already_empty() {
    let registry = RequestRegistry::new();
    let started = tokio::time::Instant::now();

    wait_for_idle_with_ceiling(&registry, |_| true, Duration::from_millis(20), Duration::from_secs(5))
        .await
        .expect("empty registry should go idle");

    assert!(started.elapsed() < Duration::from_millis(500));
}

#[tokio::test]
async fn quiet_window_resets_when_a_new_request_arrives() {
    let registry = RequestRegistry::new();
    registry.insert_record(record("1", "https://ex.com/a"));

    let registry = std::sync::Arc::new(registry);
    let waiter_registry = registry.clone();
    let waiter = tokio::spawn(async move {
        wait_for_idle_with_ceiling(
            &waiter_registry,
            |_| true,
            Duration::from_millis(60),
            Duration::from_secs(5),
        )
        .await
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    registry.forget("1", false);

    let result = waiter.await.expect("waiter task panicked");
    assert!(result.is_ok());
}

#[tokio::test]
async fn hard_ceiling_expiry_reports_active_urls() {
    let registry = RequestRegistry::new();
    registry.insert_record(record("1", "https://ex.com/a.js"));

    let err = wait_for_idle_with_ceiling(
        &registry,
        |_| true,
        Duration::from_millis(500),
        Duration::from_millis(40),
    )
    .await
    .expect_err("non-empty in-flight set never reaches quiet window before the ceiling");

    match err {
        NetworkError::IdleTimeout { active } => {
            assert_eq!(active, vec!["https://ex.com/a.js".to_string()]);
        }
        other => panic!("expected IdleTimeout, got {other:?}"),
    }
}

#[tokio::test]
async fn idle_is_idempotent_across_repeated_calls() {
    let registry = RequestRegistry::new();

    for _ in 0..2 {
        wait_for_idle_with_ceiling(&registry, |_| true, Duration::from_millis(20), Duration::from_secs(5))
            .await
            .expect("idle should resolve the same way each time with no new events in between");
    }
}

#[tokio::test]
async fn filter_ignores_non_matching_in_flight_requests() {
    let registry = RequestRegistry::new();
    registry.insert_record(record("1", "https://other.example.com/a"));

    wait_for_idle_with_ceiling(
        &registry,
        |r| r.url.starts_with("https://ex.com"),
        Duration::from_millis(20),
        Duration::from_secs(5),
    )
    .await
    .expect("filter excludes the only in-flight request, so idle resolves");
}
