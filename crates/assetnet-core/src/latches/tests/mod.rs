use std::sync::Arc;
use std::time::Duration;

use super::*;

#[tokio::test]
async fn resolves_before_await_returns_immediately() {
    let latches = RequestLatches::new();
    latches.resolve_request_will_be_sent("r1");

    tokio::time::timeout(
        Duration::from_millis(50),
        latches.wait_request_will_be_sent("r1"),
    )
    .await
    .expect("latch already fired, wait should not block");
}

#[tokio::test]
async fn resolves_after_await_unblocks_waiter() {
    let latches = Arc::new(RequestLatches::new());
    let waiter_latches = latches.clone();

    let waiter = tokio::spawn(async move {
        waiter_latches.wait_request_will_be_sent("r1").await;
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    latches.resolve_request_will_be_sent("r1");

    tokio::time::timeout(Duration::from_millis(200), waiter)
        .await
        .expect("waiter task timed out")
        .expect("waiter task panicked");
}

#[tokio::test]
async fn resolving_is_idempotent() {
    let latches = RequestLatches::new();
    latches.resolve_request_will_be_sent("r1");
    latches.resolve_request_will_be_sent("r1");

    tokio::time::timeout(
        Duration::from_millis(50),
        latches.wait_request_will_be_sent("r1"),
    )
    .await
    .expect("double resolve should still be observable");
}

#[tokio::test]
async fn the_two_latches_are_independent() {
    let latches = RequestLatches::new();
    latches.resolve_request_will_be_sent("r1");

    let result = tokio::time::timeout(
        Duration::from_millis(30),
        latches.wait_response_received("r1"),
    )
    .await;
    assert!(
        result.is_err(),
        "responseReceived must not resolve just because requestWillBeSent did"
    );
}
