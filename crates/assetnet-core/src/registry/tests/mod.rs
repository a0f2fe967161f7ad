use std::collections::HashMap;

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

#[test]
fn insert_then_get_round_trips() {
    let registry = RequestRegistry::new();
    registry.insert_record(record("1", "https://ex.com/"));
    let got = registry.get_record("1").expect("record should exist");
    assert_eq!(got.url, "https://ex.com/");
}

#[test]
fn at_most_one_record_per_request_id() {
    let registry = RequestRegistry::new();
    registry.insert_record(record("1", "https://ex.com/a"));
    let prior = registry.insert_record(record("1", "https://ex.com/b"));
    assert_eq!(prior.unwrap().url, "https://ex.com/a");
    assert_eq!(registry.len(), 1);
}

#[test]
fn forget_removes_record_and_authentication() {
    let registry = RequestRegistry::new();
    registry.insert_record(record("1", "https://ex.com/"));
    registry.mark_authenticated("i-1");

    let removed = registry.forget("1", false);
    assert!(removed.is_some());
    assert!(registry.get_record("1").is_none());
    assert!(!registry.is_authenticated("i-1"));
}

#[test]
fn forget_is_idempotent() {
    let registry = RequestRegistry::new();
    registry.insert_record(record("1", "https://ex.com/"));
    assert!(registry.forget("1", false).is_some());
    assert!(registry.forget("1", false).is_none());
}

#[test]
fn forget_without_keep_pending_clears_pending_entry() {
    let registry = RequestRegistry::new();
    registry.insert_pending(
        "1",
        PendingRequest {
            url: "https://ex.com/".to_string(),
            method: "GET".to_string(),
            headers: HashMap::new(),
            frame_id: None,
        },
    );
    registry.insert_record(record("1", "https://ex.com/"));
    registry.forget("1", false);
    assert!(registry.pop_pending("1").is_none());
}

#[test]
fn forget_with_keep_pending_preserves_pending_entry() {
    let registry = RequestRegistry::new();
    registry.insert_pending(
        "1",
        PendingRequest {
            url: "https://ex.com/".to_string(),
            method: "GET".to_string(),
            headers: HashMap::new(),
            frame_id: None,
        },
    );
    registry.insert_record(record("1", "https://ex.com/"));
    registry.forget("1", true);
    assert!(registry.pop_pending("1").is_some());
}

#[test]
fn aborted_set_is_sticky() {
    let registry = RequestRegistry::new();
    assert!(!registry.is_aborted("1"));
    registry.mark_aborted("1");
    assert!(registry.is_aborted("1"));
    registry.forget("1", false);
    assert!(registry.is_aborted("1"), "aborted set never clears a requestId");
}

#[test]
fn second_auth_challenge_is_detected() {
    let registry = RequestRegistry::new();
    assert!(!registry.is_authenticated("i-1"));
    registry.mark_authenticated("i-1");
    assert!(registry.is_authenticated("i-1"));
}

#[test]
fn in_flight_snapshot_respects_filter() {
    let registry = RequestRegistry::new();
    registry.insert_record(record("1", "https://ex.com/a"));
    registry.insert_record(record("2", "https://other.com/b"));

    let matches = registry.in_flight(|r| r.url.starts_with("https://ex.com"));
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].request_id, "1");
}
