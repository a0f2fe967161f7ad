use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::*;
use crate::types::{CachedResource, CapturedResource, HostnameMatcher, ResourceCache};

struct AllHosts;
impl HostnameMatcher for AllHosts {
    fn is_match(&self, _hostname: &str) -> bool {
        true
    }
}

#[derive(Default)]
struct FakeCache {
    saved: Arc<Mutex<Vec<CapturedResource>>>,
    existing: Option<CachedResource>,
}

impl ResourceCache for FakeCache {
    fn get_resource<'a>(&'a self, _normalized_url: &'a str) -> crate::types::BoxFuture<'a, Option<CachedResource>> {
        let existing = self.existing.clone();
        Box::pin(async move { existing })
    }

    fn save_resource<'a>(&'a self, resource: CapturedResource) -> crate::types::BoxFuture<'a, ()> {
        self.saved.lock().unwrap().push(resource);
        Box::pin(async move {})
    }

    fn disallowed_hostnames(&self) -> &[Box<dyn HostnameMatcher>] {
        &[]
    }

    fn allowed_hostnames(&self) -> &[Box<dyn HostnameMatcher>] {
        static ALLOWED: std::sync::OnceLock<Vec<Box<dyn HostnameMatcher>>> = std::sync::OnceLock::new();
        ALLOWED.get_or_init(|| vec![Box::new(AllHosts)])
    }

    fn disable_cache(&self) -> bool {
        false
    }

    fn enable_javascript(&self) -> bool {
        false
    }

    fn normalize_url(&self, url: &str) -> String {
        url.to_string()
    }

    fn infer_mime(&self, _url: &str) -> Option<String> {
        None
    }
}

fn request_will_be_sent(request_id: &str, url: &str, resource_type: &str) -> serde_json::Value {
    serde_json::json!({
        "requestId": request_id,
        "loaderId": "l1",
        "request": {
            "url": url,
            "method": "GET",
            "headers": {},
        },
        "timestamp": 1.0,
        "wallTime": 1.0,
        "initiator": { "type": "other" },
        "frameId": "f1",
        "type": resource_type,
    })
}

#[test]
fn parse_resource_type_maps_known_cdp_strings() {
    assert_eq!(parse_resource_type(Some("Document")), ResourceType::Document);
    assert_eq!(parse_resource_type(Some("XHR")), ResourceType::Xhr);
    assert_eq!(parse_resource_type(Some("Bogus")), ResourceType::Other);
    assert_eq!(parse_resource_type(None), ResourceType::Other);
}

#[tokio::test]
async fn request_will_be_sent_records_pending_and_resolves_latch() {
    let registry = RequestRegistry::new();
    let latches = RequestLatches::new();
    let options = WatchOptions::new(Arc::new(FakeCache::default()));

    on_request_will_be_sent(&registry, &latches, &options, request_will_be_sent("r1", "https://ex.com/a.js", "Script")).await;

    assert!(registry.pop_pending("r1").is_some());
    latches.wait_request_will_be_sent("r1").await;
}

#[tokio::test]
async fn request_will_be_sent_skips_data_urls_entirely() {
    let registry = RequestRegistry::new();
    let latches = RequestLatches::new();
    let options = WatchOptions::new(Arc::new(FakeCache::default()));

    on_request_will_be_sent(
        &registry,
        &latches,
        &options,
        request_will_be_sent("r1", "data:image/png;base64,AAAA", "Image"),
    )
    .await;

    assert!(registry.pop_pending("r1").is_none());
}

#[tokio::test]
async fn request_will_be_sent_installs_a_record_when_mocking_service_workers() {
    let registry = RequestRegistry::new();
    let latches = RequestLatches::new();
    let options = WatchOptions::new(Arc::new(FakeCache::default())).capture_mocked_service_worker(true);

    on_request_will_be_sent(&registry, &latches, &options, request_will_be_sent("r1", "https://ex.com/a.js", "Script")).await;

    let record = registry.get_record("r1").expect("service-worker path installs a record");
    assert_eq!(record.intercept_id, None);
    assert_eq!(record.resource_type, ResourceType::Script);
}

#[tokio::test]
async fn event_source_message_forgets_the_record() {
    let registry = RequestRegistry::new();
    let latches = RequestLatches::new();
    registry.insert_record(RequestRecord {
        url: "https://ex.com/stream".to_string(),
        method: "GET".to_string(),
        headers: HashMap::new(),
        resource_type: ResourceType::EventSource,
        request_id: "r1".to_string(),
        intercept_id: Some("i1".to_string()),
        frame_id: None,
        redirect_chain: vec![],
        response: None,
    });
    latches.resolve_request_will_be_sent("r1");

    on_event_source_message(
        &registry,
        &latches,
        serde_json::json!({
            "requestId": "r1",
            "timestamp": 1.0,
            "eventName": "message",
            "eventId": "1",
            "data": "ping",
        }),
    )
    .await;

    assert!(registry.get_record("r1").is_none());
}

#[tokio::test]
async fn loading_failed_marks_aborted_on_err_aborted_and_forgets() {
    let registry = RequestRegistry::new();
    let latches = RequestLatches::new();
    registry.insert_record(RequestRecord {
        url: "https://ex.com/a.js".to_string(),
        method: "GET".to_string(),
        headers: HashMap::new(),
        resource_type: ResourceType::Script,
        request_id: "r1".to_string(),
        intercept_id: Some("i1".to_string()),
        frame_id: None,
        redirect_chain: vec![],
        response: None,
    });
    latches.resolve_request_will_be_sent("r1");

    on_loading_failed(
        &registry,
        &latches,
        serde_json::json!({
            "requestId": "r1",
            "timestamp": 1.0,
            "type": "Script",
            "errorText": "net::ERR_ABORTED",
        }),
    )
    .await;

    assert!(registry.is_aborted("r1"));
    assert!(registry.get_record("r1").is_none());
}

#[tokio::test]
async fn loading_failed_forgets_without_aborting_on_other_errors() {
    let registry = RequestRegistry::new();
    let latches = RequestLatches::new();
    registry.insert_record(RequestRecord {
        url: "https://ex.com/a.js".to_string(),
        method: "GET".to_string(),
        headers: HashMap::new(),
        resource_type: ResourceType::Script,
        request_id: "r1".to_string(),
        intercept_id: Some("i1".to_string()),
        frame_id: None,
        redirect_chain: vec![],
        response: None,
    });
    latches.resolve_request_will_be_sent("r1");

    on_loading_failed(
        &registry,
        &latches,
        serde_json::json!({
            "requestId": "r1",
            "timestamp": 1.0,
            "type": "Script",
            "errorText": "net::ERR_NAME_NOT_RESOLVED",
        }),
    )
    .await;

    assert!(!registry.is_aborted("r1"));
    assert!(registry.get_record("r1").is_none());
}

#[tokio::test]
async fn loading_finished_drops_silently_when_no_record_exists() {
    let registry = RequestRegistry::new();
    let latches = RequestLatches::new();
    let options = WatchOptions::new(Arc::new(FakeCache::default()));
    latches.resolve_response_received("r1");

    on_loading_finished(
        &registry,
        &latches,
        &options,
        serde_json::json!({ "requestId": "r1", "timestamp": 1.0, "encodedDataLength": 0.0 }),
    )
    .await;

    assert!(registry.is_empty());
}
