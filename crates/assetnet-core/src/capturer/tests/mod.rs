use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::*;
use crate::types::{BoxFuture, CachedResource, HostnameMatcher, ResourceCache, ResourceType, ResponseBody, ResponseData};

struct StaticBody(Vec<u8>);
impl ResponseBody for StaticBody {
    fn buffer(&self) -> BoxFuture<'_, Result<Vec<u8>, crate::error::NetworkError>> {
        let body = self.0.clone();
        Box::pin(async move { Ok(body) })
    }
}

struct AllHosts;
impl HostnameMatcher for AllHosts {
    fn is_match(&self, _hostname: &str) -> bool {
        true
    }
}

struct FakeCache {
    saved: Arc<Mutex<Vec<CapturedResource>>>,
    existing: Option<CachedResource>,
    disable_cache: bool,
    enable_javascript: bool,
    allowed: Vec<Box<dyn HostnameMatcher>>,
}

impl Default for FakeCache {
    fn default() -> Self {
        Self {
            saved: Arc::new(Mutex::new(Vec::new())),
            existing: None,
            disable_cache: false,
            enable_javascript: false,
            allowed: vec![Box::new(AllHosts)],
        }
    }
}

impl ResourceCache for FakeCache {
    fn get_resource<'a>(&'a self, _normalized_url: &'a str) -> BoxFuture<'a, Option<CachedResource>> {
        let existing = self.existing.clone();
        Box::pin(async move { existing })
    }

    fn save_resource<'a>(&'a self, resource: CapturedResource) -> BoxFuture<'a, ()> {
        self.saved.lock().unwrap().push(resource);
        Box::pin(async move {})
    }

    fn disallowed_hostnames(&self) -> &[Box<dyn HostnameMatcher>] {
        &[]
    }

    fn allowed_hostnames(&self) -> &[Box<dyn HostnameMatcher>] {
        &self.allowed
    }

    fn disable_cache(&self) -> bool {
        self.disable_cache
    }

    fn enable_javascript(&self) -> bool {
        self.enable_javascript
    }

    fn normalize_url(&self, url: &str) -> String {
        url.to_string()
    }

    fn infer_mime(&self, _url: &str) -> Option<String> {
        None
    }
}

fn record_with_response(status: u16, mime_type: &str, body: &[u8], resource_type: ResourceType) -> RequestRecord {
    RequestRecord {
        url: "https://assets.example.com/a.png".to_string(),
        method: "GET".to_string(),
        headers: HashMap::new(),
        resource_type,
        request_id: "1".to_string(),
        intercept_id: Some("i1".to_string()),
        frame_id: None,
        redirect_chain: vec![],
        response: Some(ResponseData {
            status,
            mime_type: mime_type.to_string(),
            headers: HashMap::new(),
            buffer: Arc::new(StaticBody(body.to_vec())),
        }),
    }
}

#[tokio::test]
async fn captures_a_qualifying_image() {
    let record = record_with_response(200, "image/png", b"pngbytes", ResourceType::Image);
    let cache = FakeCache::default();
    let saved = cache.saved.clone();
    let options = WatchOptions::new(Arc::new(cache));

    capture(&record, &options).await;

    let saved = saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].content, b"pngbytes");
    assert_eq!(saved[0].mimetype, "image/png");
}

#[tokio::test]
async fn skips_capture_when_a_root_resource_is_already_cached() {
    let record = record_with_response(200, "image/png", b"pngbytes", ResourceType::Image);
    let mut cache = FakeCache::default();
    cache.existing = Some(CachedResource {
        content: b"cached".to_vec(),
        mimetype: "image/png".to_string(),
        status: Some(200),
        headers: HashMap::new(),
        root: true,
        provided: false,
    });
    let saved = cache.saved.clone();
    let options = WatchOptions::new(Arc::new(cache));

    capture(&record, &options).await;

    assert!(saved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn recaptures_when_existing_entry_is_plain_and_caching_is_enabled() {
    let record = record_with_response(200, "image/png", b"pngbytes", ResourceType::Image);
    let mut cache = FakeCache::default();
    cache.existing = Some(CachedResource {
        content: b"stale".to_vec(),
        mimetype: "image/png".to_string(),
        status: Some(200),
        headers: HashMap::new(),
        root: false,
        provided: false,
    });
    let saved = cache.saved.clone();
    let options = WatchOptions::new(Arc::new(cache));

    capture(&record, &options).await;

    assert_eq!(saved.lock().unwrap().len(), 1);
}

#[test]
fn filters_reject_empty_body() {
    let record = record_with_response(200, "image/png", b"", ResourceType::Image);
    assert_eq!(check_filters(&record, 0, true, false), Err(SkipReason::EmptyBody));
}

#[test]
fn filters_reject_oversized_body() {
    let record = record_with_response(200, "image/png", b"x", ResourceType::Image);
    assert_eq!(
        check_filters(&record, MAX_CAPTURE_BYTES + 1, true, false),
        Err(SkipReason::TooLarge)
    );
}

#[test]
fn filters_reject_uncapturable_status() {
    let record = record_with_response(404, "image/png", b"x", ResourceType::Image);
    assert_eq!(check_filters(&record, 1, true, false), Err(SkipReason::StatusNotCapturable));
}

#[test]
fn filters_reject_script_without_javascript_enabled() {
    let record = record_with_response(200, "application/javascript", b"x", ResourceType::Script);
    assert_eq!(
        check_filters(&record, 1, true, false),
        Err(SkipReason::ResourceTypeNotCapturable)
    );
}

#[test]
fn filters_accept_script_with_javascript_enabled() {
    let record = record_with_response(200, "application/javascript", b"x", ResourceType::Script);
    assert!(check_filters(&record, 1, true, true).is_ok());
}

#[test]
fn filters_reject_disallowed_hostname() {
    let record = record_with_response(200, "image/png", b"x", ResourceType::Image);
    assert_eq!(check_filters(&record, 1, false, false), Err(SkipReason::HostnameNotAllowed));
}

#[tokio::test]
async fn refine_mime_keeps_non_plain_reported_type() {
    let options = WatchOptions::new(Arc::new(FakeCache::default()));
    assert_eq!(refine_mime_type("https://ex.com/a.png", "image/png", &options), "image/png");
}

#[tokio::test]
async fn refine_mime_falls_back_to_reported_when_nothing_inferred() {
    let options = WatchOptions::new(Arc::new(FakeCache::default()));
    assert_eq!(refine_mime_type("https://ex.com/a", "text/plain", &options), "text/plain");
}

#[test]
fn split_headers_breaks_folded_newlines_into_a_list() {
    let mut headers = HashMap::new();
    headers.insert("set-cookie".to_string(), "a=1\nb=2".to_string());
    let split = split_headers(&headers);
    assert_eq!(split["set-cookie"], vec!["a=1".to_string(), "b=2".to_string()]);
}
