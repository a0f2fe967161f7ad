use std::collections::HashMap;

use base64::Engine as _;

use super::*;

fn resource(root: bool, provided: bool) -> CachedResource {
    CachedResource {
        content: b"hello".to_vec(),
        mimetype: "text/html".to_string(),
        status: Some(200),
        headers: HashMap::new(),
        root,
        provided,
    }
}

#[test]
fn no_cache_and_allowed_hostname_continues() {
    assert!(matches!(decide(None, false, false), Decision::Continue));
}

#[test]
fn no_cache_and_disallowed_hostname_fails() {
    assert!(matches!(
        decide(None, true, false),
        Decision::Fail(ErrorReason::Aborted)
    ));
}

#[test]
fn root_resource_is_always_fulfilled() {
    assert!(matches!(
        decide(Some(resource(true, false)), true, true),
        Decision::Fulfill(_)
    ));
}

#[test]
fn provided_resource_is_fulfilled_even_with_cache_disabled() {
    assert!(matches!(
        decide(Some(resource(false, true)), false, true),
        Decision::Fulfill(_)
    ));
}

#[test]
fn plain_cached_resource_is_fulfilled_when_caching_through_is_enabled() {
    assert!(matches!(
        decide(Some(resource(false, false)), false, false),
        Decision::Fulfill(_)
    ));
}

#[test]
fn plain_cached_resource_is_bypassed_when_cache_is_disabled() {
    assert!(matches!(
        decide(Some(resource(false, false)), false, true),
        Decision::Continue
    ));
}

#[test]
fn fulfill_params_encode_body_and_lowercase_headers() {
    let mut headers = HashMap::new();
    headers.insert("Content-Type".to_string(), "text/html".to_string());
    let resource = CachedResource {
        content: b"<html></html>".to_vec(),
        mimetype: "text/html".to_string(),
        status: None,
        headers,
        root: true,
        provided: false,
    };

    let params = fulfill_params("i1", &resource);
    assert_eq!(params.response_code, 200);
    assert_eq!(params.body.as_deref(), Some(BASE64.encode(b"<html></html>")).as_deref());
    let header = &params.response_headers.unwrap()[0];
    assert_eq!(header.name, "content-type");
}

#[test]
fn hostname_of_extracts_host() {
    assert_eq!(hostname_of("https://ads.example.com/a.js").as_deref(), Some("ads.example.com"));
    assert_eq!(hostname_of("not a url"), None);
}
