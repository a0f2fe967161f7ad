//! Interception Decider (spec §4.D).
//!
//! Exactly one of `fulfillRequest`, `continueRequest`, or `failRequest` is
//! issued per paused request (barring the abort-race path, which may issue
//! none).

use assetnet_cdp::CdpConnection;
use assetnet_cdp::protocol::fetch::{
    ErrorReason, FailRequestParams, FulfillRequestParams, HeaderEntry,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::config::WatchOptions;
use crate::error::NetworkError;
use crate::registry::RequestRegistry;
use crate::safe_send::safe_send;
use crate::types::{CachedResource, RequestRecord};

/// The outcome of consulting the resource cache for a paused request.
enum Decision {
    Fulfill(CachedResource),
    Fail(ErrorReason),
    Continue,
}

/// Decide what to do with a paused request given its cache lookup result and
/// whether its hostname is on the disallowed list. Pure, so the decision
/// table itself is unit-testable without a connection or registry.
fn decide(cached: Option<CachedResource>, disallowed: bool, disable_cache: bool) -> Decision {
    match cached {
        None if disallowed => Decision::Fail(ErrorReason::Aborted),
        None => Decision::Continue,
        Some(resource) if resource.root || resource.provided || !disable_cache => {
            Decision::Fulfill(resource)
        }
        Some(_) => Decision::Continue,
    }
}

fn fulfill_params(intercept_id: &str, resource: &CachedResource) -> FulfillRequestParams {
    let response_headers = resource
        .headers
        .iter()
        .map(|(name, value)| HeaderEntry {
            name: name.to_lowercase(),
            value: value.clone(),
        })
        .collect();

    FulfillRequestParams {
        request_id: intercept_id.to_string(),
        response_code: i32::from(resource.status.unwrap_or(200)),
        response_headers: Some(response_headers),
        binary_response_headers: None,
        body: Some(BASE64.encode(&resource.content)),
        response_phrase: None,
    }
}

fn hostname_of(url: &str) -> Option<String> {
    url::Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string))
}

/// Archive any prior record on `record.request_id` as the newest redirect
/// hop, then install `record` in the registry. Shared by the paused-request
/// path below and the §4.C mocked-service-worker path (driven from
/// `Network.requestWillBeSent`, which installs a record but — having no
/// `interceptId` to act on — never reaches an outbound Fetch command).
pub(crate) fn install_record(registry: &RequestRegistry, mut record: RequestRecord) -> RequestRecord {
    if let Some(prior) = registry.forget(&record.request_id, true) {
        record.redirect_chain = prior.redirect_chain.clone();
        record.redirect_chain.push(RequestRecord {
            redirect_chain: vec![],
            ..prior
        });
    }
    registry.insert_record(record.clone());
    record
}

/// Resolve a paused request to exactly one outbound Fetch command, installing
/// its [`RequestRecord`] in the registry first (archiving any prior record on
/// the same `requestId` as a redirect hop).
///
/// Outbound Fetch commands (`fulfillRequest`/`continueRequest`/`failRequest`)
/// address the request by its `interceptId` (the Fetch domain's own id,
/// `record.intercept_id`), while the Aborted-set guard and registry/log
/// keying use `record.request_id` (the Network domain id) — the two ids are
/// distinct per spec §3 and CDP's own `Fetch.requestPaused` payload.
pub async fn handle_request_paused(
    connection: &CdpConnection,
    registry: &RequestRegistry,
    options: &WatchOptions,
    session_id: Option<&str>,
    record: RequestRecord,
) {
    let record = install_record(registry, record);
    let request_id = record.request_id.clone();
    let intercept_id = record.intercept_id.clone().unwrap_or_else(|| request_id.clone());

    let origin_url = record.origin_url().to_string();
    let normalized = options.intercept.normalize_url(&origin_url);
    let cached = options.intercept.get_resource(&normalized).await;

    let disallowed = hostname_of(&record.url)
        .map(|host| crate::types::matches_any(options.intercept.disallowed_hostnames(), &host))
        .unwrap_or(false);

    let decision = decide(cached, disallowed, options.intercept.disable_cache());

    let result: Result<(), NetworkError> = match decision {
        Decision::Fulfill(resource) => {
            let params = fulfill_params(&intercept_id, &resource);
            safe_send::<_, serde_json::Value>(
                connection,
                registry,
                &request_id,
                "Fetch.fulfillRequest",
                Some(params),
                session_id,
            )
            .await
            .map(|_| ())
        }
        Decision::Fail(reason) => {
            send_fail(connection, registry, &request_id, &intercept_id, session_id, reason).await
        }
        Decision::Continue => {
            let params = assetnet_cdp::protocol::fetch::ContinueRequestParams {
                request_id: intercept_id.clone(),
                ..Default::default()
            };
            safe_send::<_, serde_json::Value>(
                connection,
                registry,
                &request_id,
                "Fetch.continueRequest",
                Some(params),
                session_id,
            )
            .await
            .map(|_| ())
        }
    };

    if let Err(err) = result {
        handle_send_error(connection, registry, &request_id, &intercept_id, session_id, err).await;
    }
}

async fn send_fail(
    connection: &CdpConnection,
    registry: &RequestRegistry,
    request_id: &str,
    intercept_id: &str,
    session_id: Option<&str>,
    reason: ErrorReason,
) -> Result<(), NetworkError> {
    let params = FailRequestParams {
        request_id: intercept_id.to_string(),
        error_reason: reason,
    };
    safe_send::<_, serde_json::Value>(
        connection,
        registry,
        request_id,
        "Fetch.failRequest",
        Some(params),
        session_id,
    )
    .await
    .map(|_| ())
}

/// Abort-race handling: yield one tick, re-check the Aborted set, and either
/// return silently or attempt one swallowed `failRequest { Failed }`. A
/// session-closed error never reaches that far — there's no session left to
/// send `Fetch.failRequest` on, so it's logged and swallowed immediately.
async fn handle_send_error(
    connection: &CdpConnection,
    registry: &RequestRegistry,
    request_id: &str,
    intercept_id: &str,
    session_id: Option<&str>,
    err: NetworkError,
) {
    match &err {
        NetworkError::InterceptIdInvalid(_) => {
            tokio::task::yield_now().await;
            if registry.is_aborted(request_id) {
                return;
            }
            let _ = send_fail(connection, registry, request_id, intercept_id, session_id, ErrorReason::Failed).await;
        }
        NetworkError::SessionClosed(_) => {
            tracing::debug!(request_id, error = %err, "session closed, dropping Fetch command");
        }
        NetworkError::Cdp(cdp_err) => {
            if let Some(classified) = NetworkError::classify_send_error(cdp_err) {
                Box::pin(handle_send_error(connection, registry, request_id, intercept_id, session_id, classified)).await;
            } else {
                tracing::debug!(request_id, error = %err, "Fetch command failed");
            }
        }
        NetworkError::IdleTimeout { .. } => unreachable!("idle timeout cannot arise from a Fetch send"),
        NetworkError::BodyDecode(_) => unreachable!("body decode error cannot arise from a Fetch send"),
    }
}

#[cfg(test)]
mod tests;
