//! Event Demultiplexer (spec §4.C).
//!
//! `watch()` is the sole public entry point: it issues the outbound setup
//! commands (spec §6), then spawns a background task that subscribes to the
//! CDP event broadcast and routes each inbound event to its handler,
//! enforcing ordering via the lifecycle latches. Handler bodies never
//! propagate errors out of the loop (spec §7); only `watch()`'s own setup
//! and [`Watcher::idle`] return a `Result` to the caller.

use std::sync::Arc;

use assetnet_cdp::CdpConnection;
use assetnet_cdp::protocol::fetch::{
    AuthRequiredEvent, EnableParams as FetchEnableParams, RequestPattern, RequestPausedEvent,
};
use assetnet_cdp::protocol::network::{
    EnableParams as NetworkEnableParams, EventSourceMessageReceivedEvent, GetResponseBodyParams,
    GetResponseBodyResult, LoadingFailedEvent, LoadingFinishedEvent, RequestWillBeSentEvent,
    ResponseReceivedEvent, SetBypassServiceWorkerParams, SetCacheDisabledParams,
    SetExtraHTTPHeadersParams, SetUserAgentOverrideParams,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::sync::broadcast;

use crate::auth::handle_auth_required;
use crate::capturer::capture;
use crate::config::WatchOptions;
use crate::decider::{handle_request_paused, install_record};
use crate::error::NetworkError;
use crate::idle::wait_for_idle;
use crate::latches::RequestLatches;
use crate::registry::{PendingRequest, RequestRegistry};
use crate::types::{BoxFuture, RequestRecord, ResourceType, ResponseBody, ResponseData};

/// The on-demand response-body fetch attached to a [`ResponseData`],
/// implemented over `Network.getResponseBody` (spec §4.C's
/// `responseReceived` handler).
struct CdpResponseBody {
    connection: Arc<CdpConnection>,
    session_id: Option<String>,
    request_id: String,
}

impl ResponseBody for CdpResponseBody {
    fn buffer(&self) -> BoxFuture<'_, Result<Vec<u8>, NetworkError>> {
        Box::pin(async move {
            let result: GetResponseBodyResult = self
                .connection
                .send_command(
                    "Network.getResponseBody",
                    Some(GetResponseBodyParams {
                        request_id: self.request_id.clone(),
                    }),
                    self.session_id.as_deref(),
                )
                .await?;

            if result.base64_encoded {
                BASE64
                    .decode(&result.body)
                    .map_err(|err| NetworkError::BodyDecode(err.to_string()))
            } else {
                Ok(result.body.into_bytes())
            }
        })
    }
}

/// Map `Network.requestWillBeSent`'s untyped `type` string onto
/// [`ResourceType`]. Unlike `Fetch.requestPaused`'s `resourceType` (a typed
/// CDP enum, see `assetnet_cdp::protocol::network::ResourceType`), this
/// field is reported as a raw string, so it needs its own mapping rather
/// than `ResourceType::from`.
fn parse_resource_type(raw: Option<&str>) -> ResourceType {
    match raw {
        Some("Document") => ResourceType::Document,
        Some("Stylesheet") => ResourceType::Stylesheet,
        Some("Image") => ResourceType::Image,
        Some("Media") => ResourceType::Media,
        Some("Font") => ResourceType::Font,
        Some("Script") => ResourceType::Script,
        Some("TextTrack") => ResourceType::TextTrack,
        Some("XHR") => ResourceType::Xhr,
        Some("Fetch") => ResourceType::Fetch,
        Some("Prefetch") => ResourceType::Prefetch,
        Some("EventSource") => ResourceType::EventSource,
        Some("WebSocket") => ResourceType::WebSocket,
        Some("Manifest") => ResourceType::Manifest,
        Some("SignedExchange") => ResourceType::SignedExchange,
        Some("Ping") => ResourceType::Ping,
        Some("CSPViolationReport") => ResourceType::CspViolationReport,
        Some("Preflight") => ResourceType::Preflight,
        _ => ResourceType::Other,
    }
}

/// A live asset-discovery watch on one page session.
///
/// Holds the Request Registry (spec §4.B) and the options the background
/// dispatch task was started with. Dropping a `Watcher` stops its dispatch
/// task; it does not touch the underlying `CdpConnection`, which may be
/// shared with other watchers or callers.
pub struct Watcher {
    registry: Arc<RequestRegistry>,
    options: WatchOptions,
    dispatch_task: tokio::task::JoinHandle<()>,
}

impl Watcher {
    /// Block until the in-flight set (matching `filter`) has been empty
    /// continuously for `options.network_idle_timeout`, or raise
    /// [`NetworkError::IdleTimeout`] once the hard ceiling elapses first.
    pub async fn idle(&self, filter: impl Fn(&RequestRecord) -> bool) -> Result<(), NetworkError> {
        wait_for_idle(&self.registry, filter, self.options.network_idle_timeout).await
    }

    /// Snapshot of in-flight records matching `filter`, for diagnostics.
    pub fn in_flight(&self, filter: impl Fn(&RequestRecord) -> bool) -> Vec<RequestRecord> {
        self.registry.in_flight(filter)
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.dispatch_task.abort();
    }
}

/// Attach the asset discovery engine to `session_id` on `connection`:
/// issue the outbound setup commands (spec §6) and spawn the background
/// event-dispatch loop (spec §4.C). `session_id` is `None` for a
/// connection speaking to a single, unsessioned target.
///
/// # Errors
///
/// Returns an error if any setup command fails. Per spec §7, this is one of
/// only two places in the engine that ever propagates an error to the
/// caller (the other being [`Watcher::idle`]).
pub async fn watch(
    connection: Arc<CdpConnection>,
    session_id: Option<String>,
    options: WatchOptions,
) -> Result<Watcher, NetworkError> {
    let registry = Arc::new(RequestRegistry::new());
    let latches = Arc::new(RequestLatches::new());

    connection
        .send_command::<_, serde_json::Value>("Network.enable", Some(NetworkEnableParams::default()), session_id.as_deref())
        .await?;

    connection
        .send_command::<_, serde_json::Value>(
            "Network.setBypassServiceWorker",
            Some(SetBypassServiceWorkerParams {
                bypass: !options.capture_mocked_service_worker,
            }),
            session_id.as_deref(),
        )
        .await?;

    connection
        .send_command::<_, serde_json::Value>(
            "Network.setCacheDisabled",
            Some(SetCacheDisabledParams { cache_disabled: true }),
            session_id.as_deref(),
        )
        .await?;

    if let Some(user_agent) = &options.user_agent {
        connection
            .send_command::<_, serde_json::Value>(
                "Network.setUserAgentOverride",
                Some(SetUserAgentOverrideParams {
                    user_agent: user_agent.clone(),
                    ..Default::default()
                }),
                session_id.as_deref(),
            )
            .await?;
    }

    if !options.request_headers.is_empty() {
        connection
            .send_command::<_, serde_json::Value>(
                "Network.setExtraHTTPHeaders",
                Some(SetExtraHTTPHeadersParams {
                    headers: options.request_headers.clone(),
                }),
                session_id.as_deref(),
            )
            .await?;
    }

    connection
        .send_command::<_, serde_json::Value>(
            "Fetch.enable",
            Some(FetchEnableParams {
                patterns: Some(vec![RequestPattern::url("*")]),
                handle_auth_requests: Some(true),
            }),
            session_id.as_deref(),
        )
        .await?;

    let dispatch_task = spawn_dispatch_loop(connection, Arc::clone(&registry), latches, options.clone(), session_id);

    Ok(Watcher {
        registry,
        options,
        dispatch_task,
    })
}

fn spawn_dispatch_loop(
    connection: Arc<CdpConnection>,
    registry: Arc<RequestRegistry>,
    latches: Arc<RequestLatches>,
    options: WatchOptions,
    session_id: Option<String>,
) -> tokio::task::JoinHandle<()> {
    let mut events = connection.subscribe_events();

    tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Closed) => break,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "CDP event broadcast lagged; some events were dropped");
                    continue;
                }
            };

            if event.session_id != session_id {
                continue;
            }

            let Some(params) = event.params.clone() else {
                continue;
            };

            match event.method.as_str() {
                "Network.requestWillBeSent" => {
                    on_request_will_be_sent(&registry, &latches, &options, params).await;
                }
                "Fetch.requestPaused" => {
                    on_request_paused(&connection, &registry, &latches, &options, session_id.as_deref(), params).await;
                }
                "Fetch.authRequired" => {
                    on_auth_required(&connection, &registry, &options, session_id.as_deref(), params).await;
                }
                "Network.responseReceived" => {
                    on_response_received(&connection, &registry, &latches, session_id.as_deref(), params).await;
                }
                // connection is Arc<CdpConnection>; the on_* handlers above
                // take &Arc<CdpConnection> and deref-coerce where a
                // &CdpConnection is needed, except on_response_received
                // which clones the Arc into the deferred body fetch.
                "Network.eventSourceMessageReceived" => {
                    on_event_source_message(&registry, &latches, params).await;
                }
                "Network.loadingFinished" => {
                    on_loading_finished(&registry, &latches, &options, params).await;
                }
                "Network.loadingFailed" => {
                    on_loading_failed(&registry, &latches, params).await;
                }
                _ => {}
            }
        }

        tracing::debug!("event dispatch loop ended");
    })
}

async fn on_request_will_be_sent(
    registry: &RequestRegistry,
    latches: &RequestLatches,
    options: &WatchOptions,
    params: serde_json::Value,
) {
    let Ok(event) = serde_json::from_value::<RequestWillBeSentEvent>(params) else {
        return;
    };

    if event.request.url.starts_with("data:") {
        return;
    }

    registry.insert_pending(
        &event.request_id,
        PendingRequest {
            url: event.request.url.clone(),
            method: event.request.method.clone(),
            headers: event.request.headers.clone(),
            frame_id: event.frame_id.clone(),
        },
    );

    if options.capture_mocked_service_worker {
        let record = RequestRecord {
            url: event.request.url.clone(),
            method: event.request.method.clone(),
            headers: event.request.headers.clone(),
            resource_type: parse_resource_type(event.resource_type.as_deref()),
            request_id: event.request_id.clone(),
            intercept_id: None,
            frame_id: event.frame_id.clone(),
            redirect_chain: vec![],
            response: None,
        };
        install_record(registry, record);
    }

    latches.resolve_request_will_be_sent(&event.request_id);
}

async fn on_request_paused(
    connection: &Arc<CdpConnection>,
    registry: &RequestRegistry,
    latches: &RequestLatches,
    options: &WatchOptions,
    session_id: Option<&str>,
    params: serde_json::Value,
) {
    let Ok(event) = serde_json::from_value::<RequestPausedEvent>(params) else {
        return;
    };

    let intercept_id = event.request_id.clone();
    let request_id = event.network_id.clone().unwrap_or_else(|| intercept_id.clone());

    latches.wait_request_will_be_sent(&request_id).await;

    let Some(pending) = registry.pop_pending(&request_id) else {
        return;
    };

    if pending.url != event.request.url || pending.method != event.request.method {
        return;
    }

    let record = RequestRecord {
        url: event.request.url.clone(),
        method: event.request.method.clone(),
        headers: event.request.headers.clone(),
        resource_type: event.resource_type.into(),
        request_id,
        intercept_id: Some(intercept_id),
        frame_id: Some(event.frame_id.clone()),
        redirect_chain: vec![],
        response: None,
    };

    handle_request_paused(connection, registry, options, session_id, record).await;
}

async fn on_auth_required(
    connection: &Arc<CdpConnection>,
    registry: &RequestRegistry,
    options: &WatchOptions,
    session_id: Option<&str>,
    params: serde_json::Value,
) {
    let Ok(event) = serde_json::from_value::<AuthRequiredEvent>(params) else {
        return;
    };

    if let Err(err) = handle_auth_required(
        connection,
        registry,
        options.authorization.as_ref(),
        session_id,
        &event.request_id,
    )
    .await
    {
        tracing::debug!(request_id = %event.request_id, error = %err, "continueWithAuth failed");
    }
}

async fn on_response_received(
    connection: &Arc<CdpConnection>,
    registry: &RequestRegistry,
    latches: &RequestLatches,
    session_id: Option<&str>,
    params: serde_json::Value,
) {
    let Ok(event) = serde_json::from_value::<ResponseReceivedEvent>(params) else {
        return;
    };

    latches.wait_request_will_be_sent(&event.request_id).await;

    let response = ResponseData {
        status: u16::try_from(event.response.status).unwrap_or(0),
        mime_type: event.response.mime_type.clone(),
        headers: event.response.headers.clone(),
        buffer: std::sync::Arc::new(CdpResponseBody {
            connection: connection.clone(),
            session_id: session_id.map(str::to_string),
            request_id: event.request_id.clone(),
        }),
    };

    if !registry.attach_response(&event.request_id, response) {
        tracing::debug!(request_id = %event.request_id, "responseReceived for unknown record, dropped");
        return;
    }

    latches.resolve_response_received(&event.request_id);
}

async fn on_event_source_message(registry: &RequestRegistry, latches: &RequestLatches, params: serde_json::Value) {
    let Ok(event) = serde_json::from_value::<EventSourceMessageReceivedEvent>(params) else {
        return;
    };

    latches.wait_request_will_be_sent(&event.request_id).await;
    registry.forget(&event.request_id, false);
}

async fn on_loading_finished(
    registry: &RequestRegistry,
    latches: &RequestLatches,
    options: &WatchOptions,
    params: serde_json::Value,
) {
    let Ok(event) = serde_json::from_value::<LoadingFinishedEvent>(params) else {
        return;
    };

    latches.wait_response_received(&event.request_id).await;

    let Some(record) = registry.get_record(&event.request_id) else {
        return;
    };

    capture(&record, options).await;
    registry.forget(&event.request_id, false);
}

async fn on_loading_failed(registry: &RequestRegistry, latches: &RequestLatches, params: serde_json::Value) {
    let Ok(event) = serde_json::from_value::<LoadingFailedEvent>(params) else {
        return;
    };

    latches.wait_request_will_be_sent(&event.request_id).await;

    if event.error_text == "net::ERR_ABORTED" {
        registry.mark_aborted(&event.request_id);
        tracing::debug!(request_id = %event.request_id, "request aborted");
    } else if event.error_text != "net::ERR_FAILED" {
        tracing::debug!(request_id = %event.request_id, error_text = %event.error_text, "loading failed");
    }

    registry.forget(&event.request_id, false);
}

#[cfg(test)]
mod tests;
