//! Data model: request records, response data, and the resource-cache
//! collaborator interface (spec §3, §6).

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use assetnet_cdp::protocol::network::ResourceType as CdpResourceType;

use crate::error::NetworkError;

/// A boxed, `Send` future — used for the few trait methods on the external
/// collaborator interfaces that need to be async without making those
/// traits generic over a runtime.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Resource type as perceived by the rendering engine (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    /// Document resource (HTML).
    Document,
    /// Stylesheet resource (CSS).
    Stylesheet,
    /// Image resource.
    Image,
    /// Media resource (audio/video).
    Media,
    /// Font resource.
    Font,
    /// Script resource.
    Script,
    /// Text track resource.
    TextTrack,
    /// `XMLHttpRequest` resource.
    Xhr,
    /// Fetch API resource.
    Fetch,
    /// Prefetch resource.
    Prefetch,
    /// `EventSource` resource.
    EventSource,
    /// WebSocket resource.
    WebSocket,
    /// Manifest resource.
    Manifest,
    /// Signed exchange resource.
    SignedExchange,
    /// Ping resource.
    Ping,
    /// CSP violation report.
    CspViolationReport,
    /// Preflight request.
    Preflight,
    /// Anything not covered above.
    Other,
}

impl ResourceType {
    /// Whether this type is captured when JavaScript capture is disabled,
    /// per spec §4.E capture filter 6 / §6 "Limits".
    pub fn capturable_without_javascript(self) -> bool {
        matches!(
            self,
            Self::Document
                | Self::Stylesheet
                | Self::Image
                | Self::Media
                | Self::Font
                | Self::Other
        )
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Document => "document",
            Self::Stylesheet => "stylesheet",
            Self::Image => "image",
            Self::Media => "media",
            Self::Font => "font",
            Self::Script => "script",
            Self::TextTrack => "texttrack",
            Self::Xhr => "xhr",
            Self::Fetch => "fetch",
            Self::Prefetch => "prefetch",
            Self::EventSource => "eventsource",
            Self::WebSocket => "websocket",
            Self::Manifest => "manifest",
            Self::SignedExchange => "signedexchange",
            Self::Ping => "ping",
            Self::CspViolationReport => "cspviolationreport",
            Self::Preflight => "preflight",
            Self::Other => "other",
        };
        write!(f, "{s}")
    }
}

impl From<CdpResourceType> for ResourceType {
    fn from(cdp_type: CdpResourceType) -> Self {
        match cdp_type {
            CdpResourceType::Document => Self::Document,
            CdpResourceType::Stylesheet => Self::Stylesheet,
            CdpResourceType::Image => Self::Image,
            CdpResourceType::Media => Self::Media,
            CdpResourceType::Font => Self::Font,
            CdpResourceType::Script => Self::Script,
            CdpResourceType::TextTrack => Self::TextTrack,
            CdpResourceType::XHR => Self::Xhr,
            CdpResourceType::Fetch => Self::Fetch,
            CdpResourceType::Prefetch => Self::Prefetch,
            CdpResourceType::EventSource => Self::EventSource,
            CdpResourceType::WebSocket => Self::WebSocket,
            CdpResourceType::Manifest => Self::Manifest,
            CdpResourceType::SignedExchange => Self::SignedExchange,
            CdpResourceType::Ping => Self::Ping,
            CdpResourceType::CSPViolationReport => Self::CspViolationReport,
            CdpResourceType::Preflight => Self::Preflight,
            CdpResourceType::Other => Self::Other,
        }
    }
}

/// A captured response, attached to a [`RequestRecord`] once
/// `Network.responseReceived` has fired.
#[derive(Clone)]
pub struct ResponseData {
    /// HTTP status code.
    pub status: u16,
    /// Response MIME type as reported by the browser.
    pub mime_type: String,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Deferred body fetch. Only the Response Capturer ever calls this;
    /// everyone else treats the response as metadata-only.
    pub buffer: std::sync::Arc<dyn ResponseBody>,
}

impl fmt::Debug for ResponseData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseData")
            .field("status", &self.status)
            .field("mime_type", &self.mime_type)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// The deferred, on-demand body fetch attached to a response. Modeled as an
/// interface (per the §9 "Deferred `buffer()` closure" design note) rather
/// than a stored callable, since the capture path is its only consumer and
/// it needs to await `Network.getResponseBody` on demand rather than at
/// `responseReceived` time.
pub trait ResponseBody: Send + Sync {
    /// Fetch and decode the response body.
    fn buffer(&self) -> BoxFuture<'_, Result<Vec<u8>, NetworkError>>;
}

/// A single request, keyed by its CDP `requestId`.
#[derive(Debug, Clone)]
pub struct RequestRecord {
    /// Request URL.
    pub url: String,
    /// HTTP method.
    pub method: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Resource type as perceived by the rendering engine.
    pub resource_type: ResourceType,
    /// `Network` domain identifier.
    pub request_id: String,
    /// `Fetch` domain identifier. Absent for service-worker-synthesized
    /// requests, which never pause.
    pub intercept_id: Option<String>,
    /// Frame that issued the request.
    pub frame_id: Option<String>,
    /// Prior hops of the same logical navigation, earliest first. The
    /// current record's `url` is the final hop.
    pub redirect_chain: Vec<RequestRecord>,
    /// Attached once `Network.responseReceived` fires.
    pub response: Option<ResponseData>,
}

impl RequestRecord {
    /// The URL of the first hop in this request's redirect history, or its
    /// own URL if it was never redirected. Per spec §4.D, this is the URL
    /// used to key the resource cache lookup.
    pub fn origin_url(&self) -> &str {
        self.redirect_chain
            .first()
            .map_or(self.url.as_str(), |first| first.url.as_str())
    }
}

/// A resource found in the external cache, keyed by normalized URL.
#[derive(Debug, Clone)]
pub struct CachedResource {
    /// Cached response body.
    pub content: Vec<u8>,
    /// Cached MIME type.
    pub mimetype: String,
    /// Cached HTTP status, if any (defaults to 200 when fulfilling).
    pub status: Option<u16>,
    /// Cached response headers.
    pub headers: HashMap<String, String>,
    /// Whether this is the top-level document being rendered; always
    /// fulfilled from cache regardless of other policy.
    pub root: bool,
    /// Whether this was injected by an external source (not discovered
    /// from the page); fulfilled from cache regardless of cache-disable
    /// policy.
    pub provided: bool,
}

/// A freshly captured response, ready to be handed to the cache.
#[derive(Debug, Clone)]
pub struct CapturedResource {
    /// Origin (pre-redirect) URL of the captured request — the same key
    /// the Interception Decider looks resources up by (spec §4.D).
    pub url: String,
    /// Captured response body.
    pub content: Vec<u8>,
    /// Effective MIME type (after text/plain refinement, §4.E).
    pub mimetype: String,
    /// HTTP status.
    pub status: u16,
    /// Response headers, each value split on newlines into a list (CDP
    /// reports folded headers joined by `\n`).
    pub headers: HashMap<String, Vec<String>>,
}

/// Matches a hostname against an externally-owned pattern. Hostname-glob
/// matching itself is out of scope for this engine (spec §1); this trait is
/// the seam an external hostname-policy implementation plugs into.
pub trait HostnameMatcher: Send + Sync {
    /// Whether `hostname` matches this pattern.
    fn is_match(&self, hostname: &str) -> bool;
}

/// The external resource cache and capture-policy collaborator (spec §6's
/// `intercept` object). URL normalization and MIME inference are likewise
/// out of scope for this engine and are exposed here as callbacks onto the
/// same collaborator, rather than as separate traits, since every
/// implementation needs all of these together.
pub trait ResourceCache: Send + Sync {
    /// Look up a cached resource by normalized URL.
    fn get_resource<'a>(&'a self, normalized_url: &'a str) -> BoxFuture<'a, Option<CachedResource>>;

    /// Persist a freshly captured resource.
    fn save_resource<'a>(&'a self, resource: CapturedResource) -> BoxFuture<'a, ()>;

    /// Hostnames that requests are never served to network for (absent any
    /// cached resource), unless the request is a root resource.
    fn disallowed_hostnames(&self) -> &[Box<dyn HostnameMatcher>];

    /// Hostnames eligible for response capture.
    fn allowed_hostnames(&self) -> &[Box<dyn HostnameMatcher>];

    /// If true, requests are never fulfilled from cache purely because
    /// caching-through is enabled (only root/provided resources still are).
    fn disable_cache(&self) -> bool;

    /// If true, JavaScript responses are eligible for capture in addition
    /// to the always-allowed resource types.
    fn enable_javascript(&self) -> bool;

    /// Normalize a URL for cache keying.
    fn normalize_url(&self, url: &str) -> String;

    /// Infer a MIME type from a URL path, stripped of its query string.
    /// Returns `None` if no inference is possible.
    fn infer_mime(&self, url: &str) -> Option<String>;
}

/// Check whether `hostname` matches any pattern in `patterns`. An empty
/// pattern list means "no restriction" for allow-lists, resolved in
/// [`crate::decider`]/[`crate::capturer`] per patterns documented there.
pub fn matches_any(patterns: &[Box<dyn HostnameMatcher>], hostname: &str) -> bool {
    patterns.iter().any(|p| p.is_match(hostname))
}
