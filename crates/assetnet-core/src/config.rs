//! Engine configuration.
//!
//! Mirrors spec §6's "Configuration inputs" and the single process-wide
//! environment variable, read once and cached per the §9 "Single-shot
//! env-var initialization" design note.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::types::ResourceCache;

/// Default quiet-window length, in milliseconds, before the page is
/// considered network-idle.
pub const DEFAULT_NETWORK_IDLE_TIMEOUT_MS: u64 = 100;

/// Default hard ceiling on an idle wait, in milliseconds.
const DEFAULT_HARD_TIMEOUT_MS: u64 = 30_000;

/// Above this, `hard_idle_timeout()` logs a one-time warning.
const WARN_THRESHOLD_MS: u64 = 60_000;

/// Name of the environment variable that overrides the hard idle-wait
/// ceiling.
pub const NETWORK_TIMEOUT_ENV_VAR: &str = "PERCY_NETWORK_IDLE_WAIT_TIMEOUT";

static HARD_TIMEOUT: OnceLock<Duration> = OnceLock::new();

/// The hard ceiling on idle waits, read once from
/// `PERCY_NETWORK_IDLE_WAIT_TIMEOUT` (default 30000ms). Values over 60000ms
/// log a one-time warning but are still honored.
pub fn hard_idle_timeout() -> Duration {
    *HARD_TIMEOUT.get_or_init(|| {
        let ms = std::env::var(NETWORK_TIMEOUT_ENV_VAR)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_HARD_TIMEOUT_MS);

        if ms > WARN_THRESHOLD_MS {
            tracing::warn!(
                ms,
                env_var = NETWORK_TIMEOUT_ENV_VAR,
                "network idle hard timeout is unusually high"
            );
        }

        Duration::from_millis(ms)
    })
}

/// HTTP credentials offered in response to `Fetch.authRequired` challenges.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Username to offer.
    pub username: String,
    /// Password to offer.
    pub password: String,
}

/// Per-page configuration for [`crate::watcher::Watcher`].
#[derive(Clone)]
pub struct WatchOptions {
    /// Quiet-window length before the page is considered network-idle.
    pub network_idle_timeout: Duration,
    /// Credentials offered for `Fetch.authRequired` challenges, if any.
    pub authorization: Option<Credentials>,
    /// Extra headers applied to every outgoing request via
    /// `Network.setExtraHTTPHeaders`.
    pub request_headers: HashMap<String, String>,
    /// If true, do not bypass service workers, and additionally drive the
    /// Interception Decider from `Network.requestWillBeSent` for
    /// service-worker-synthesized requests.
    pub capture_mocked_service_worker: bool,
    /// Override for `Network.setUserAgentOverride`. Defaults to the
    /// browser's reported user agent with `"Headless"` stripped.
    pub user_agent: Option<String>,
    /// The external resource cache / capture policy collaborator.
    pub intercept: Arc<dyn ResourceCache>,
    /// Opaque annotation attached to log lines emitted by this watcher.
    pub meta: Option<serde_json::Value>,
}

impl WatchOptions {
    /// Create options with the given resource cache and every other field
    /// at its spec-documented default.
    pub fn new(intercept: Arc<dyn ResourceCache>) -> Self {
        Self {
            network_idle_timeout: Duration::from_millis(DEFAULT_NETWORK_IDLE_TIMEOUT_MS),
            authorization: None,
            request_headers: HashMap::new(),
            capture_mocked_service_worker: false,
            user_agent: None,
            intercept,
            meta: None,
        }
    }

    /// Set the network idle quiet-window.
    #[must_use]
    pub fn network_idle_timeout(mut self, timeout: Duration) -> Self {
        self.network_idle_timeout = timeout;
        self
    }

    /// Set HTTP auth credentials.
    #[must_use]
    pub fn authorization(mut self, credentials: Credentials) -> Self {
        self.authorization = Some(credentials);
        self
    }

    /// Set extra request headers.
    #[must_use]
    pub fn request_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.request_headers = headers;
        self
    }

    /// Enable mocked-service-worker capture.
    #[must_use]
    pub fn capture_mocked_service_worker(mut self, enabled: bool) -> Self {
        self.capture_mocked_service_worker = enabled;
        self
    }

    /// Override the reported user agent.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Attach an opaque log annotation.
    #[must_use]
    pub fn meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// Strip `"Headless"` from a browser-reported user agent string, per spec
/// §6's "Default user agent" rule (non-headless emulation).
pub fn default_user_agent(reported: &str) -> String {
    reported.replace("Headless", "")
}
