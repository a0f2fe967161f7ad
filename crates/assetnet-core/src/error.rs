//! Error types for the asset discovery engine.

use assetnet_cdp::CdpError;
use thiserror::Error;

/// Errors surfaced by the asset discovery engine.
///
/// Per the engine's error taxonomy, only two code paths ever propagate an
/// error out to a caller: the idle waiter's hard-ceiling expiry, and the
/// initial `watch()` setup. Every other handler swallows its own errors
/// (logged at `debug!`/`warn!`) so a single bad event can't halt the page.
#[derive(Error, Debug)]
pub enum NetworkError {
    /// The underlying CDP transport failed.
    #[error("{0}")]
    Cdp(#[from] CdpError),

    /// An outbound Fetch command referenced a `requestId`/`interceptId` the
    /// browser has already aborted. Classified by inspecting the protocol
    /// error message, since CDP reports this as a generic string, not a
    /// distinct error code.
    #[error("intercept id no longer valid: {0}")]
    InterceptIdInvalid(String),

    /// The CDP session closed while an outbound command or idle wait was in
    /// flight.
    #[error("session closed: {0}")]
    SessionClosed(String),

    /// The idle waiter's hard ceiling (`PERCY_NETWORK_IDLE_WAIT_TIMEOUT`)
    /// expired before the in-flight set was empty for a full quiet window.
    #[error(
        "{}",
        if active.is_empty() {
            "timed out waiting for network idle".to_string()
        } else {
            format!(
                "timed out waiting for network idle. Active requests: {}",
                active.join(", ")
            )
        }
    )]
    IdleTimeout {
        /// URLs of requests still in-flight at the moment of timeout.
        active: Vec<String>,
    },

    /// A response body reported as base64 by `Network.getResponseBody` (or
    /// `Fetch.getResponseBody`) could not be decoded. Only ever reaches the
    /// Response Capturer, which logs it at `debug!` and skips the capture.
    #[error("failed to decode response body: {0}")]
    BodyDecode(String),
}

impl NetworkError {
    /// Classify an error raised by an outbound Fetch send.
    ///
    /// Returns `Some(NetworkError::InterceptIdInvalid(..))` when the error
    /// message matches the invalid-interception-id sentinel CDP uses for a
    /// request the browser already aborted, `Some(NetworkError::SessionClosed(..))`
    /// when the message indicates the session is closing, otherwise `None`
    /// (the error is a genuine, unrelated failure).
    pub fn classify_send_error(err: &CdpError) -> Option<Self> {
        let message = match err {
            CdpError::Protocol { message, .. } => message.as_str(),
            CdpError::ConnectionLost => "connection lost",
            _ => return None,
        };

        if message.contains("Invalid InterceptionId") || message.contains("Aborted") {
            return Some(Self::InterceptIdInvalid(message.to_string()));
        }
        if message.contains("closing") || message.contains("closed") || message.contains("lost") {
            return Some(Self::SessionClosed(message.to_string()));
        }
        None
    }
}
