//! CDP transport and protocol error types.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while talking to the browser over CDP.
#[derive(Error, Debug)]
pub enum CdpError {
    /// The initial WebSocket handshake failed.
    #[error("WebSocket connection failed: {0}")]
    ConnectionFailed(String),

    /// The WebSocket connection was closed or otherwise lost.
    #[error("WebSocket connection lost")]
    ConnectionLost,

    /// A message could not be handed off to the write loop.
    #[error("failed to send CDP message: {0}")]
    SendFailed(String),

    /// The browser returned a JSON-RPC error for a command.
    #[error("CDP protocol error {code}: {message}")]
    Protocol {
        /// JSON-RPC error code.
        code: i64,
        /// JSON-RPC error message.
        message: String,
    },

    /// Serializing or deserializing a CDP message failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A command did not receive a response within its timeout.
    #[error("response timeout after {0:?}")]
    Timeout(Duration),

    /// A response arrived carrying a message ID that wasn't pending.
    #[error("invalid message ID: expected {expected}, got {got}")]
    InvalidMessageId {
        /// The ID that was expected.
        expected: u64,
        /// The ID that was actually received.
        got: u64,
    },

    /// The supplied WebSocket URL could not be parsed.
    #[error("invalid WebSocket URL: {0}")]
    InvalidUrl(String),

    /// A command referenced a session that is not known to this connection.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Spawning the browser process failed.
    #[error("failed to spawn browser process: {0}")]
    SpawnFailed(String),

    /// The browser process did not print a debugging WebSocket URL.
    #[error("failed to get debugging URL from browser")]
    NoDebuggingUrl,

    /// No Chromium-family binary could be located on the system.
    #[error("Chromium not found. Set CHROMIUM_PATH environment variable or ensure Chromium is installed.")]
    ChromiumNotFound,

    /// The browser process did not become ready in time.
    #[error("browser launch timeout after {0:?}")]
    LaunchTimeout(Duration),

    /// An endpoint URL passed to discovery could not be parsed or used.
    #[error("invalid endpoint URL: {0}")]
    InvalidEndpointUrl(String),

    /// The HTTP request made during endpoint discovery failed.
    #[error("discovery HTTP request failed: {0}")]
    HttpRequestFailed(String),

    /// Endpoint discovery timed out waiting for an HTTP response.
    #[error("discovery request timed out after {0:?}")]
    ConnectionTimeout(Duration),

    /// Endpoint discovery completed but the response was unusable.
    #[error("failed to discover WebSocket URL from {url}: {reason}")]
    EndpointDiscoveryFailed {
        /// The endpoint URL that was queried.
        url: String,
        /// Why discovery failed.
        reason: String,
    },
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            WsError::ConnectionClosed | WsError::AlreadyClosed => Self::ConnectionLost,
            other => Self::ConnectionFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests;
