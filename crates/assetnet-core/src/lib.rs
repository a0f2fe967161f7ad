//! # assetnet-core — browser-driven asset discovery engine
//!
//! Attaches to an active Chrome DevTools Protocol (CDP) page session,
//! observes every network request the page issues, intercepts and
//! conditionally fulfills those requests from an external resource cache,
//! captures response bodies that qualify as reusable visual assets, and
//! signals the caller when the page has reached network idle.
//!
//! ## Components
//!
//! - [`latches`] — per-request lifecycle synchronization.
//! - [`registry`] — in-flight request records, pending events, the aborted
//!   and authenticated-once sets.
//! - [`watcher`] — the event demultiplexer: subscribes to CDP events and
//!   drives everything else. [`watch`] is the crate's primary entry point.
//! - [`decider`] — per-request fulfill/continue/fail decision.
//! - [`capturer`] — response body capture, subject to size/status/type
//!   filters.
//! - [`idle`] — quiet-window + hard-ceiling network-idle detection.
//! - [`auth`] — `Fetch.authRequired` handling.
//! - [`safe_send`] — guards outbound protocol calls against already-aborted
//!   requests.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use assetnet_cdp::{discover_websocket_url, CdpConnection, CdpConnectionOptions};
//! use assetnet_core::{watch, WatchOptions};
//!
//! # async fn example(cache: Arc<dyn assetnet_core::ResourceCache>) -> Result<(), assetnet_core::NetworkError> {
//! let ws_url = discover_websocket_url("http://localhost:9222", &CdpConnectionOptions::default()).await?;
//! let connection = Arc::new(CdpConnection::connect(&ws_url).await?);
//!
//! let watcher = watch(connection, None, WatchOptions::new(cache)).await?;
//! watcher.idle(|_| true).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod capturer;
pub mod config;
pub mod decider;
pub mod error;
pub mod idle;
pub mod latches;
pub mod registry;
pub mod safe_send;
pub mod types;
pub mod watcher;

pub use config::{Credentials, WatchOptions};
pub use error::NetworkError;
pub use latches::RequestLatches;
pub use registry::{PendingRequest, RequestRegistry};
pub use types::{
    BoxFuture, CachedResource, CapturedResource, HostnameMatcher, RequestRecord, ResourceCache,
    ResourceType, ResponseBody, ResponseData,
};
pub use watcher::{watch, Watcher};

// Re-exported for callers that need to establish the `CdpConnection` this
// crate's `watch()` attaches to; session/browser bootstrap itself is out of
// scope for this crate (spec §1), but endpoint discovery is a generic CDP
// transport concern owned by `assetnet-cdp`.
pub use assetnet_cdp::{discover_websocket_url, BrowserVersion, CdpConnection, CdpConnectionOptions, CdpError};
