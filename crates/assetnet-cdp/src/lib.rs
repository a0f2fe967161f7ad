//! # Assetnet CDP - Chrome DevTools Protocol Client
//!
//! Low-level Chrome DevTools Protocol (CDP) implementation over WebSocket.
//! This crate is the transport layer the asset discovery engine in
//! `assetnet-core` is built on: it owns the WebSocket connection, CDP
//! message framing, and the typed `Network`/`Fetch` domain payloads. It does
//! not launch or manage a browser process, and it does not model targets,
//! pages, or sessions beyond the session id string CDP itself uses to route
//! commands and events.
//!
//! ## Features
//!
//! - **Async WebSocket transport**: non-blocking communication with a
//!   Chromium-family browser already listening for CDP connections.
//! - **Typed protocol domains**: `Network` (observational) and `Fetch`
//!   (interception) events and commands.
//! - **Event streaming**: subscribe to a broadcast channel of incoming CDP
//!   events, filtered by method name and session id by the caller.
//! - **Endpoint discovery**: resolve a browser's WebSocket debugger URL from
//!   its `/json/version` HTTP endpoint.
//!
//! ## Quick Start
//!
//! ```no_run
//! use assetnet_cdp::CdpConnection;
//!
//! # async fn example() -> Result<(), assetnet_cdp::CdpError> {
//! // Connect to a running Chrome instance.
//! let conn = CdpConnection::connect("ws://localhost:9222/devtools/browser/...").await?;
//!
//! // Send a CDP command.
//! conn.send_command::<_, serde_json::Value>("Network.enable", None::<()>, Some("session-1"))
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Discovering the WebSocket URL
//!
//! Chrome exposes a JSON API for discovering the WebSocket URL:
//!
//! ```no_run
//! use assetnet_cdp::{discover_websocket_url, CdpConnectionOptions};
//!
//! # async fn example() -> Result<(), assetnet_cdp::CdpError> {
//! let options = CdpConnectionOptions::default();
//! let ws_url = discover_websocket_url("http://localhost:9222", &options).await?;
//! println!("WebSocket URL: {ws_url}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Subscribing to Events
//!
//! ```no_run
//! use assetnet_cdp::CdpConnection;
//!
//! # async fn example(conn: &CdpConnection) -> Result<(), assetnet_cdp::CdpError> {
//! let mut events = conn.subscribe_events();
//!
//! while let Ok(event) = events.recv().await {
//!     if event.method == "Network.requestWillBeSent" {
//!         println!("network request: {:?}", event.params);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`connection`] - WebSocket connection management and endpoint discovery
//! - [`transport`] - Message framing and serialization
//! - [`protocol`] - CDP domain type definitions (`network`, `fetch`)
//! - [`error`] - Error types

pub mod connection;
pub mod error;
pub mod protocol;
pub mod transport;

pub use connection::{BrowserVersion, CdpConnection, CdpConnectionOptions, discover_websocket_url};
pub use error::CdpError;
pub use transport::{CdpEvent, CdpMessage, CdpRequest, CdpResponse};
