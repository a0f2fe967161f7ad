//! Per-request lifecycle latches (spec §4.A).
//!
//! Two one-shot, idempotent, await-from-anywhere signals per `requestId`:
//! `requestWillBeSent` and `responseReceived`. They serialize handler bodies
//! that would otherwise race across the two overlapping event streams.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Notify;

/// A single one-shot, idempotent signal. Can be awaited any number of times,
/// before or after it resolves.
#[derive(Debug, Default)]
struct Latch {
    notify: Notify,
    fired: std::sync::atomic::AtomicBool,
}

impl Latch {
    fn fire(&self) {
        // Relaxed is enough: `notify_waiters` happening-after this store is
        // guaranteed by Notify's own synchronization, and late awaiters
        // re-check `fired` themselves.
        self.fired.store(true, std::sync::atomic::Ordering::Release);
        self.notify.notify_waiters();
    }

    async fn wait(&self) {
        loop {
            if self.fired.load(std::sync::atomic::Ordering::Acquire) {
                return;
            }
            let notified = self.notify.notified();
            // Re-check after subscribing to avoid a missed-wakeup race
            // between the fired check above and notified() registering.
            if self.fired.load(std::sync::atomic::Ordering::Acquire) {
                return;
            }
            notified.await;
        }
    }
}

/// A pair of lifecycle latches for one `requestId`.
#[derive(Debug, Default)]
struct LatchPair {
    request_will_be_sent: Latch,
    response_received: Latch,
}

/// Lazily-created lifecycle latches, keyed by `requestId`.
///
/// Storage grows with the number of distinct request ids observed on a
/// page and is never explicitly pruned — bounded in practice by page
/// lifetime, matching the spec's "not explicitly destroyed" note.
#[derive(Debug, Default)]
pub struct RequestLatches {
    inner: std::sync::Mutex<HashMap<String, Arc<LatchPair>>>,
}

impl RequestLatches {
    /// Create an empty latch table.
    pub fn new() -> Self {
        Self::default()
    }

    fn get_or_insert(&self, request_id: &str) -> Arc<LatchPair> {
        let mut inner = self.inner.lock().expect("latch table poisoned");
        inner
            .entry(request_id.to_string())
            .or_insert_with(|| Arc::new(LatchPair::default()))
            .clone()
    }

    /// Resolve the `requestWillBeSent` latch for `request_id`. Idempotent.
    pub fn resolve_request_will_be_sent(&self, request_id: &str) {
        self.get_or_insert(request_id).request_will_be_sent.fire();
    }

    /// Resolve the `responseReceived` latch for `request_id`. Idempotent.
    pub fn resolve_response_received(&self, request_id: &str) {
        self.get_or_insert(request_id).response_received.fire();
    }

    /// Await the `requestWillBeSent` latch for `request_id`.
    pub async fn wait_request_will_be_sent(&self, request_id: &str) {
        let pair = self.get_or_insert(request_id);
        pair.request_will_be_sent.wait().await;
    }

    /// Await the `responseReceived` latch for `request_id`.
    pub async fn wait_response_received(&self, request_id: &str) {
        let pair = self.get_or_insert(request_id);
        pair.response_received.wait().await;
    }
}

#[cfg(test)]
mod tests;
