//! Request Registry (spec §4.B): in-flight request records, pending
//! pre-pause events, active auth attempts, and the aborted set.
//!
//! All mutators share a single lock, matching spec §5's "single writer, or
//! a mutex held across each handler body" concurrency model.

use std::collections::{HashMap, HashSet};

use crate::types::{RequestRecord, ResponseData};

/// A `Network.requestWillBeSent` payload, kept until the matching
/// `Fetch.requestPaused` (or the request is abandoned).
#[derive(Debug, Clone)]
pub struct PendingRequest {
    /// Request URL.
    pub url: String,
    /// HTTP method.
    pub method: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Frame that issued the request.
    pub frame_id: Option<String>,
}

#[derive(Default)]
struct RegistryInner {
    records: HashMap<String, RequestRecord>,
    pending: HashMap<String, PendingRequest>,
    authentications: HashSet<String>,
    aborted: HashSet<String>,
}

/// In-flight request state shared by every component that observes CDP
/// events. See spec §3 for the invariants this upholds (at most one record
/// per `requestId`; present only between `_handleRequest` and
/// `_forgetRequest`; once a `requestId` is aborted it stays aborted).
#[derive(Default)]
pub struct RequestRegistry {
    inner: std::sync::Mutex<RegistryInner>,
}

impl RequestRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryInner> {
        self.inner.lock().expect("request registry poisoned")
    }

    /// Record a `Network.requestWillBeSent` payload for `request_id`.
    pub fn insert_pending(&self, request_id: &str, pending: PendingRequest) {
        self.lock().pending.insert(request_id.to_string(), pending);
    }

    /// Remove and return the pending entry for `request_id`, if any.
    pub fn pop_pending(&self, request_id: &str) -> Option<PendingRequest> {
        self.lock().pending.remove(request_id)
    }

    /// Insert (or replace, on redirect) the Request Record for
    /// `record.request_id`, returning the prior record if one existed.
    pub fn insert_record(&self, record: RequestRecord) -> Option<RequestRecord> {
        let mut inner = self.lock();
        inner.records.insert(record.request_id.clone(), record)
    }

    /// Snapshot the current record for `request_id`, if present.
    pub fn get_record(&self, request_id: &str) -> Option<RequestRecord> {
        self.lock().records.get(request_id).cloned()
    }

    /// Attach a captured response to the record for `request_id`. Returns
    /// `false` if no record exists (the caller should drop the event as a
    /// race loss, per spec §4.C).
    pub fn attach_response(&self, request_id: &str, response: ResponseData) -> bool {
        let mut inner = self.lock();
        match inner.records.get_mut(request_id) {
            Some(record) => {
                record.response = Some(response);
                true
            }
            None => false,
        }
    }

    /// Remove the Request Record for `request_id`, its `interceptId` from
    /// Authentications, and — unless `keep_pending` is set (used when
    /// archiving a record mid-redirect-walk) — its Pending entry. Returns
    /// the removed record, if any. Idempotent.
    pub fn forget(&self, request_id: &str, keep_pending: bool) -> Option<RequestRecord> {
        let mut inner = self.lock();
        let record = inner.records.remove(request_id);
        if let Some(record) = &record {
            if let Some(intercept_id) = &record.intercept_id {
                inner.authentications.remove(intercept_id);
            }
        }
        if !keep_pending {
            inner.pending.remove(request_id);
        }
        record
    }

    /// Whether `request_id` is in the Aborted set.
    pub fn is_aborted(&self, request_id: &str) -> bool {
        self.lock().aborted.contains(request_id)
    }

    /// Add `request_id` to the Aborted set. Never removed for the lifetime
    /// of the page.
    pub fn mark_aborted(&self, request_id: &str) {
        self.lock().aborted.insert(request_id.to_string());
    }

    /// Resolve the `Network`-domain `requestId` of the record whose
    /// `interceptId` is `intercept_id`, if one is currently tracked. The
    /// Aborted set is keyed by the `Network` id (`mark_aborted` is only
    /// ever called from `Network.loadingFailed`), so any check against it
    /// starting from a `Fetch`-domain id must resolve through this first.
    pub fn request_id_for_intercept(&self, intercept_id: &str) -> Option<String> {
        self.lock()
            .records
            .values()
            .find(|r| r.intercept_id.as_deref() == Some(intercept_id))
            .map(|r| r.request_id.clone())
    }

    /// Whether `intercept_id` has already been offered credentials once
    /// (a second challenge means they were rejected).
    pub fn is_authenticated(&self, intercept_id: &str) -> bool {
        self.lock().authentications.contains(intercept_id)
    }

    /// Mark `intercept_id` as having been offered credentials.
    pub fn mark_authenticated(&self, intercept_id: &str) {
        self.lock().authentications.insert(intercept_id.to_string());
    }

    /// A snapshot of records matching `filter`.
    pub fn in_flight(&self, filter: impl Fn(&RequestRecord) -> bool) -> Vec<RequestRecord> {
        self.lock()
            .records
            .values()
            .filter(|r| filter(r))
            .cloned()
            .collect()
    }

    /// Number of records currently tracked, for diagnostics/tests.
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    /// Whether the registry currently holds no records.
    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }
}

#[cfg(test)]
mod tests;
