//! Response Capturer (spec §4.E).
//!
//! Runs when a request reaches `Network.loadingFinished`. Turns a finished
//! response into a [`CapturedResource`] and hands it to the resource cache,
//! subject to six ordered capture filters.

use std::collections::HashMap;

use crate::config::WatchOptions;
use crate::types::{CapturedResource, RequestRecord, matches_any};

/// Maximum captured body size, per spec §4.E filter 4.
const MAX_CAPTURE_BYTES: usize = 25 * 1024 * 1024;

/// HTTP statuses eligible for capture, per spec §4.E filter 5.
const CAPTURABLE_STATUSES: [u16; 7] = [200, 201, 301, 302, 304, 307, 308];

/// Why a capture was skipped. Exposed for logging/tests; never propagated as
/// an error (capture failures never fail the page).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipReason {
    NoResponse,
    HostnameNotAllowed,
    EmptyBody,
    TooLarge,
    StatusNotCapturable,
    ResourceTypeNotCapturable,
}

fn check_filters(
    record: &RequestRecord,
    body_len: usize,
    hostname_allowed: bool,
    enable_javascript: bool,
) -> Result<(), SkipReason> {
    let response = record.response.as_ref().ok_or(SkipReason::NoResponse)?;

    if !hostname_allowed {
        return Err(SkipReason::HostnameNotAllowed);
    }
    if body_len == 0 {
        return Err(SkipReason::EmptyBody);
    }
    if body_len > MAX_CAPTURE_BYTES {
        return Err(SkipReason::TooLarge);
    }
    if !CAPTURABLE_STATUSES.contains(&response.status) {
        return Err(SkipReason::StatusNotCapturable);
    }
    if !(enable_javascript || record.resource_type.capturable_without_javascript()) {
        return Err(SkipReason::ResourceTypeNotCapturable);
    }

    Ok(())
}

/// Refine the effective MIME type: when the browser reports `text/plain`,
/// prefer a MIME inferred from the URL's path (stripped of its query
/// string), if one can be inferred.
fn refine_mime_type(url: &str, reported: &str, options: &WatchOptions) -> String {
    if reported != "text/plain" {
        return reported.to_string();
    }
    let path = url::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());

    options
        .intercept
        .infer_mime(&path)
        .unwrap_or_else(|| reported.to_string())
}

/// Split each header's folded-newline value into a list, per spec §4.E's
/// `createResource` contract.
fn split_headers(headers: &HashMap<String, String>) -> HashMap<String, Vec<String>> {
    headers
        .iter()
        .map(|(name, value)| (name.clone(), value.split('\n').map(str::to_string).collect()))
        .collect()
}

/// Re-fetch a font body directly over HTTP, bypassing whatever
/// decode/transcode the browser may have applied. Injects Basic auth if
/// credentials are configured.
async fn refetch_font_body(url: &str, options: &WatchOptions) -> Result<Vec<u8>, reqwest::Error> {
    let client = reqwest::Client::new();
    let mut request = client.get(url);
    if let Some(creds) = &options.authorization {
        request = request.basic_auth(&creds.username, Some(&creds.password));
    }
    let response = request.send().await?;
    let bytes = response.bytes().await?;
    Ok(bytes.to_vec())
}

/// Capture `record`'s finished response, if it passes the capture filters
/// and the cache doesn't already hold an equivalent entry.
///
/// Errors are logged at `debug!` and swallowed: a failed capture never
/// fails the page.
pub async fn capture(record: &RequestRecord, options: &WatchOptions) {
    let request_id = record.request_id.as_str();
    let origin_url = record.origin_url();

    let normalized = options.intercept.normalize_url(origin_url);
    if let Some(existing) = options.intercept.get_resource(&normalized).await {
        let should_skip = existing.root || existing.provided || options.intercept.disable_cache();
        if should_skip {
            tracing::debug!(request_id, url = origin_url, "capture skipped: already cached");
            return;
        }
    }

    let Some(response) = &record.response else {
        tracing::debug!(request_id, "capture skipped: no response attached");
        return;
    };

    let hostname_allowed = url::Url::parse(&record.url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .is_some_and(|host| matches_any(options.intercept.allowed_hostnames(), &host));

    let body = match response.buffer.buffer().await {
        Ok(body) => body,
        Err(err) => {
            tracing::debug!(request_id, error = %err, "capture skipped: body fetch failed");
            return;
        }
    };

    if let Err(reason) = check_filters(record, body.len(), hostname_allowed, options.intercept.enable_javascript()) {
        tracing::debug!(request_id, ?reason, "capture skipped by filter");
        return;
    }

    let effective_mime = refine_mime_type(&record.url, &response.mime_type, options);

    let body = if effective_mime.contains("font") {
        match refetch_font_body(&record.url, options).await {
            Ok(refetched) => refetched,
            Err(err) => {
                tracing::debug!(request_id, error = %err, "font re-fetch failed, keeping browser-provided body");
                body
            }
        }
    } else {
        body
    };

    let resource = CapturedResource {
        url: origin_url.to_string(),
        content: body,
        mimetype: effective_mime,
        status: response.status,
        headers: split_headers(&response.headers),
    };

    options.intercept.save_resource(resource).await;
}

#[cfg(test)]
mod tests;
