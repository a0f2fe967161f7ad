//! `Fetch.authRequired` handling (spec §4.C).
//!
//! A second challenge for the same `interceptId` means the credentials we
//! already offered were rejected; the only correct response at that point is
//! `CancelAuth`, or the browser will keep re-challenging forever.

use assetnet_cdp::CdpConnection;
use assetnet_cdp::protocol::fetch::{AuthChallengeResponse, ContinueWithAuthParams};

use crate::config::Credentials;
use crate::error::NetworkError;
use crate::registry::RequestRegistry;
use crate::safe_send::safe_send;

/// Decide how to answer an auth challenge for `intercept_id`. Pure, so the
/// decision itself is unit-testable without a connection.
fn decide(already_authenticated: bool, credentials: Option<&Credentials>) -> AuthChallengeResponse {
    if already_authenticated {
        return AuthChallengeResponse::cancel();
    }
    match credentials {
        Some(creds) => AuthChallengeResponse::provide_credentials(&creds.username, &creds.password),
        None => AuthChallengeResponse::default_response(),
    }
}

/// Respond to a `Fetch.authRequired` event for `intercept_id`, marking it
/// authenticated in the registry when credentials are offered.
pub async fn handle_auth_required(
    connection: &CdpConnection,
    registry: &RequestRegistry,
    credentials: Option<&Credentials>,
    session_id: Option<&str>,
    intercept_id: &str,
) -> Result<(), NetworkError> {
    let response = decide(registry.is_authenticated(intercept_id), credentials);

    if matches!(response.response, assetnet_cdp::protocol::fetch::AuthChallengeResponseType::ProvideCredentials) {
        registry.mark_authenticated(intercept_id);
    }

    let params = ContinueWithAuthParams {
        request_id: intercept_id.to_string(),
        auth_challenge_response: response,
    };

    // The Aborted set is keyed by the Network-domain requestId, not the
    // Fetch-domain interceptId `continueWithAuth` itself takes — resolve it
    // through the registry so the guard checks the right id.
    let request_id = registry
        .request_id_for_intercept(intercept_id)
        .unwrap_or_else(|| intercept_id.to_string());

    safe_send::<_, serde_json::Value>(
        connection,
        registry,
        &request_id,
        "Fetch.continueWithAuth",
        Some(params),
        session_id,
    )
    .await
    .map(|_| ())
}

#[cfg(test)]
mod tests;
