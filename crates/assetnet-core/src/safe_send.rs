//! Safe Send (spec §4.G): guards outbound protocol calls against
//! already-aborted `requestId`s.

use assetnet_cdp::CdpConnection;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::NetworkError;
use crate::registry::RequestRegistry;

/// Check whether `request_id` may still be sent for, without performing
/// the send. Split out from [`safe_send`] so the guard itself is testable
/// without a live `CdpConnection`.
fn check_not_aborted(registry: &RequestRegistry, request_id: &str) -> Result<(), NetworkError> {
    if registry.is_aborted(request_id) {
        return Err(NetworkError::InterceptIdInvalid(format!(
            "{request_id} is in the aborted set"
        )));
    }
    Ok(())
}

/// Send a CDP command that carries `request_id`, first checking the
/// Aborted set. If `request_id` is already aborted, returns
/// [`NetworkError::InterceptIdInvalid`] synchronously without sending
/// anything.
pub async fn safe_send<P, R>(
    connection: &CdpConnection,
    registry: &RequestRegistry,
    request_id: &str,
    method: &str,
    params: Option<P>,
    session_id: Option<&str>,
) -> Result<R, NetworkError>
where
    P: Serialize,
    R: DeserializeOwned,
{
    check_not_aborted(registry, request_id).inspect_err(|_| {
        tracing::debug!(request_id, method, "skipping send: requestId already aborted");
    })?;

    connection
        .send_command(method, params, session_id)
        .await
        .map_err(NetworkError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_aborted_request_passes_the_guard() {
        let registry = RequestRegistry::new();
        assert!(check_not_aborted(&registry, "r1").is_ok());
    }

    #[test]
    fn aborted_request_fails_the_guard() {
        let registry = RequestRegistry::new();
        registry.mark_aborted("r1");
        assert!(matches!(
            check_not_aborted(&registry, "r1"),
            Err(NetworkError::InterceptIdInvalid(_))
        ));
    }
}
