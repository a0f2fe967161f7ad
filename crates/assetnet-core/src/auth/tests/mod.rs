use assetnet_cdp::protocol::fetch::AuthChallengeResponseType;

use super::*;

fn creds() -> Credentials {
    Credentials {
        username: "alice".to_string(),
        password: "hunter2".to_string(),
    }
}

#[test]
fn offers_configured_credentials_on_first_challenge() {
    let response = decide(false, Some(&creds()));
    assert_eq!(response.response, AuthChallengeResponseType::ProvideCredentials);
    assert_eq!(response.username.as_deref(), Some("alice"));
    assert_eq!(response.password.as_deref(), Some("hunter2"));
}

#[test]
fn cancels_on_second_challenge_for_the_same_intercept_id() {
    let response = decide(true, Some(&creds()));
    assert_eq!(response.response, AuthChallengeResponseType::CancelAuth);
    assert!(response.username.is_none());
}

#[test]
fn defers_to_default_when_no_credentials_are_configured() {
    let response = decide(false, None);
    assert_eq!(response.response, AuthChallengeResponseType::Default);
}

#[test]
fn cancels_even_without_credentials_once_already_authenticated() {
    let response = decide(true, None);
    assert_eq!(response.response, AuthChallengeResponseType::CancelAuth);
}
