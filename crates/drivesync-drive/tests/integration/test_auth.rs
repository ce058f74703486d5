//! Integration tests for the OAuth2 token endpoint exchanges
//!
//! Points the client registration at a wiremock token endpoint and checks
//! the code exchange and refresh requests and their decoding.

use drivesync_core::ports::IAuthenticator;
use drivesync_drive::auth::{ClientCredentials, GoogleAuthenticator, OAuth2Config, PKCEFlow};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> OAuth2Config {
    let credentials = ClientCredentials::parse(&format!(
        r#"{{
            "installed": {{
                "client_id": "test-client.apps.googleusercontent.com",
                "client_secret": "test-secret",
                "auth_uri": "{uri}/auth",
                "token_uri": "{uri}/token"
            }}
        }}"#,
        uri = server.uri()
    ))
    .expect("valid client secret");
    OAuth2Config::new(credentials).with_open_browser(false)
}

#[tokio::test]
async fn test_refresh_token_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=1%2F%2Fstored-refresh"))
        .and(body_string_contains("client_secret=test-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "ya29.refreshed",
            "expires_in": 3599,
            "scope": "https://www.googleapis.com/auth/drive.readonly",
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let authenticator = GoogleAuthenticator::new(config_for(&server));
    let tokens = authenticator
        .refresh("1//stored-refresh")
        .await
        .expect("refresh failed");

    assert_eq!(tokens.access_token, "ya29.refreshed");
    assert!(tokens.refresh_token.is_none());
    assert!(tokens.is_valid());
}

#[tokio::test]
async fn test_refresh_rejected_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Token has been expired or revoked."
        })))
        .mount(&server)
        .await;

    let authenticator = GoogleAuthenticator::new(config_for(&server));
    let err = authenticator.refresh("1//revoked").await.unwrap_err();

    assert!(format!("{err:#}").contains("Failed to refresh token"));
}

#[tokio::test]
async fn test_authorization_code_exchange_sends_verifier() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=4%2F0-auth-code"))
        .and(body_string_contains("code_verifier="))
        .and(body_string_contains("redirect_uri="))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "ya29.fresh",
            "refresh_token": "1//fresh-refresh",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let flow = PKCEFlow::new(&config, Some("http://127.0.0.1:40123/")).unwrap();
    let (auth_url, _csrf, verifier) = flow.generate_auth_url();
    assert!(auth_url.starts_with(&format!("{}/auth", server.uri())));

    let tokens = flow
        .exchange_code("4/0-auth-code".to_string(), verifier)
        .await
        .expect("code exchange failed");

    assert_eq!(tokens.access_token, "ya29.fresh");
    assert_eq!(tokens.refresh_token.as_deref(), Some("1//fresh-refresh"));
    assert!(tokens.can_refresh());
}
