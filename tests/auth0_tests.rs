use std::path::PathBuf;

use chrono::{Duration, Utc};
use lexi::auth::credentials::Credentials;
use lexi::auth::{Auth0Auth, AuthAdapter, AuthError, CredentialStore, DeviceCode};
use serde_json::json;
use wiremock::{
    matchers::{body_string_contains, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn auth(server: &MockServer, store: CredentialStore) -> Auth0Auth {
    Auth0Auth::new(server.uri(), "client-1".to_string(), None, store)
}

fn device_code() -> DeviceCode {
    DeviceCode {
        device_code: "dev-1".into(),
        user_code: "ABCD-EFGH".into(),
        verification_uri: "https://tenant.example/activate".into(),
        verification_uri_complete: None,
        expires_in: 60,
        interval: 0,
    }
}

/// A credentials file path unique to one test.
fn scratch_credentials() -> PathBuf {
    std::env::temp_dir()
        .join(format!("lexi-test-{}", uuid::Uuid::new_v4()))
        .join("credentials.json")
}

async fn mount_userinfo(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"name": "Anna Kowalska", "email": "anna@example.pl"})),
        )
        .mount(server)
        .await;
}

// ============================================================================
// Device Login
// ============================================================================

#[tokio::test]
async fn test_start_login_returns_device_code() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/device/code"))
        .and(body_string_contains("client_id=client-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "device_code": "dev-1",
            "user_code": "ABCD-EFGH",
            "verification_uri": "https://tenant.example/activate",
            "verification_uri_complete": "https://tenant.example/activate?user_code=ABCD-EFGH",
            "expires_in": 900,
            "interval": 5
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth = auth(&mock_server, CredentialStore::in_memory());
    let code = auth.start_login().await.expect("device code");

    assert_eq!(code.user_code, "ABCD-EFGH");
    assert_eq!(code.url(), "https://tenant.example/activate?user_code=ABCD-EFGH");
    assert!(auth.state().is_loading);
    assert!(!auth.state().is_authenticated);
}

#[tokio::test]
async fn test_start_login_failure_clears_loading() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/device/code"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "unauthorized_client",
            "error_description": "Grant type not allowed"
        })))
        .mount(&mock_server)
        .await;

    let auth = auth(&mock_server, CredentialStore::in_memory());
    let err = auth.start_login().await.unwrap_err();

    assert_eq!(err, AuthError::Denied("Grant type not allowed".into()));
    assert!(!auth.state().is_loading);
}

#[tokio::test]
async fn test_complete_login_polls_until_approved() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"error": "authorization_pending"})),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "expires_in": 3600
        })))
        .mount(&mock_server)
        .await;
    mount_userinfo(&mock_server, "access-1").await;

    let auth = auth(&mock_server, CredentialStore::in_memory());
    let state = auth.complete_login(&device_code()).await.expect("login");

    assert!(state.is_authenticated);
    assert!(!state.is_loading);
    assert_eq!(
        state.user.as_ref().map(|p| p.display_name()),
        Some("Anna Kowalska")
    );
    assert_eq!(auth.access_token().await.as_deref(), Some("access-1"));
}

#[tokio::test]
async fn test_slow_down_backs_off_then_completes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({"error": "slow_down"})))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "expires_in": 3600
        })))
        .mount(&mock_server)
        .await;
    mount_userinfo(&mock_server, "access-1").await;

    let auth = auth(&mock_server, CredentialStore::in_memory());
    let started = std::time::Instant::now();
    let state = auth.complete_login(&device_code()).await.expect("login");

    assert!(state.is_authenticated);
    assert!(started.elapsed() >= std::time::Duration::from_secs(5));
    let requests = mock_server.received_requests().await.unwrap_or_default();
    let token_polls = requests
        .iter()
        .filter(|r| r.url.path() == "/oauth/token")
        .count();
    assert_eq!(token_polls, 2);
}

#[tokio::test]
async fn test_out_of_range_lifetimes_do_not_break_login() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "expires_in": i64::MAX
        })))
        .mount(&mock_server)
        .await;
    mount_userinfo(&mock_server, "access-1").await;

    let code = DeviceCode {
        expires_in: u64::MAX,
        ..device_code()
    };
    let auth = auth(&mock_server, CredentialStore::in_memory());
    let state = auth.complete_login(&code).await.expect("login");

    assert!(state.is_authenticated);
    assert_eq!(auth.access_token().await.as_deref(), Some("access-1"));
}

#[tokio::test]
async fn test_expired_device_code_fails_login() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "expired_token"})))
        .mount(&mock_server)
        .await;

    let auth = auth(&mock_server, CredentialStore::in_memory());
    let err = auth.complete_login(&device_code()).await.unwrap_err();

    assert_eq!(err, AuthError::Expired);
    assert!(!auth.state().is_authenticated);
    assert!(!auth.state().is_loading);
}

#[tokio::test]
async fn test_denied_login_reports_description() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": "access_denied",
            "error_description": "User cancelled"
        })))
        .mount(&mock_server)
        .await;

    let auth = auth(&mock_server, CredentialStore::in_memory());
    let err = auth.complete_login(&device_code()).await.unwrap_err();
    assert_eq!(err, AuthError::Denied("User cancelled".into()));
}

// ============================================================================
// Cached Sessions
// ============================================================================

#[tokio::test]
async fn test_expired_token_is_refreshed_and_saved() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-2",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let credentials_path = scratch_credentials();
    let store = CredentialStore::at(&credentials_path);
    store
        .save(&Credentials {
            access_token: "access-1".into(),
            refresh_token: Some("refresh-1".into()),
            expires_at: Utc::now() - Duration::minutes(5),
            profile: None,
        })
        .expect("seed credentials");

    let auth = auth(&mock_server, store.clone());
    assert!(auth.state().is_authenticated);
    assert_eq!(auth.access_token().await.as_deref(), Some("access-2"));

    let saved = store.load().expect("credentials persisted");
    assert_eq!(saved.access_token, "access-2");
    assert_eq!(saved.refresh_token.as_deref(), Some("refresh-1"));

    if let Some(dir) = credentials_path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}

#[tokio::test]
async fn test_rejected_refresh_signs_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Unknown or invalid refresh token."
        })))
        .mount(&mock_server)
        .await;

    let credentials_path = scratch_credentials();
    let store = CredentialStore::at(&credentials_path);
    store
        .save(&Credentials {
            access_token: "stale".into(),
            refresh_token: Some("revoked".into()),
            expires_at: Utc::now() - Duration::minutes(5),
            profile: None,
        })
        .expect("seed credentials");

    let auth = auth(&mock_server, store.clone());
    assert!(auth.state().is_authenticated);
    assert_eq!(auth.access_token().await, None);
    assert!(!auth.state().is_authenticated);
    assert!(store.load().is_none());

    if let Some(dir) = credentials_path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}

#[tokio::test]
async fn test_logout_forgets_cached_session() {
    let mock_server = MockServer::start().await;

    let credentials_path = scratch_credentials();
    let store = CredentialStore::at(&credentials_path);
    store
        .save(&Credentials {
            access_token: "access-1".into(),
            refresh_token: None,
            expires_at: Utc::now() + Duration::hours(1),
            profile: None,
        })
        .expect("seed credentials");

    let auth = auth(&mock_server, store.clone());
    assert_eq!(auth.access_token().await.as_deref(), Some("access-1"));

    auth.logout().await;

    assert!(!auth.state().is_authenticated);
    assert_eq!(auth.access_token().await, None);
    assert!(store.load().is_none());

    if let Some(dir) = credentials_path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}
