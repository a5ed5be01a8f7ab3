use api_lib::adapters::FirebaseIdentityAdapter;
use authenticity_core::{AuthErrorCode, IdentityProvider, IdentityUser};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-key";

fn adapter(server: &MockServer) -> FirebaseIdentityAdapter {
    FirebaseIdentityAdapter::new(reqwest::Client::new(), server.uri(), API_KEY)
}

fn lookup_reply(verified: bool) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "users": [{
            "localId": "uid-1",
            "email": "ada@example.com",
            "displayName": "Ada",
            "emailVerified": verified
        }]
    }))
}

fn error_reply(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_json(json!({
        "error": { "code": 400, "message": message, "errors": [] }
    }))
}

fn signed_in_user() -> IdentityUser {
    IdentityUser {
        uid: "uid-1".to_string(),
        email: "ada@example.com".to_string(),
        display_name: Some("Ada".to_string()),
        email_verified: false,
        id_token: "token-1".to_string(),
    }
}

#[tokio::test]
async fn sign_in_reads_verification_flag_from_lookup() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .and(query_param("key", API_KEY))
        .and(body_partial_json(json!({
            "email": "ada@example.com",
            "password": "secret123",
            "returnSecureToken": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "localId": "uid-1",
            "email": "ada@example.com",
            "idToken": "token-1",
            "registered": true
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:lookup"))
        .and(body_partial_json(json!({ "idToken": "token-1" })))
        .respond_with(lookup_reply(true))
        .expect(1)
        .mount(&server)
        .await;

    let user = adapter(&server)
        .sign_in("ada@example.com", "secret123")
        .await
        .expect("sign in should succeed");

    assert_eq!(user.uid, "uid-1");
    assert_eq!(user.display_name.as_deref(), Some("Ada"));
    assert!(user.email_verified);
    assert_eq!(user.id_token, "token-1");
}

#[tokio::test]
async fn sign_up_sets_display_name_and_starts_unverified() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:signUp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "localId": "uid-2",
            "email": "new@example.com",
            "idToken": "token-2"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:update"))
        .and(body_partial_json(json!({ "idToken": "token-2", "displayName": "Grace" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "localId": "uid-2",
            "email": "new@example.com",
            "displayName": "Grace"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let user = adapter(&server)
        .sign_up("new@example.com", "secret123", "Grace")
        .await
        .expect("sign up should succeed");

    assert_eq!(user.uid, "uid-2");
    assert_eq!(user.email, "new@example.com");
    assert_eq!(user.display_name.as_deref(), Some("Grace"));
    assert!(!user.email_verified);
    assert_eq!(user.id_token, "token-2");
}

#[tokio::test]
async fn provider_errors_map_to_codes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(error_reply("INVALID_LOGIN_CREDENTIALS"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signUp"))
        .respond_with(error_reply(
            "WEAK_PASSWORD : Password should be at least 6 characters",
        ))
        .mount(&server)
        .await;

    let identity = adapter(&server);

    let err = identity.sign_in("ada@example.com", "nope").await.unwrap_err();
    assert_eq!(err.code, AuthErrorCode::InvalidCredentials);
    assert_eq!(err.to_string(), "Invalid email or password.");

    let err = identity
        .sign_up("ada@example.com", "123", "Ada")
        .await
        .unwrap_err();
    assert_eq!(err.code, AuthErrorCode::WeakPassword);
}

#[tokio::test]
async fn oob_requests_carry_the_right_request_type() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:sendOobCode"))
        .and(body_partial_json(json!({
            "requestType": "PASSWORD_RESET",
            "email": "ada@example.com"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "email": "ada@example.com" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:sendOobCode"))
        .and(body_partial_json(json!({
            "requestType": "VERIFY_EMAIL",
            "idToken": "token-1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "email": "ada@example.com" })))
        .expect(1)
        .mount(&server)
        .await;

    let identity = adapter(&server);
    identity
        .send_password_reset("ada@example.com")
        .await
        .expect("reset email should be sent");
    identity
        .send_email_verification(&signed_in_user())
        .await
        .expect("verification email should be sent");
}

#[tokio::test]
async fn reload_picks_up_completed_verification() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:lookup"))
        .respond_with(lookup_reply(true))
        .mount(&server)
        .await;

    let refreshed = adapter(&server)
        .reload(&signed_in_user())
        .await
        .expect("reload should succeed");
    assert!(refreshed.email_verified);
    assert_eq!(refreshed.id_token, "token-1");
}

#[tokio::test]
async fn unreachable_provider_is_a_network_error() {
    // Reserve a port, then free it so nothing is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let identity = FirebaseIdentityAdapter::new(reqwest::Client::new(), uri, API_KEY);
    let err = identity
        .send_password_reset("ada@example.com")
        .await
        .unwrap_err();
    assert_eq!(err.code, AuthErrorCode::NetworkRequestFailed);
}
