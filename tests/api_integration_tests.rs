use serde_json::json;
use supportchat::api::{ApiError, ChatApi, HttpApi, Message};
use supportchat::core::account::{self, AccountError};
use supportchat::core::auth::{AuthContext, AuthStatus};
use supportchat::core::session_store::SessionStore;
use supportchat::core::thread::{ChatThread, SEND_FAILED};
use supportchat::core::validation::EmailPolicy;
use tokio_test::{assert_err, assert_ok};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, body_string_contains, header, method, path},
};

// ============================================================================
// Helper Functions
// ============================================================================

const TOKEN: &str = "tok-123";

/// An API client already holding a bearer token.
fn signed_in(server: &MockServer) -> (HttpApi, AuthContext) {
    let auth = AuthContext::in_memory();
    auth.set(TOKEN.to_string());
    (HttpApi::new(server.uri(), auth.clone()), auth)
}

fn thread_body(messages: &[(&str, &str)]) -> serde_json::Value {
    let messages: Vec<_> = messages
        .iter()
        .map(|(role, message)| json!({ "role": role, "message": message }))
        .collect();
    json!({ "messages": messages })
}

// ============================================================================
// Login / Register
// ============================================================================

#[tokio::test]
async fn test_login_posts_form_and_returns_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("username=ana%40binus.ac.id"))
        .and(body_string_contains("password=Secret1%21"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": TOKEN, "token_type": "bearer" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpApi::new(server.uri(), AuthContext::in_memory());
    let token = assert_ok!(api.login("ana@binus.ac.id", "Secret1!").await);
    assert_eq!(token, TOKEN);
}

#[tokio::test]
async fn test_account_login_stores_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": TOKEN })))
        .mount(&server)
        .await;

    let auth = AuthContext::in_memory();
    let api = HttpApi::new(server.uri(), auth.clone());
    assert_ok!(
        account::login(&api, &auth, &EmailPolicy::default(), " ana@binus.ac.id ", "pw").await
    );
    assert_eq!(auth.token().as_deref(), Some(TOKEN));
    assert_eq!(auth.status(), AuthStatus::SignedIn);
}

#[tokio::test]
async fn test_rejected_login_is_not_auth_loss() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "detail": "Incorrect username or password" })),
        )
        .mount(&server)
        .await;

    let auth = AuthContext::in_memory();
    let api = HttpApi::new(server.uri(), auth.clone());
    let err = assert_err!(
        account::login(&api, &auth, &EmailPolicy::default(), "ana@binus.ac.id", "bad").await
    );
    assert_eq!(err, AccountError::InvalidCredentials);
    assert_eq!(auth.status(), AuthStatus::SignedOut);
}

#[tokio::test]
async fn test_register_posts_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .and(body_json(json!({ "username": "ana@binus.ac.id", "password": "Secret1!" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "message": "User created", "username": "ana@binus.ac.id" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpApi::new(server.uri(), AuthContext::in_memory());
    let user = assert_ok!(api.register("ana@binus.ac.id", "Secret1!").await);
    assert_eq!(user.username.as_deref(), Some("ana@binus.ac.id"));
}

#[tokio::test]
async fn test_register_conflict_maps_to_registration_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "detail": "Username already registered" })),
        )
        .mount(&server)
        .await;

    let api = HttpApi::new(server.uri(), AuthContext::in_memory());
    let err = assert_err!(
        account::register(&api, &EmailPolicy::default(), "ana@binus.ac.id", "Secret1!").await
    );
    assert_eq!(err, AccountError::RegistrationFailed);
}

// ============================================================================
// Bearer calls
// ============================================================================

#[tokio::test]
async fn test_bearer_header_attached_to_session_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sessions"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "session_id": "s1", "topic": "Tuition" },
            { "session_id": "s2" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (api, _auth) = signed_in(&server);
    let mut store = SessionStore::new();
    assert_ok!(store.load(&api).await);
    assert_eq!(store.len(), 2);
    assert_eq!(store.sessions()[0].display_topic(), "Tuition");
    assert_eq!(store.sessions()[1].display_topic(), "Untitled Session");
}

#[tokio::test]
async fn test_no_token_omits_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let api = HttpApi::new(server.uri(), AuthContext::in_memory());
    assert_ok!(api.list_sessions().await);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_create_and_delete_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .and(body_json(json!({ "topic": "Library" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "session_id": "new-1", "topic": "Library" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/session/new-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "deleted" })))
        .expect(1)
        .mount(&server)
        .await;

    let (api, _auth) = signed_in(&server);
    let mut store = SessionStore::new();
    let session = assert_ok!(store.create(&api, "Library").await);
    assert_eq!(session.session_id, "new-1");
    assert_eq!(store.len(), 1);

    assert_ok!(store.delete(&api, "new-1").await);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_error_detail_mapped() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/session/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Session not found" })))
        .mount(&server)
        .await;

    let (api, auth) = signed_in(&server);
    let err = assert_err!(api.delete_session("missing").await);
    assert_eq!(
        err,
        ApiError::Api {
            status: 404,
            message: "Session not found".to_string()
        }
    );
    assert_eq!(auth.status(), AuthStatus::SignedIn);
}

#[tokio::test]
async fn test_undecodable_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let (api, _auth) = signed_in(&server);
    let err = assert_err!(api.list_sessions().await);
    assert!(matches!(err, ApiError::Parse(_)));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    // Bind then release a port so nothing is listening on it.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let api = HttpApi::new(format!("http://127.0.0.1:{port}"), AuthContext::in_memory());
    let err = assert_err!(api.list_sessions().await);
    assert!(matches!(err, ApiError::Network(_)));
}

// ============================================================================
// 401 handling
// ============================================================================

#[tokio::test]
async fn test_unauthorized_expires_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/s1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "Could not validate credentials" })))
        .mount(&server)
        .await;

    let (api, auth) = signed_in(&server);
    let mut status = auth.subscribe();

    let err = assert_err!(api.send_message("s1", "hi").await);
    assert_eq!(err, ApiError::Unauthorized);
    assert_eq!(auth.token(), None);
    assert_eq!(auth.status(), AuthStatus::Expired);
    assert!(status.has_changed().unwrap());
}

#[tokio::test]
async fn test_every_bearer_call_shares_the_401_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history/s1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (api, auth) = signed_in(&server);
    let mut store = SessionStore::new();
    let mut thread = ChatThread::new("s1");
    let err = assert_err!(thread.load_history(&api).await);
    assert_eq!(err, ApiError::Unauthorized);
    assert_eq!(auth.status(), AuthStatus::Expired);

    // Already expired: no token is sent and the second 401 keeps the same state.
    Mock::given(method("GET"))
        .and(path("/sessions"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    assert_err!(store.load(&api).await);
    assert_eq!(auth.status(), AuthStatus::Expired);
}

// ============================================================================
// Thread over HTTP
// ============================================================================

#[tokio::test]
async fn test_history_without_messages_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "session_id": "s1" })))
        .mount(&server)
        .await;

    let (api, _auth) = signed_in(&server);
    let messages = assert_ok!(api.history("s1").await);
    assert!(messages.is_empty());
}

#[tokio::test]
async fn test_send_replaces_thread_with_server_copy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/s1"))
        .and(body_json(json!({ "user_input": "When is the deadline?" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(thread_body(&[
            ("user", "When is the deadline?"),
            ("assistant", "Friday."),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (api, _auth) = signed_in(&server);
    let mut thread = ChatThread::new("s1");
    assert_ok!(thread.submit(&api, "  When is the deadline?  ").await);
    assert_eq!(
        thread.messages(),
        &[
            Message::user("When is the deadline?"),
            Message::assistant("Friday.")
        ]
    );
    assert!(!thread.is_pending());
}

#[tokio::test]
async fn test_edit_last_goes_to_edit_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(thread_body(&[
            ("user", "A"),
            ("assistant", "B"),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/s1/edit_last"))
        .and(body_json(json!({ "user_input": "A2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(thread_body(&[
            ("user", "A2"),
            ("assistant", "B2"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (api, _auth) = signed_in(&server);
    let mut thread = ChatThread::new("s1");
    assert_ok!(thread.load_history(&api).await);
    assert_eq!(thread.start_edit().as_deref(), Some("A"));
    assert_ok!(thread.submit(&api, "A2").await);
    assert_eq!(
        thread.messages(),
        &[Message::user("A2"), Message::assistant("B2")]
    );
    assert!(!thread.is_editing());
}

#[tokio::test]
async fn test_failed_send_leaves_failure_marker() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/s1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let (api, auth) = signed_in(&server);
    let mut thread = ChatThread::new("s1");
    let err = assert_err!(thread.submit(&api, "hi").await);
    assert_eq!(
        err,
        ApiError::Api {
            status: 500,
            message: "boom".to_string()
        }
    );
    assert_eq!(
        thread.messages(),
        &[Message::user("hi"), Message::assistant(SEND_FAILED)]
    );
    assert!(!thread.is_pending());
    assert!(auth.is_authenticated());
}
