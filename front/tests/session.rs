mod common;

use std::sync::Arc;

use common::FakeTransport;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use taskdesk::{
    api::{ApiClient, Method, Reply},
    error::TodoError,
    notify::{Notice, RecordingNotifier},
    session::{Auth, MemoryTokenStore, Session},
};

struct Harness {
    transport: Arc<FakeTransport>,
    notifier: Arc<RecordingNotifier>,
    session: Arc<Session>,
    auth: Auth,
}

fn harness(token: Option<&str>) -> Harness {
    let transport = Arc::new(FakeTransport::default());
    let notifier = Arc::new(RecordingNotifier::new());
    let session = Arc::new(Session::new(MemoryTokenStore::new(token)));
    let client = ApiClient::new(transport.clone(), session.clone());

    Harness {
        transport: transport.clone(),
        notifier: notifier.clone(),
        session,
        auth: Auth::new(client, notifier),
    }
}

#[tokio::test]
async fn login_stores_token_and_user() {
    let h = harness(None);
    h.transport.route(
        Method::Post,
        "/login",
        Reply::new(
            200,
            json!({ "token": "jwt", "user": { "id": 1, "username": "ada", "email": "ada@example.com" } }),
        ),
    );

    let user = h.auth.login("ada@example.com", "pw").await.unwrap();

    assert_eq!(user.and_then(|u| u.username).as_deref(), Some("ada"));
    assert_eq!(h.session.token().await.as_deref(), Some("jwt"));

    let requests = h.transport.requests();
    assert_eq!(requests[0].token, None);
    assert_eq!(
        requests[0].body,
        Some(json!({ "email": "ada@example.com", "password": "pw" }))
    );
}

#[tokio::test]
async fn login_validates_before_network() {
    let h = harness(None);

    assert_eq!(
        h.auth.login("not-an-email", "pw").await,
        Err(TodoError::validation("Please enter your valid email."))
    );
    assert_eq!(
        h.auth.login("ada@example.com", "  ").await,
        Err(TodoError::validation("Please enter your password."))
    );
    assert!(h.transport.requests().is_empty());
    assert_eq!(h.notifier.notices().len(), 2);
}

#[tokio::test]
async fn bad_credentials_show_server_message() {
    let h = harness(None);
    h.transport.route(
        Method::Post,
        "/login",
        Reply::new(401, json!({ "message": "Bad credentials" })),
    );

    assert_eq!(
        h.auth.login("ada@example.com", "wrong").await,
        Err(TodoError::RequestFailed {
            message: "Bad credentials".into()
        })
    );
    assert_eq!(h.session.token().await, None);
    assert_eq!(
        h.notifier.notices(),
        [Notice::Error("Bad credentials".into())]
    );
}

#[tokio::test]
async fn login_without_token_in_reply_fails() {
    let h = harness(None);
    h.transport
        .route(Method::Post, "/login", Reply::new(200, json!({})));

    assert!(h.auth.login("ada@example.com", "pw").await.is_err());
    assert_eq!(h.session.token().await, None);
}

#[tokio::test]
async fn register_posts_account() {
    let h = harness(None);

    h.auth
        .register("Ada Lovelace", "ada@example.com", "pw")
        .await
        .unwrap();

    assert_eq!(
        h.transport.calls(),
        [(Method::Post, "/register".to_string())]
    );
    assert_eq!(
        h.transport.requests()[0].body,
        Some(json!({ "username": "Ada Lovelace", "email": "ada@example.com", "password": "pw" }))
    );
    // registering does not log in
    assert_eq!(h.session.token().await, None);
}

#[tokio::test]
async fn ensure_user_without_token_skips_profile() {
    let h = harness(None);

    assert_eq!(h.auth.ensure_user().await, Err(TodoError::AuthExpired));
    assert!(h.transport.requests().is_empty());
    assert!(h.notifier.notices().is_empty());
}

#[tokio::test]
async fn ensure_user_loads_profile_once() {
    let h = harness(Some("jwt"));
    h.transport.route(
        Method::Get,
        "/profile",
        Reply::new(200, json!({ "username": "ada", "email": "ada@example.com" })),
    );

    let first = h.auth.ensure_user().await.unwrap();
    let second = h.auth.ensure_user().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(h.transport.calls(), [(Method::Get, "/profile".to_string())]);
}

#[tokio::test]
async fn rejected_profile_clears_session() {
    let h = harness(Some("stale"));
    h.transport
        .route(Method::Get, "/profile", Reply::new(403, Value::Null));

    assert_eq!(h.auth.ensure_user().await, Err(TodoError::AuthExpired));
    assert_eq!(h.session.token().await, None);
    assert!(h.notifier.notices().is_empty());
}

#[tokio::test]
async fn logout_forgets_everything() {
    let h = harness(Some("jwt"));

    h.auth.logout().await;

    assert_eq!(h.session.token().await, None);
    assert_eq!(h.session.user().await, None);
    assert!(h.transport.requests().is_empty());
}
