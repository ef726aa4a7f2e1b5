use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::json;

use gadget_chat::AppState;
use gadget_chat::auth::{AllowList, AuthStore};
use gadget_chat::chat::ChatSession;
use gadget_chat::config::{AppConfig, AuthConfig, ResilienceConfig, ServerConfig};
use gadget_chat::llm::{FALLBACK_REPLY, GenerationClient, GenerationError, Generator};
use gadget_chat::server::build_router;

/// Stub driver replying with a fixed string.
struct Stub(&'static str);

#[async_trait::async_trait]
impl Generator for Stub {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Ok(self.0.to_string())
    }
}

/// Driver that always fails, to exercise the fallback path.
struct Failing;

#[async_trait::async_trait]
impl Generator for Failing {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::MalformedResponse)
    }
}

fn test_config(store_path: &std::path::Path) -> Arc<AppConfig> {
    Arc::new(AppConfig {
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
        },
        auth: AuthConfig {
            store_path: store_path.display().to_string(),
        },
        resilience: ResilienceConfig {
            timeout_disabled: false,
        },
    })
}

/// Build a server over a fresh store file and the given driver.
fn test_server(dir: &tempfile::TempDir, driver: impl Generator + 'static) -> TestServer {
    let store_path = dir.path().join("user.json");
    let auth = AuthStore::new(Box::new(AllowList::builtin()), &store_path);
    auth.restore();

    let chat = ChatSession::new(GenerationClient::new(Arc::new(driver)));
    let state = AppState {
        auth,
        chat,
        config: test_config(&store_path),
    };

    TestServer::new(build_router(state)).expect("failed to build test server")
}

async fn login(server: &TestServer) {
    let res = server
        .post("/api/login")
        .json(&json!({ "email": "anugrah@email.com", "password": "1234" }))
        .await;
    res.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_chat_redirects_without_user() {
    let dir = tempfile::tempdir().unwrap();
    let server = test_server(&dir, Stub("hi"));

    let res = server.get("/chat").await;
    res.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(res.header("location"), "/login?from=/chat");

    // API surface is guarded the same way.
    let res = server.get("/api/chat/messages").await;
    res.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(res.header("location"), "/login?from=/api/chat/messages");
}

#[tokio::test]
async fn test_guard_preserves_query_in_redirect() {
    let dir = tempfile::tempdir().unwrap();
    let server = test_server(&dir, Stub("hi"));

    let res = server.get("/chat").add_query_param("topic", "laptops").await;
    res.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(res.header("location"), "/login?from=/chat?topic=laptops");
}

#[tokio::test]
async fn test_guard_waits_for_restore() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("user.json");

    // No restore() call: the store is still in its restoring state.
    let auth = AuthStore::new(Box::new(AllowList::builtin()), &store_path);
    let chat = ChatSession::new(GenerationClient::new(Arc::new(Stub("hi"))));
    let state = AppState {
        auth,
        chat,
        config: test_config(&store_path),
    };
    let server = TestServer::new(build_router(state)).unwrap();

    let res = server.get("/chat").await;
    res.assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_login_rejects_unknown_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let server = test_server(&dir, Stub("hi"));

    let res = server
        .post("/api/login")
        .json(&json!({ "email": "anugrah@email.com", "password": "wrong" }))
        .await;
    res.assert_status(StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = res.json();
    assert_eq!(body["error"], "invalid email or password");
}

#[tokio::test]
async fn test_login_unlocks_chat_page() {
    let dir = tempfile::tempdir().unwrap();
    let server = test_server(&dir, Stub("hi"));

    let res = server
        .post("/api/login")
        .json(&json!({ "email": "kunal@email.com", "password": "1234" }))
        .await;
    res.assert_status(StatusCode::OK);
    let user: serde_json::Value = res.json();
    assert_eq!(user["id"], "2");
    assert_eq!(user["name"], "Kunal");

    let res = server.get("/chat").await;
    res.assert_status(StatusCode::OK);
    assert!(res.text().contains("Signed in as Kunal"));
}

#[tokio::test]
async fn test_login_persists_user_blob() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("user.json");

    {
        let auth = AuthStore::new(Box::new(AllowList::builtin()), &store_path);
        auth.restore();
        let chat = ChatSession::new(GenerationClient::new(Arc::new(Stub("hi"))));
        let state = AppState {
            auth,
            chat,
            config: test_config(&store_path),
        };
        let server = TestServer::new(build_router(state)).unwrap();
        login(&server).await;
    }

    // A second server over the same store file restores the session,
    // so the chat page renders without a fresh login.
    let auth = AuthStore::new(Box::new(AllowList::builtin()), &store_path);
    auth.restore();
    let chat = ChatSession::new(GenerationClient::new(Arc::new(Stub("hi"))));
    let state = AppState {
        auth,
        chat,
        config: test_config(&store_path),
    };
    let server = TestServer::new(build_router(state)).unwrap();

    let res = server.get("/chat").await;
    res.assert_status(StatusCode::OK);
    assert!(res.text().contains("Signed in as Anugrah"));
}

#[tokio::test]
async fn test_logout_locks_chat_again() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("user.json");
    let server = test_server(&dir, Stub("hi"));

    login(&server).await;
    assert!(store_path.exists());

    let res = server.post("/api/logout").await;
    res.assert_status(StatusCode::NO_CONTENT);
    assert!(!store_path.exists());

    let res = server.get("/chat").await;
    res.assert_status(StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_chat_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let server = test_server(&dir, Stub("hi"));
    login(&server).await;

    let res = server
        .post("/api/chat")
        .json(&json!({ "message": "hello" }))
        .await;
    res.assert_status(StatusCode::OK);

    let body: serde_json::Value = res.json();
    assert_eq!(body["outcome"], "replied");
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "hello");
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["content"], "hi");
}

#[tokio::test]
async fn test_blank_message_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let server = test_server(&dir, Stub("hi"));
    login(&server).await;

    let res = server
        .post("/api/chat")
        .json(&json!({ "message": "   " }))
        .await;
    res.assert_status(StatusCode::OK);

    let body: serde_json::Value = res.json();
    assert_eq!(body["outcome"], "ignored");
    assert!(body["messages"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_clear_empties_transcript() {
    let dir = tempfile::tempdir().unwrap();
    let server = test_server(&dir, Stub("hi"));
    login(&server).await;

    server
        .post("/api/chat")
        .json(&json!({ "message": "hello" }))
        .await;

    let res = server.post("/api/chat/clear").await;
    res.assert_status(StatusCode::NO_CONTENT);

    let res = server.get("/api/chat/messages").await;
    res.assert_status(StatusCode::OK);
    let messages: serde_json::Value = res.json();
    assert!(messages.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_generation_failure_yields_apology() {
    let dir = tempfile::tempdir().unwrap();
    let server = test_server(&dir, Failing);
    login(&server).await;

    let res = server
        .post("/api/chat")
        .json(&json!({ "message": "hello" }))
        .await;
    res.assert_status(StatusCode::OK);

    let body: serde_json::Value = res.json();
    assert_eq!(body["outcome"], "replied");
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages[1]["content"], FALLBACK_REPLY);
}

#[tokio::test]
async fn test_unknown_route_redirects_home() {
    let dir = tempfile::tempdir().unwrap();
    let server = test_server(&dir, Stub("hi"));

    let res = server.get("/no-such-page").await;
    res.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(res.header("location"), "/");
}
