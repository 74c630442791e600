//! End-to-end exercises of the webhook and authorization endpoints against a
//! mocked platform and chat-completions provider.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::util::ServiceExt;
use wiremock::matchers::{bearer_token, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use voxhook::config::ServerConfig;
use voxhook::core::conversation::{Message, Role};
use voxhook::core::llm::LlmClient;
use voxhook::middleware::{SIGNATURE_HEADER, sign};
use voxhook::routes::create_api_router;
use voxhook::state::AppState;
use voxhook::store::ConversationStore;

const SECRET: &str = "whsec_integration_test";
const PLATFORM_KEY: &str = "lk_test_key";
const LLM_KEY: &str = "sk-test-key";

fn test_config(platform_url: &str, llm_base_url: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        tls: None,
        webhook_secret: Some(SECRET.to_string()),
        platform_api_key: Some(PLATFORM_KEY.to_string()),
        platform_url: platform_url.to_string(),
        llm_api_key: Some(LLM_KEY.to_string()),
        llm_base_url: llm_base_url.to_string(),
        llm_model: "gpt-4o-mini".to_string(),
        redis_url: None,
        persona: "You are a test assistant.".to_string(),
        welcome_message: "Hey! How can I help you today?".to_string(),
        knowledge_base_path: None,
        cors_allowed_origins: None,
    }
}

/// Build the app router plus a handle on its store for assertions.
fn test_app(platform_url: &str, llm_base_url: &str) -> (Router, ConversationStore) {
    let config = test_config(platform_url, llm_base_url);
    let store = ConversationStore::in_memory();
    let llm = LlmClient::new(
        config.llm_base_url.clone(),
        config.llm_api_key.clone(),
        config.llm_model.clone(),
    )
    .unwrap();

    let state = Arc::new(AppState {
        store: store.clone(),
        llm,
        http_client: reqwest::Client::new(),
        system_prompt: config.persona.clone(),
        config,
    });

    (create_api_router().with_state(state), store)
}

fn signed_webhook_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/agent")
        .header(header::CONTENT_TYPE, "application/json")
        .header(SIGNATURE_HEADER, sign(SECRET, body.as_bytes()))
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn texts(log: &[Message]) -> Vec<(Role, String)> {
    log.iter().map(|m| (m.role, m.text())).collect()
}

#[tokio::test]
async fn test_bad_signature_is_rejected_without_side_effects() {
    let (app, store) = test_app("http://unused", "http://unused");

    let body = r#"{"type":"message","conversation_id":"c1","turn_id":"t1","text":"hi"}"#;
    let request = Request::builder()
        .method("POST")
        .uri("/agent")
        .header(SIGNATURE_HEADER, "deadbeef")
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(store.get("c1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_signature_is_rejected() {
    let (app, _store) = test_app("http://unused", "http://unused");

    let request = Request::builder()
        .method("POST")
        .uri("/agent")
        .body(Body::from(r#"{"type":"message"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_event_type_is_bad_request() {
    let (app, store) = test_app("http://unused", "http://unused");

    let body = r#"{"type":"session.pause","conversation_id":"c1","turn_id":"t1"}"#;
    let response = app.oneshot(signed_webhook_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(store.get("c1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_session_start_resets_history_and_speaks_welcome() {
    let (app, store) = test_app("http://unused", "http://unused");

    // Stale history from a previous session under the same conversation id.
    store
        .append(
            "c1",
            &[
                Message::user("c1", "old-1", "old question"),
                Message::assistant("c1", "old answer"),
                Message::user("c1", "old-2", "another"),
            ],
        )
        .await
        .unwrap();

    let body = r#"{"type":"session.start","conversation_id":"c1","turn_id":"t1"}"#;
    let response = app.oneshot(signed_webhook_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );

    let stream = body_text(response).await;
    assert!(stream.contains("response.tts"));
    assert!(stream.contains("Hey! How can I help you today?"));
    assert!(stream.contains("response.end"));

    // Old history is gone; the log holds the connection marker plus the
    // welcome message.
    let log = store.get("c1").await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].role, Role::User);
    assert_eq!(log[1].role, Role::Assistant);
    assert_eq!(log[1].text(), "Hey! How can I help you today?");
}

#[tokio::test]
async fn test_message_event_streams_reply_and_records_turn() {
    let llm = MockServer::start().await;
    let sse = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\" there!\"}}]}\n\n",
        "data: [DONE]\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(bearer_token(LLM_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
        .mount(&llm)
        .await;

    let (app, store) = test_app("http://unused", &llm.uri());

    let body = r#"{"type":"message","conversation_id":"c1","turn_id":"t1","text":"Say hi"}"#;
    let response = app.oneshot(signed_webhook_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stream = body_text(response).await;
    assert!(stream.contains("\"content\":\"Hello\""));
    assert!(stream.contains("\"content\":\" there!\""));
    assert!(stream.contains("response.end"));

    let log = store.get("c1").await.unwrap();
    assert_eq!(
        texts(&log),
        [
            (Role::User, "Say hi".to_string()),
            (Role::Assistant, "Hello there!".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_exhausted_balance_maps_to_payment_required() {
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"message": "insufficient_balance: account has no credit"}
        })))
        .mount(&llm)
        .await;

    let (app, _store) = test_app("http://unused", &llm.uri());

    let body = r#"{"type":"message","conversation_id":"c1","turn_id":"t1","text":"hi"}"#;
    let response = app.oneshot(signed_webhook_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

    let error: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(error["error"].as_str().unwrap().contains("insufficient_balance"));
}

#[tokio::test]
async fn test_session_end_is_acknowledged_and_logged() {
    let (app, store) = test_app("http://unused", "http://unused");

    let body = r#"{"type":"session.end","conversation_id":"c1","turn_id":"t9","text":""}"#;
    let response = app.oneshot(signed_webhook_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The turn marker is still appended for uniform ordering.
    let log = store.get("c1").await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].id, "t9");
}

#[tokio::test]
async fn test_authorize_requires_agent_id() {
    let (app, _store) = test_app("http://unused", "http://unused");

    let request = Request::builder()
        .method("POST")
        .uri("/authorize")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"metadata":{}}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_authorize_relays_platform_response_verbatim() {
    let platform = MockServer::start().await;
    let token_body = json!({
        "client_session_key": "sk_session_abc",
        "conversation_id": "c1"
    });
    Mock::given(method("POST"))
        .and(path("/v1/agents/web/authorize_session"))
        .and(bearer_token(PLATFORM_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body.clone()))
        .mount(&platform)
        .await;

    let (app, _store) = test_app(&platform.uri(), "http://unused");

    let request = Request::builder()
        .method("POST")
        .uri("/authorize")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"agent_id":"ag-123"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );

    let relayed: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(relayed, token_body);
}

#[tokio::test]
async fn test_authorize_surfaces_platform_balance_errors() {
    let platform = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/agents/web/authorize_session"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({
            "error": "insufficient_balance"
        })))
        .mount(&platform)
        .await;

    let (app, _store) = test_app(&platform.uri(), "http://unused");

    let request = Request::builder()
        .method("POST")
        .uri("/authorize")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"agent_id":"ag-123"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn test_health_check_is_open() {
    let (app, _store) = test_app("http://unused", "http://unused");

    let request = Request::builder()
        .method("GET")
        .uri("/")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["status"], "ok");
}
