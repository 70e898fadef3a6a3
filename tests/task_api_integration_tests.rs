use std::sync::Arc;
use std::time::Duration;

use chat_review::core::action::{Action, Effect, update};
use chat_review::core::annotation::GatingPolicy;
use chat_review::core::state::App;
use chat_review::core::stream::AgentContext;
use chat_review::task::{
    HttpTaskApi, LiveUpdate, Message, OutboundMessage, StreamUpdate, TaskApi, TaskApiError,
};
use serde_json::json;
use tokio::sync::mpsc;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, method, path},
};

// ============================================================================
// Helper Functions
// ============================================================================

fn api(server: &MockServer) -> HttpTaskApi {
    HttpTaskApi::new(server.uri(), Duration::from_secs(5)).unwrap()
}

/// Collects every update pushed before the sender side closed
async fn collect(mut receiver: mpsc::Receiver<StreamUpdate>) -> Vec<StreamUpdate> {
    let mut updates = Vec::new();
    while let Some(update) = receiver.recv().await {
        updates.push(update);
    }
    updates
}

// ============================================================================
// Message Send
// ============================================================================

#[tokio::test]
async fn test_send_forwards_reply_messages_as_appends() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/message"))
        .and(body_partial_json(json!({"text": "Hello"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [
                {"id": "model", "update_id": 2, "text": "Hi there"},
                {"id": "model", "update_id": 3, "text": "Anything else?"}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (tx, rx) = mpsc::channel(16);
    let result = api(&mock_server)
        .on_message_send(OutboundMessage::new("Hello"), tx)
        .await;
    assert!(result.is_ok(), "Expected success, got {:?}", result);

    let updates = collect(rx).await;
    assert_eq!(
        updates,
        vec![
            StreamUpdate::Append(Message::new("model", 2, "Hi there")),
            StreamUpdate::Append(Message::new("model", 3, "Anything else?")),
        ]
    );
}

#[tokio::test]
async fn test_send_empty_body_is_plain_ack() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/message"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let (tx, rx) = mpsc::channel(16);
    let result = api(&mock_server)
        .on_message_send(OutboundMessage::new("Hello"), tx)
        .await;

    assert!(result.is_ok());
    assert!(collect(rx).await.is_empty());
}

#[tokio::test]
async fn test_send_server_error_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/message"))
        .respond_with(ResponseTemplate::new(500).set_body_string("task expired"))
        .mount(&mock_server)
        .await;

    let (tx, _rx) = mpsc::channel(16);
    let result = api(&mock_server)
        .on_message_send(OutboundMessage::new("Hello"), tx)
        .await;

    match result {
        Err(TaskApiError::Api { status, message }) => {
            assert_eq!(status, 500);
            assert!(message.contains("task expired"));
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_send_malformed_body_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/message"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&mock_server)
        .await;

    let (tx, _rx) = mpsc::channel(16);
    let result = api(&mock_server)
        .on_message_send(OutboundMessage::new("Hello"), tx)
        .await;

    assert!(matches!(result, Err(TaskApiError::Parse(_))));
}

// ============================================================================
// Live Update (regenerate)
// ============================================================================

#[tokio::test]
async fn test_live_update_replaces_last_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/live_update"))
        .and(body_partial_json(json!({
            "regenerate": true,
            "reason": "Accuracy",
            "update_id": 7
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{"id": "model", "update_id": 8, "text": "Better answer"}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (tx, rx) = mpsc::channel(16);
    let result = api(&mock_server)
        .send_live_update(LiveUpdate::regenerate(7, "Accuracy"), tx)
        .await;
    assert!(result.is_ok());

    assert_eq!(
        collect(rx).await,
        vec![StreamUpdate::ReplaceLast(Message::new("model", 8, "Better answer"))]
    );
}

#[tokio::test]
async fn test_live_update_failure_surfaces_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/live_update"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&mock_server)
        .await;

    let (tx, _rx) = mpsc::channel(16);
    let result = api(&mock_server)
        .send_live_update(LiveUpdate::regenerate(1, "Relevance"), tx)
        .await;

    assert!(matches!(result, Err(TaskApiError::Api { status: 503, .. })));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    // Nothing listens on port 9 (discard) in the test environment
    let api = HttpTaskApi::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
    let (tx, _rx) = mpsc::channel(16);
    let result = api.on_message_send(OutboundMessage::new("Hello"), tx).await;

    assert!(matches!(result, Err(TaskApiError::Network(_))));
}

// ============================================================================
// Session Round Trip
// ============================================================================

/// Drives the core the way the event loop does: a send reports its outcome
/// before the replies, a regenerate reports it after the replacement.
async fn settle(app: &mut App, effect: Effect) {
    let (tx, rx) = mpsc::channel(16);
    let (outcome, outcome_first) = match effect {
        Effect::SendMessage(message) => match app.task_api.on_message_send(message, tx).await {
            Ok(()) => (Action::SendSucceeded, true),
            Err(e) => (Action::SendFailed(e.to_string()), true),
        },
        Effect::SendLiveUpdate(live) => match app.task_api.send_live_update(live, tx).await {
            Ok(()) => (Action::RegenerateSucceeded, false),
            Err(e) => (Action::RegenerateFailed(e.to_string()), false),
        },
        other => panic!("Expected a task API effect, got {:?}", other),
    };
    if outcome_first {
        update(app, outcome.clone());
    }
    for stream_update in collect(rx).await {
        update(app, Action::Stream(stream_update));
    }
    if !outcome_first {
        update(app, outcome);
    }
}

#[tokio::test]
async fn test_session_annotate_send_and_regenerate() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/message"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{"id": "model", "update_id": 2, "text": "Second answer"}]
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/live_update"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{"id": "model", "update_id": 3, "text": "Second answer, again"}]
        })))
        .mount(&mock_server)
        .await;

    let mut app = App::new(
        Arc::new(api(&mock_server)),
        AgentContext::new("worker"),
        GatingPolicy::PreviousMessage,
    );
    app.annotation_options = vec!["good".into(), "bad".into()];
    update(
        &mut app,
        Action::Stream(StreamUpdate::Append(Message::new("model", 1, "First answer"))),
    );

    // Gate closed until the first answer is judged
    update(&mut app, Action::ComposerChanged("thanks".into()));
    assert_eq!(update(&mut app, Action::Submit), Effect::None);

    update(
        &mut app,
        Action::Annotate {
            index: 0,
            value: Some("good".into()),
        },
    );
    let effect = update(&mut app, Action::Submit);
    assert!(matches!(effect, Effect::SendMessage(_)));
    settle(&mut app, effect).await;

    let texts: Vec<&str> = app.messages.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["First answer", "thanks", "Second answer"]);
    assert_eq!(app.annotations().get(0), Some(Some("good")));

    // The newest agent message has no annotation yet, but the previous one
    // (the worker's own) needs none, so regenerate is open
    assert!(app.can_regenerate());
    let effect = update(&mut app, Action::Regenerate("Accuracy".into()));
    assert!(matches!(effect, Effect::SendLiveUpdate(_)));
    // Nothing new is sent while the replacement is pending
    update(&mut app, Action::ComposerChanged("more".into()));
    assert_eq!(update(&mut app, Action::Submit), Effect::None);
    settle(&mut app, effect).await;

    assert_eq!(app.messages.len(), 3);
    assert_eq!(app.messages[2].text, "Second answer, again");
    assert!(app.can_regenerate());
    assert!(app.annotation_needed());
}
