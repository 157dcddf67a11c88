//! Mock inbox client API served by axum on a free port, recording every call.

#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const INBOX: &str = "test-inbox";

#[derive(Debug, Default, Clone)]
pub struct Recorded {
    pub create_contact: usize,
    pub get_contact: usize,
    pub list_conversations: usize,
    pub create_conversation: usize,
    /// (source_id, conversation_id, content)
    pub messages: Vec<(String, i64, String)>,
    pub contact_bodies: Vec<Value>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    contacts: HashMap<String, String>,
    conversations: HashMap<String, Vec<Value>>,
    recorded: Recorded,
}

#[derive(Clone, Default)]
pub struct MockInbox {
    inner: Arc<Mutex<Inner>>,
}

impl MockInbox {
    pub fn recorded(&self) -> Recorded {
        self.inner.lock().expect("lock").recorded.clone()
    }

    pub fn seed_contact(&self, identifier: &str, source_id: &str) {
        self.inner
            .lock()
            .expect("lock")
            .contacts
            .insert(identifier.to_string(), source_id.to_string());
    }

    /// Wait until `n` messages were posted, or give up after ~5s.
    pub async fn wait_for_messages(&self, n: usize) -> Recorded {
        for _ in 0..100 {
            let r = self.recorded();
            if r.messages.len() >= n {
                return r;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        self.recorded()
    }
}

pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

/// Start the mock inbox; returns its handle and base URL.
pub async fn start_mock_inbox() -> (MockInbox, String) {
    let mock = MockInbox::default();
    let app = Router::new()
        .route("/public/api/v1/inboxes/:inbox", get(inbox_info))
        .route("/public/api/v1/inboxes/:inbox/contacts", post(create_contact))
        .route("/public/api/v1/inboxes/:inbox/contacts/:contact", get(get_contact))
        .route(
            "/public/api/v1/inboxes/:inbox/contacts/:contact/conversations",
            get(list_conversations).post(create_conversation),
        )
        .route(
            "/public/api/v1/inboxes/:inbox/contacts/:contact/conversations/:conversation/messages",
            post(create_message),
        )
        .with_state(mock.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock inbox");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (mock, format!("http://{}", addr))
}

async fn inbox_info(Path(inbox): Path<String>) -> (StatusCode, Json<Value>) {
    if inbox != INBOX {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })));
    }
    (StatusCode::OK, Json(json!({ "identifier": INBOX, "name": "Mock inbox" })))
}

async fn create_contact(
    State(mock): State<MockInbox>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut g = mock.inner.lock().expect("lock");
    g.recorded.create_contact += 1;
    g.recorded.contact_bodies.push(body.clone());
    let identifier = body["identifier"].as_str().unwrap_or_default().to_string();
    if g.contacts.contains_key(&identifier) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": "Identifier has already been taken" })),
        );
    }
    g.next_id += 1;
    let source_id = format!("mock-src-{}", g.next_id);
    g.contacts.insert(identifier.clone(), source_id.clone());
    (
        StatusCode::OK,
        Json(json!({ "source_id": source_id, "pubsub_token": format!("tok-{}", source_id), "identifier": identifier })),
    )
}

async fn get_contact(
    State(mock): State<MockInbox>,
    Path((_inbox, identifier)): Path<(String, String)>,
) -> (StatusCode, Json<Value>) {
    let mut g = mock.inner.lock().expect("lock");
    g.recorded.get_contact += 1;
    match g.contacts.get(&identifier) {
        Some(source_id) => (
            StatusCode::OK,
            Json(json!({ "source_id": source_id, "identifier": identifier })),
        ),
        None => (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" }))),
    }
}

async fn list_conversations(
    State(mock): State<MockInbox>,
    Path((_inbox, source_id)): Path<(String, String)>,
) -> Json<Value> {
    let mut g = mock.inner.lock().expect("lock");
    g.recorded.list_conversations += 1;
    Json(Value::Array(
        g.conversations.get(&source_id).cloned().unwrap_or_default(),
    ))
}

async fn create_conversation(
    State(mock): State<MockInbox>,
    Path((_inbox, source_id)): Path<(String, String)>,
) -> Json<Value> {
    let mut g = mock.inner.lock().expect("lock");
    g.recorded.create_conversation += 1;
    g.next_id += 1;
    let conv = json!({ "id": g.next_id, "status": "open" });
    g.conversations
        .entry(source_id)
        .or_default()
        .push(conv.clone());
    Json(conv)
}

async fn create_message(
    State(mock): State<MockInbox>,
    Path((_inbox, source_id, conversation_id)): Path<(String, String, i64)>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let content = body["content"].as_str().unwrap_or_default().to_string();
    if content.is_empty() {
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": "blank" })));
    }
    let mut g = mock.inner.lock().expect("lock");
    g.recorded.messages.push((source_id, conversation_id, content.clone()));
    (StatusCode::OK, Json(json!({ "id": 1, "content": content })))
}
