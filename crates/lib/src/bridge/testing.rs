//! Recording in-memory inbox used by the bridge unit tests.

use crate::inbox::{ContactRecord, ConversationRecord, InboxApi, InboxError, InboxInfo, NewContact};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub create_contact: usize,
    pub contacts_created: usize,
    pub get_contact: usize,
    pub list_conversations: usize,
    pub create_conversation: usize,
    pub create_message: usize,
}

#[derive(Default)]
struct State {
    next_id: i64,
    /// identifier -> source_id
    contacts: HashMap<String, String>,
    /// source_id -> conversations
    conversations: HashMap<String, Vec<ConversationRecord>>,
    /// (source_id, conversation_id, content)
    messages: Vec<(String, i64, String)>,
    counts: CallCounts,
    fail_create_contact: Option<u16>,
    fail_list: Option<u16>,
    fail_create_conversation: Option<u16>,
    fail_message: Option<u16>,
    omit_created_source_id: bool,
    fetch_identifier_only: bool,
    omit_conversation_id: bool,
}

pub struct FakeInbox {
    state: Mutex<State>,
    create_delay: Duration,
}

impl FakeInbox {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 100,
                ..State::default()
            }),
            create_delay: Duration::ZERO,
        }
    }

    /// Delay contact creation so concurrent resolutions overlap.
    pub fn with_create_delay_ms(mut self, ms: u64) -> Self {
        self.create_delay = Duration::from_millis(ms);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("fake inbox lock")
    }

    pub fn counts(&self) -> CallCounts {
        self.lock().counts.clone()
    }

    pub fn messages(&self) -> Vec<(String, i64, String)> {
        self.lock().messages.clone()
    }

    /// Pre-create a contact; returns its source_id.
    pub fn seed_contact(&self, identifier: &str) -> String {
        let mut s = self.lock();
        s.next_id += 1;
        let source_id = format!("src-{}", s.next_id);
        s.contacts.insert(identifier.to_string(), source_id.clone());
        source_id
    }

    pub fn seed_conversation(&self, source_id: &str, id: i64, status: Option<&str>) {
        self.lock()
            .conversations
            .entry(source_id.to_string())
            .or_default()
            .push(ConversationRecord {
                id: Some(id),
                status: status.map(str::to_string),
            });
    }

    pub fn fail_create_contact(&self, status: u16) {
        self.lock().fail_create_contact = Some(status);
    }

    pub fn fail_list(&self, status: u16) {
        self.lock().fail_list = Some(status);
    }

    pub fn fail_create_conversation(&self, status: u16) {
        self.lock().fail_create_conversation = Some(status);
    }

    pub fn fail_message(&self, status: u16) {
        self.lock().fail_message = Some(status);
    }

    /// Contact create answers 200 without `source_id`.
    pub fn omit_created_source_id(&self) {
        self.lock().omit_created_source_id = true;
    }

    /// Contact fetch answers with `identifier` only.
    pub fn fetch_identifier_only(&self) {
        self.lock().fetch_identifier_only = true;
    }

    /// Conversation create answers 200 without `id`.
    pub fn omit_conversation_id(&self) {
        self.lock().omit_conversation_id = true;
    }
}

fn fail(status: u16) -> InboxError {
    InboxError::from_status(status, "injected".to_string())
}

#[async_trait]
impl InboxApi for FakeInbox {
    async fn inbox_info(&self) -> Result<InboxInfo, InboxError> {
        Ok(InboxInfo {
            identifier: Some("fake".to_string()),
            name: Some("Fake inbox".to_string()),
        })
    }

    async fn create_contact(&self, contact: &NewContact) -> Result<ContactRecord, InboxError> {
        self.lock().counts.create_contact += 1;
        if !self.create_delay.is_zero() {
            tokio::time::sleep(self.create_delay).await;
        }
        let mut s = self.lock();
        if let Some(status) = s.fail_create_contact {
            return Err(fail(status).classify_create());
        }
        if s.contacts.contains_key(&contact.identifier) {
            return Err(InboxError::from_status(422, r#"{"message":"Identifier has already been taken"}"#.to_string())
                .classify_create());
        }
        if s.omit_created_source_id {
            return Ok(ContactRecord {
                identifier: Some(contact.identifier.clone()),
                name: Some(contact.name.clone()),
                ..ContactRecord::default()
            });
        }
        s.next_id += 1;
        let source_id = format!("src-{}", s.next_id);
        s.contacts.insert(contact.identifier.clone(), source_id.clone());
        s.counts.contacts_created += 1;
        Ok(ContactRecord {
            source_id: Some(source_id.clone()),
            pubsub_token: Some(format!("pubsub-{}", source_id)),
            identifier: Some(contact.identifier.clone()),
            name: Some(contact.name.clone()),
        })
    }

    async fn get_contact(&self, identifier: &str) -> Result<ContactRecord, InboxError> {
        let mut s = self.lock();
        s.counts.get_contact += 1;
        match s.contacts.get(identifier) {
            Some(_) if s.fetch_identifier_only => Ok(ContactRecord {
                identifier: Some(identifier.to_string()),
                ..ContactRecord::default()
            }),
            Some(source_id) => Ok(ContactRecord {
                source_id: Some(source_id.clone()),
                pubsub_token: None,
                identifier: Some(identifier.to_string()),
                name: None,
            }),
            None => Err(fail(404)),
        }
    }

    async fn list_conversations(&self, source_id: &str) -> Result<Vec<ConversationRecord>, InboxError> {
        let mut s = self.lock();
        s.counts.list_conversations += 1;
        if let Some(status) = s.fail_list {
            return Err(fail(status));
        }
        Ok(s.conversations.get(source_id).cloned().unwrap_or_default())
    }

    async fn create_conversation(&self, source_id: &str) -> Result<ConversationRecord, InboxError> {
        let mut s = self.lock();
        s.counts.create_conversation += 1;
        if let Some(status) = s.fail_create_conversation {
            return Err(fail(status));
        }
        if s.omit_conversation_id {
            return Ok(ConversationRecord {
                id: None,
                status: Some("open".to_string()),
            });
        }
        s.next_id += 1;
        let record = ConversationRecord {
            id: Some(s.next_id),
            status: Some("open".to_string()),
        };
        s.conversations
            .entry(source_id.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn create_message(
        &self,
        source_id: &str,
        conversation_id: i64,
        content: &str,
    ) -> Result<(), InboxError> {
        let mut s = self.lock();
        s.counts.create_message += 1;
        if let Some(status) = s.fail_message {
            return Err(fail(status));
        }
        s.messages
            .push((source_id.to_string(), conversation_id, content.to_string()));
        Ok(())
    }
}
