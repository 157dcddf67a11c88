//! Conversation resolution: reuse an open conversation or start one.

use crate::bridge::error::ConversationResolutionError;
use crate::inbox::{ConversationRecord, InboxApi, InboxError};
use std::sync::Arc;

pub struct ConversationResolver {
    inbox: Arc<dyn InboxApi>,
}

/// First open conversation, else the first listed one. Items without an id are skipped.
pub fn pick_conversation(conversations: &[ConversationRecord]) -> Option<i64> {
    conversations
        .iter()
        .filter(|c| c.is_open())
        .find_map(|c| c.id)
        .or_else(|| conversations.iter().find_map(|c| c.id))
}

impl ConversationResolver {
    pub fn new(inbox: Arc<dyn InboxApi>) -> Self {
        Self { inbox }
    }

    pub async fn resolve(&self, contact_id: &str) -> Result<i64, ConversationResolutionError> {
        let existing = match self.inbox.list_conversations(contact_id).await {
            Ok(list) => list,
            Err(e) if e.is_not_found() => {
                log::debug!("conversation: none listed for {} (404)", contact_id);
                Vec::new()
            }
            Err(source) => {
                log::error!("conversation: list for {} failed: {}", contact_id, source);
                return Err(ConversationResolutionError::List {
                    contact_id: contact_id.to_string(),
                    source,
                });
            }
        };

        if let Some(id) = pick_conversation(&existing) {
            log::info!("conversation: using existing {} for {}", id, contact_id);
            return Ok(id);
        }

        let create_err = |source| ConversationResolutionError::Create {
            contact_id: contact_id.to_string(),
            source,
        };
        let created = self.inbox.create_conversation(contact_id).await.map_err(|e| {
            log::error!(
                "conversation: create for {} failed (status {:?}): {}",
                contact_id,
                e.status(),
                e
            );
            create_err(e)
        })?;
        let id = created
            .id
            .ok_or_else(|| create_err(InboxError::MissingField("id")))?;
        log::info!("conversation: created {} for {}", id, contact_id);
        Ok(id)
    }
}
