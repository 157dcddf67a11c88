//! Message forwarding into an inbox conversation.

use crate::bridge::error::ForwardingError;
use crate::inbox::InboxApi;
use std::sync::Arc;

pub struct MessageForwarder {
    inbox: Arc<dyn InboxApi>,
}

impl MessageForwarder {
    pub fn new(inbox: Arc<dyn InboxApi>) -> Self {
        Self { inbox }
    }

    /// Send trimmed `text`; blank text is rejected before any remote call.
    pub async fn forward(
        &self,
        contact_id: &str,
        conversation_id: i64,
        text: &str,
    ) -> Result<(), ForwardingError> {
        let content = text.trim();
        if content.is_empty() {
            return Err(ForwardingError::EmptyContent);
        }
        log::debug!("forward: sending message to conversation {}", conversation_id);
        self.inbox
            .create_message(contact_id, conversation_id, content)
            .await
            .map_err(|source| ForwardingError::Send {
                conversation_id,
                source,
            })?;
        log::info!("forward: message sent to conversation {}", conversation_id);
        Ok(())
    }

    /// Like [`forward`](Self::forward) but logs the failure and reports success as a bool.
    pub async fn send(&self, contact_id: &str, conversation_id: i64, text: &str) -> bool {
        match self.forward(contact_id, conversation_id, text).await {
            Ok(()) => true,
            Err(ForwardingError::EmptyContent) => {
                log::warn!("forward: empty message for conversation {}, skipping", conversation_id);
                false
            }
            Err(e) => {
                log::error!("forward: {}", e);
                false
            }
        }
    }
}
