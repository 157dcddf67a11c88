//! Failure types for each bridging stage.

use crate::inbox::InboxError;

#[derive(Debug, thiserror::Error)]
pub enum ContactResolutionError {
    #[error("create contact {identifier} failed: {source}")]
    Create {
        identifier: String,
        #[source]
        source: InboxError,
    },
    /// Creation hit a conflict and the follow-up fetch failed too.
    #[error("contact {identifier} exists but fetch failed: {source}")]
    Fetch {
        identifier: String,
        #[source]
        source: InboxError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ConversationResolutionError {
    #[error("list conversations for {contact_id} failed: {source}")]
    List {
        contact_id: String,
        #[source]
        source: InboxError,
    },
    #[error("create conversation for {contact_id} failed: {source}")]
    Create {
        contact_id: String,
        #[source]
        source: InboxError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ForwardingError {
    #[error("empty message content")]
    EmptyContent,
    #[error("send to conversation {conversation_id} failed: {source}")]
    Send {
        conversation_id: i64,
        #[source]
        source: InboxError,
    },
}

/// Which stage of `process` failed.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error(transparent)]
    Contact(#[from] ContactResolutionError),
    #[error(transparent)]
    Conversation(#[from] ConversationResolutionError),
    #[error(transparent)]
    Forwarding(#[from] ForwardingError),
}

impl BridgeError {
    pub fn stage(&self) -> &'static str {
        match self {
            BridgeError::Contact(_) => "contact",
            BridgeError::Conversation(_) => "conversation",
            BridgeError::Forwarding(_) => "forward",
        }
    }
}
