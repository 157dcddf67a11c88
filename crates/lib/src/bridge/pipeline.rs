//! One inbound VK message -> contact -> conversation -> inbox message.

use crate::bridge::cache::IdentityCache;
use crate::bridge::contact::{Contact, ContactResolver};
use crate::bridge::conversation::ConversationResolver;
use crate::bridge::error::BridgeError;
use crate::bridge::forward::MessageForwarder;
use crate::inbox::InboxApi;
use crate::vk::Profile;
use std::sync::Arc;

/// Where a bridged message landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    pub contact: Contact,
    pub conversation_id: i64,
}

/// The bridging pipeline. Stateless apart from the shared identity cache.
pub struct Bridge {
    inbox: Arc<dyn InboxApi>,
    cache: Arc<IdentityCache>,
    contacts: ContactResolver,
    conversations: ConversationResolver,
    forwarder: MessageForwarder,
}

impl Bridge {
    pub fn new(inbox: Arc<dyn InboxApi>, cache: Arc<IdentityCache>) -> Self {
        Self {
            contacts: ContactResolver::new(inbox.clone(), cache.clone()),
            conversations: ConversationResolver::new(inbox.clone()),
            forwarder: MessageForwarder::new(inbox.clone()),
            inbox,
            cache,
        }
    }

    pub fn inbox(&self) -> &Arc<dyn InboxApi> {
        &self.inbox
    }

    pub fn cache(&self) -> &Arc<IdentityCache> {
        &self.cache
    }

    /// Resolve contact, then conversation, then forward; stops at the first failing stage.
    pub async fn run(
        &self,
        user_id: i64,
        profile: &Profile,
        text: &str,
    ) -> Result<Delivered, BridgeError> {
        let contact = self.contacts.resolve(user_id, profile).await?;
        let conversation_id = self.conversations.resolve(&contact.contact_id).await?;
        self.forwarder
            .forward(&contact.contact_id, conversation_id, text)
            .await?;
        Ok(Delivered {
            contact,
            conversation_id,
        })
    }

    /// [`run`](Self::run) reduced to success/failure; the failure is logged with user id and stage.
    pub async fn process(&self, user_id: i64, profile: &Profile, text: &str) -> bool {
        match self.run(user_id, profile, text).await {
            Ok(d) => {
                log::info!(
                    "bridge: message from vk user {} delivered to conversation {}",
                    user_id,
                    d.conversation_id
                );
                true
            }
            Err(e) => {
                log::error!(
                    "bridge: message from vk user {} dropped at {} stage: {}",
                    user_id,
                    e.stage(),
                    e
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::testing::{CallCounts, FakeInbox};

    fn bridge(inbox: &Arc<FakeInbox>) -> Bridge {
        Bridge::new(inbox.clone(), Arc::new(IdentityCache::new()))
    }

    #[tokio::test]
    async fn first_message_creates_contact_and_conversation() {
        let inbox = Arc::new(FakeInbox::new());
        let b = bridge(&inbox);

        assert!(b.process(42, &Profile::default(), "Hello").await);

        let counts = inbox.counts();
        assert_eq!(counts.create_contact, 1);
        assert_eq!(counts.create_conversation, 1);
        assert_eq!(counts.create_message, 1);
        let messages = inbox.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].2, "Hello");
    }

    #[tokio::test]
    async fn repeat_message_reuses_contact_and_conversation() {
        let inbox = Arc::new(FakeInbox::new());
        let b = bridge(&inbox);

        let first = b.run(42, &Profile::default(), "Hello").await.expect("first");
        let second = b.run(42, &Profile::default(), "Again").await.expect("second");

        assert_eq!(first.contact.contact_id, second.contact.contact_id);
        assert_eq!(first.conversation_id, second.conversation_id);
        assert_eq!(
            inbox.counts(),
            CallCounts {
                create_contact: 1,
                contacts_created: 1,
                get_contact: 0,
                list_conversations: 2,
                create_conversation: 1,
                create_message: 2,
            }
        );
    }

    #[tokio::test]
    async fn contact_failure_stops_before_conversation() {
        let inbox = Arc::new(FakeInbox::new());
        inbox.fail_create_contact(500);
        let b = bridge(&inbox);

        let err = b.run(1, &Profile::default(), "hi").await.expect_err("must fail");

        assert_eq!(err.stage(), "contact");
        assert_eq!(inbox.counts().list_conversations, 0);
        assert_eq!(inbox.counts().create_message, 0);
    }

    #[tokio::test]
    async fn conversation_failure_sends_nothing() {
        let inbox = Arc::new(FakeInbox::new());
        inbox.fail_create_conversation(500);
        let b = bridge(&inbox);

        assert!(!b.process(1, &Profile::default(), "hi").await);
        assert_eq!(inbox.counts().create_message, 0);
    }

    #[tokio::test]
    async fn empty_text_fails_at_forward_stage() {
        let inbox = Arc::new(FakeInbox::new());
        let b = bridge(&inbox);

        let err = b.run(1, &Profile::default(), "  ").await.expect_err("must fail");

        assert_eq!(err.stage(), "forward");
        assert_eq!(inbox.counts().create_message, 0);
    }
}
