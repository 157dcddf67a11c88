//! Contact resolution: VK user id -> inbox contact, created on first sight.

use crate::bridge::cache::IdentityCache;
use crate::bridge::error::ContactResolutionError;
use crate::inbox::{ContactRecord, InboxApi, InboxError, NewContact};
use crate::vk::Profile;
use serde_json::json;
use std::sync::Arc;

/// A resolved inbox contact for one VK user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub external_user_id: i64,
    /// Inbox `source_id`; used in every conversation/message path.
    pub contact_id: String,
    pub pubsub_token: String,
}

/// Stable inbox identifier for a VK user; the idempotency key on the remote side.
pub fn contact_identifier(user_id: i64) -> String {
    format!("vk_{}", user_id)
}

/// Create-contact body for a VK user.
pub fn new_contact(user_id: i64, profile: &Profile) -> NewContact {
    NewContact {
        identifier: contact_identifier(user_id),
        name: profile.display_name(user_id),
        email: format!("vk_{}@vk.messenger", user_id),
        custom_attributes: json!({
            "vk_id": user_id.to_string(),
            "vk_profile": format!("https://vk.com/id{}", user_id),
            "source": "vk_messenger",
        }),
    }
}

pub struct ContactResolver {
    inbox: Arc<dyn InboxApi>,
    cache: Arc<IdentityCache>,
}

impl ContactResolver {
    pub fn new(inbox: Arc<dyn InboxApi>, cache: Arc<IdentityCache>) -> Self {
        Self { inbox, cache }
    }

    /// Cache hit, else create; a conflict on create falls back to fetching the
    /// existing contact by the same identifier.
    pub async fn resolve(
        &self,
        user_id: i64,
        profile: &Profile,
    ) -> Result<Contact, ContactResolutionError> {
        if let Some(contact_id) = self.cache.get(user_id).await {
            log::debug!("contact: cache hit for vk user {}: {}", user_id, contact_id);
            return Ok(Contact {
                external_user_id: user_id,
                pubsub_token: contact_id.clone(),
                contact_id,
            });
        }

        let body = new_contact(user_id, profile);
        log::info!("contact: creating {} for vk user {}", body.identifier, user_id);
        match self.inbox.create_contact(&body).await {
            Ok(record) => {
                let contact_id = record
                    .source_id
                    .clone()
                    .ok_or(InboxError::MissingField("source_id"))
                    .map_err(|source| ContactResolutionError::Create {
                        identifier: body.identifier.clone(),
                        source,
                    })?;
                let pubsub_token = record.pubsub_token.unwrap_or_else(|| contact_id.clone());
                self.cache.insert(user_id, contact_id.clone()).await;
                log::info!("contact: created source_id={} for vk user {}", contact_id, user_id);
                Ok(Contact {
                    external_user_id: user_id,
                    contact_id,
                    pubsub_token,
                })
            }
            Err(e) if e.is_conflict() => {
                log::info!(
                    "contact: {} already exists (status {:?}), fetching",
                    body.identifier,
                    e.status()
                );
                self.fetch_existing(user_id, &body.identifier).await
            }
            Err(source) => {
                log::error!(
                    "contact: create {} failed (status {:?}): {}",
                    body.identifier,
                    source.status(),
                    source
                );
                Err(ContactResolutionError::Create {
                    identifier: body.identifier,
                    source,
                })
            }
        }
    }

    async fn fetch_existing(
        &self,
        user_id: i64,
        identifier: &str,
    ) -> Result<Contact, ContactResolutionError> {
        let fetch_err = |source| ContactResolutionError::Fetch {
            identifier: identifier.to_string(),
            source,
        };
        let record: ContactRecord = self.inbox.get_contact(identifier).await.map_err(|e| {
            log::error!("contact: fetch existing {} failed: {}", identifier, e);
            fetch_err(e)
        })?;
        let contact_id = record
            .source_id
            .or(record.identifier)
            .ok_or_else(|| fetch_err(InboxError::MissingField("source_id")))?;
        let pubsub_token = record.pubsub_token.unwrap_or_else(|| contact_id.clone());
        self.cache.insert(user_id, contact_id.clone()).await;
        Ok(Contact {
            external_user_id: user_id,
            contact_id,
            pubsub_token,
        })
    }
}
