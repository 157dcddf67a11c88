//! Inbox client API over HTTP.
//!
//! Base path: `{base_url}/public/api/v1/inboxes/{inbox_identifier}`. Every request
//! carries the configured timeout; no call is retried here.

use crate::config::InboxConfig;
use crate::inbox::types::{ContactRecord, ConversationRecord, InboxInfo, NewContact};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum InboxError {
    #[error("inbox request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Contact create rejected because the identifier already exists (409, or 422 validation).
    #[error("inbox contact already exists: {status} {body}")]
    Conflict { status: u16, body: String },
    #[error("inbox api error: {status} {body}")]
    Status { status: u16, body: String },
    #[error("inbox response missing {0}")]
    MissingField(&'static str),
    #[error("inbox client not configured: {0}")]
    NotConfigured(&'static str),
}

impl InboxError {
    /// Non-success response from any endpoint.
    pub fn from_status(status: u16, body: String) -> Self {
        InboxError::Status { status, body }
    }

    /// Contact create only: 409 and 422 mean the identifier is taken.
    pub fn classify_create(self) -> Self {
        match self {
            InboxError::Status { status, body }
                if status == StatusCode::CONFLICT.as_u16()
                    || status == StatusCode::UNPROCESSABLE_ENTITY.as_u16() =>
            {
                InboxError::Conflict { status, body }
            }
            other => other,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, InboxError::Conflict { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, InboxError::Status { status, .. } if *status == StatusCode::NOT_FOUND.as_u16())
    }

    /// HTTP status when the remote answered, for logs.
    pub fn status(&self) -> Option<u16> {
        match self {
            InboxError::Conflict { status, .. } | InboxError::Status { status, .. } => Some(*status),
            InboxError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Operations the bridge needs from the inbox.
#[async_trait]
pub trait InboxApi: Send + Sync {
    /// GET /: inbox metadata.
    async fn inbox_info(&self) -> Result<InboxInfo, InboxError>;
    /// POST /contacts.
    async fn create_contact(&self, contact: &NewContact) -> Result<ContactRecord, InboxError>;
    /// GET /contacts/{identifier}.
    async fn get_contact(&self, identifier: &str) -> Result<ContactRecord, InboxError>;
    /// GET /contacts/{source_id}/conversations.
    async fn list_conversations(&self, source_id: &str) -> Result<Vec<ConversationRecord>, InboxError>;
    /// POST /contacts/{source_id}/conversations.
    async fn create_conversation(&self, source_id: &str) -> Result<ConversationRecord, InboxError>;
    /// POST /contacts/{source_id}/conversations/{id}/messages.
    async fn create_message(
        &self,
        source_id: &str,
        conversation_id: i64,
        content: &str,
    ) -> Result<(), InboxError>;
}

/// Client for the inbox public API.
#[derive(Clone)]
pub struct InboxClient {
    inbox_url: String,
    client: reqwest::Client,
}

impl InboxClient {
    /// Build from an explicit base URL and inbox identifier.
    pub fn new(
        base_url: &str,
        inbox_identifier: &str,
        timeout: std::time::Duration,
    ) -> Result<Self, InboxError> {
        let base_url = base_url.trim().trim_end_matches('/');
        let inbox_identifier = inbox_identifier.trim();
        if base_url.is_empty() {
            return Err(InboxError::NotConfigured("base url"));
        }
        if inbox_identifier.is_empty() {
            return Err(InboxError::NotConfigured("inbox identifier"));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            inbox_url: format!("{}/public/api/v1/inboxes/{}", base_url, inbox_identifier),
            client,
        })
    }

    pub fn from_config(config: &InboxConfig) -> Result<Self, InboxError> {
        Self::new(
            config.base_url.as_deref().unwrap_or(""),
            config.inbox_identifier.as_deref().unwrap_or(""),
            config.request_timeout(),
        )
    }

    /// Inbox base URL (for status reporting).
    pub fn inbox_url(&self) -> &str {
        &self.inbox_url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, InboxError> {
        let res = self.client.get(url).header("Content-Type", "application/json").send().await?;
        Self::decode(res).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, InboxError> {
        let res = self.client.post(url).json(body).send().await?;
        Self::decode(res).await
    }

    async fn decode<T: DeserializeOwned>(res: reqwest::Response) -> Result<T, InboxError> {
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(InboxError::from_status(status, body));
        }
        Ok(res.json().await?)
    }
}

#[async_trait]
impl InboxApi for InboxClient {
    async fn inbox_info(&self) -> Result<InboxInfo, InboxError> {
        self.get_json(&self.inbox_url).await
    }

    async fn create_contact(&self, contact: &NewContact) -> Result<ContactRecord, InboxError> {
        let url = format!("{}/contacts", self.inbox_url);
        self.post_json(&url, contact)
            .await
            .map_err(InboxError::classify_create)
    }

    async fn get_contact(&self, identifier: &str) -> Result<ContactRecord, InboxError> {
        let url = format!("{}/contacts/{}", self.inbox_url, identifier);
        self.get_json(&url).await
    }

    async fn list_conversations(&self, source_id: &str) -> Result<Vec<ConversationRecord>, InboxError> {
        let url = format!("{}/contacts/{}/conversations", self.inbox_url, source_id);
        let list: Option<Vec<ConversationRecord>> = self.get_json(&url).await?;
        Ok(list.unwrap_or_default())
    }

    async fn create_conversation(&self, source_id: &str) -> Result<ConversationRecord, InboxError> {
        let url = format!("{}/contacts/{}/conversations", self.inbox_url, source_id);
        self.post_json(&url, &json!({})).await
    }

    async fn create_message(
        &self,
        source_id: &str,
        conversation_id: i64,
        content: &str,
    ) -> Result<(), InboxError> {
        let url = format!(
            "{}/contacts/{}/conversations/{}/messages",
            self.inbox_url, source_id, conversation_id
        );
        let res = self
            .client
            .post(&url)
            .json(&json!({ "content": content }))
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(InboxError::from_status(status, body));
        }
        Ok(())
    }
}

/// Connectivity probe: the inbox root answers and names itself.
pub async fn probe(inbox: &dyn InboxApi) -> bool {
    match inbox.inbox_info().await {
        Ok(info) if info.identifier.is_some() => {
            log::info!(
                "inbox: connection ok (inbox: {})",
                info.name.as_deref().unwrap_or("unnamed")
            );
            true
        }
        Ok(_) => {
            log::warn!("inbox: probe response has no identifier");
            false
        }
        Err(e) => {
            log::error!("inbox: connection failed (status {:?}): {}", e.status(), e);
            false
        }
    }
}
