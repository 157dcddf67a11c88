//! Wire types for the inbox client API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// POST /contacts body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewContact {
    pub identifier: String,
    pub name: String,
    pub email: String,
    pub custom_attributes: Value,
}

/// Contact as returned by create and fetch. Fields are optional on the wire;
/// the resolver decides which are required.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContactRecord {
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub pubsub_token: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Conversation list item or create response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConversationRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

impl ConversationRecord {
    pub fn is_open(&self) -> bool {
        self.status.as_deref() == Some("open")
    }
}

/// GET on the inbox root: used as a connectivity probe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboxInfo {
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}
