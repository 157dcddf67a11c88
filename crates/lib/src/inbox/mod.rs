//! Remote inbox (support system) client API.
//!
//! Contacts, conversations and messages are created through the inbox's public
//! client API, scoped by the configured inbox identifier. [`InboxApi`] is the seam
//! the bridge depends on so tests can substitute a recording fake.

mod client;
mod types;

pub use client::{probe, InboxApi, InboxClient, InboxError};
pub use types::{ContactRecord, ConversationRecord, InboxInfo, NewContact};
