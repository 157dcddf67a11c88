//! Message bridging pipeline.
//!
//! Contact resolution (with the identity cache and conflict recovery), conversation
//! resolution and message forwarding, tied together by [`Bridge`]. Each stage catches
//! its own remote failures and reports them as a typed error.

mod cache;
mod contact;
mod conversation;
mod error;
mod forward;
mod pipeline;
#[cfg(test)]
pub(crate) mod testing;

pub use cache::IdentityCache;
pub use contact::{contact_identifier, new_contact, Contact, ContactResolver};
pub use conversation::{pick_conversation, ConversationResolver};
pub use error::{BridgeError, ContactResolutionError, ConversationResolutionError, ForwardingError};
pub use forward::MessageForwarder;
pub use pipeline::{Bridge, Delivered};
