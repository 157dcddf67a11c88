//! VK Callback API side of the bridge.
//!
//! Event payload types, webhook verification (confirmation handshake, group and
//! secret checks) and the users.get profile lookup used for contact names.

mod event;
mod profile;
mod verify;

pub use event::{EventKind, InboundEvent, InboundMessage};
pub use profile::{profile_or_default, Profile, ProfileError, ProfileLookup, VkProfileClient};
pub use verify::{RejectReason, Verdict, WebhookVerifier};
