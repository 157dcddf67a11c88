//! Webhook verification: confirmation handshake, group and secret checks.

use crate::config::{self, Config};
use crate::vk::event::{EventKind, InboundEvent};

/// What to do with an inbound event before dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Answer the handshake with this body.
    Confirm(String),
    /// Drop silently and answer "ok".
    Reject(RejectReason),
    /// Hand to the dispatcher.
    Accept,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    GroupMismatch { got: i64, expected: i64 },
    SecretMismatch,
}

/// Checks events against the configured community.
#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    group_id: i64,
    confirmation: Option<String>,
    secret: Option<String>,
}

impl WebhookVerifier {
    pub fn new(group_id: i64, confirmation: Option<String>, secret: Option<String>) -> Self {
        Self {
            group_id,
            confirmation,
            secret,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.vk.group_id,
            config::resolve_confirmation(config),
            config::resolve_secret(config),
        )
    }

    pub fn verify(&self, event: &InboundEvent) -> Verdict {
        if event.kind() == EventKind::Confirmation {
            return match &self.confirmation {
                Some(token) => Verdict::Confirm(token.clone()),
                None => {
                    log::warn!("verify: confirmation requested but no confirmation string is configured");
                    Verdict::Confirm(String::new())
                }
            };
        }
        if let Some(got) = event.group_id {
            if got != self.group_id {
                return Verdict::Reject(RejectReason::GroupMismatch {
                    got,
                    expected: self.group_id,
                });
            }
        }
        if let Some(ref expected) = self.secret {
            if event.secret.as_deref() != Some(expected.as_str()) {
                return Verdict::Reject(RejectReason::SecretMismatch);
            }
        }
        Verdict::Accept
    }
}
