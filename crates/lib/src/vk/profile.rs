//! VK user profile lookup (users.get) for contact display names.

use crate::config::{self, Config};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const VK_API_BASE: &str = "https://api.vk.com/method";

/// Name fields from users.get.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl Profile {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// "First Last", or `VK user <id>` when both are blank.
    pub fn display_name(&self, user_id: i64) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            format!("VK user {}", user_id)
        } else {
            name.to_string()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("vk request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("vk api error {code}: {message}")]
    Api { code: i64, message: String },
    #[error("vk user {0} not found")]
    NotFound(i64),
    #[error("vk access token not configured")]
    NoToken,
}

/// Source of profile data for a VK user id.
#[async_trait]
pub trait ProfileLookup: Send + Sync {
    async fn get_profile(&self, user_id: i64) -> Result<Profile, ProfileError>;
}

#[derive(Debug, Deserialize)]
struct UsersGetResponse {
    #[serde(default)]
    response: Option<Vec<Profile>>,
    #[serde(default)]
    error: Option<VkApiError>,
}

#[derive(Debug, Deserialize)]
struct VkApiError {
    error_code: i64,
    #[serde(default)]
    error_msg: String,
}

/// users.get over the VK method API.
pub struct VkProfileClient {
    api_base: String,
    token: Option<String>,
    api_version: String,
    client: reqwest::Client,
}

impl VkProfileClient {
    pub fn new(
        token: Option<String>,
        api_version: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProfileError> {
        Ok(Self {
            api_base: vk_api_base(),
            token,
            api_version: api_version.into(),
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ProfileError> {
        Self::new(
            config::resolve_vk_token(config),
            config.vk.api_version.clone(),
            config.inbox.request_timeout(),
        )
    }

    /// Point at a different method endpoint (tests, proxies).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl ProfileLookup for VkProfileClient {
    async fn get_profile(&self, user_id: i64) -> Result<Profile, ProfileError> {
        let token = self.token.as_ref().ok_or(ProfileError::NoToken)?;
        let url = format!("{}/users.get", self.api_base);
        let user_ids = user_id.to_string();
        let res = self
            .client
            .get(&url)
            .query(&[
                ("user_ids", user_ids.as_str()),
                ("v", self.api_version.as_str()),
                ("access_token", token.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;
        let data: UsersGetResponse = res.json().await?;
        if let Some(e) = data.error {
            return Err(ProfileError::Api {
                code: e.error_code,
                message: e.error_msg,
            });
        }
        data.response
            .and_then(|users| users.into_iter().next())
            .ok_or(ProfileError::NotFound(user_id))
    }
}

/// Look up a profile, degrading any failure to an empty profile.
pub async fn profile_or_default(lookup: &dyn ProfileLookup, user_id: i64) -> Profile {
    match lookup.get_profile(user_id).await {
        Ok(p) => p,
        Err(ProfileError::NoToken) => Profile::default(),
        Err(e) => {
            log::warn!("profile: lookup for vk user {} failed: {}", user_id, e);
            Profile::default()
        }
    }
}

/// Resolve VK method API base URL (env VK_API_BASE for tests or custom endpoints).
pub fn vk_api_base() -> String {
    std::env::var("VK_API_BASE")
        .ok()
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| VK_API_BASE.to_string())
}
