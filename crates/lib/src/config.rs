//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.vk-bridge/config.json`) and environment.
//! Environment variables win over file values so deployments can keep secrets out of the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP gateway bind and port.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// VK community (Callback API) settings.
    #[serde(default)]
    pub vk: VkConfig,

    /// Remote inbox (client API) settings.
    #[serde(default)]
    pub inbox: InboxConfig,

    /// Job queue, worker and cache limits.
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Public-facing server info, reported by the status endpoint.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP (default 3000). Overridden by PORT env.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "0.0.0.0"; VK must be able to reach the callback).
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    3000
}

fn default_gateway_bind() -> String {
    "0.0.0.0".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// VK community settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VkConfig {
    /// Community access token, used for users.get profile lookups. Overridden by VK_TOKEN env.
    pub token: Option<String>,
    /// String VK expects back from the `confirmation` event. Overridden by VK_CONFIRMATION env.
    pub confirmation: Option<String>,
    /// Community id; events for any other group are dropped. Overridden by VK_GROUP_ID env.
    #[serde(default)]
    pub group_id: i64,
    /// VK API version for method calls. Overridden by VK_API_VERSION env.
    #[serde(default = "default_vk_api_version")]
    pub api_version: String,
    /// Callback API secret key. When set, events must carry the same `secret`. Overridden by VK_SECRET env.
    pub secret: Option<String>,
    /// User id used by the manual test endpoint when the request names none.
    #[serde(default = "default_test_user_id")]
    pub default_user_id: i64,
}

fn default_vk_api_version() -> String {
    "5.199".to_string()
}

fn default_test_user_id() -> i64 {
    506175275
}

impl Default for VkConfig {
    fn default() -> Self {
        Self {
            token: None,
            confirmation: None,
            group_id: 0,
            api_version: default_vk_api_version(),
            secret: None,
            default_user_id: default_test_user_id(),
        }
    }
}

/// Remote inbox settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxConfig {
    /// Inbox server root, e.g. `https://support.example.com`. Overridden by API_BASE_URL env.
    pub base_url: Option<String>,
    /// Public inbox identifier used in client API paths. Overridden by INBOX_IDENTIFIER env.
    pub inbox_identifier: Option<String>,
    /// Account id (reported by status only). Overridden by ACCOUNT_ID env.
    #[serde(default = "default_account_id")]
    pub account_id: i64,
    /// Numeric inbox id (reported by status only). Overridden by INBOX_ID env.
    pub inbox_id: Option<i64>,
    /// Per-request timeout for every outbound call, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_account_id() -> i64 {
    1
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            inbox_identifier: None,
            account_id: default_account_id(),
            inbox_id: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl InboxConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Limits for the asynchronous bridging stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Bounded job queue between the webhook handler and the workers.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Maximum bridging jobs running at once.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Deadline for one whole job (profile lookup, contact, conversation, message).
    #[serde(default = "default_process_timeout_secs")]
    pub process_timeout_secs: u64,
    /// How long the webhook handler waits for queue capacity before dropping a job.
    #[serde(default = "default_enqueue_timeout_ms")]
    pub enqueue_timeout_ms: u64,
    /// Identity cache ceiling; mappings beyond it are resolved remotely every time.
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,
}

fn default_queue_capacity() -> usize {
    64
}

fn default_max_concurrency() -> usize {
    8
}

fn default_process_timeout_secs() -> u64 {
    25
}

fn default_enqueue_timeout_ms() -> u64 {
    500
}

fn default_cache_max_entries() -> usize {
    100_000
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            max_concurrency: default_max_concurrency(),
            process_timeout_secs: default_process_timeout_secs(),
            enqueue_timeout_ms: default_enqueue_timeout_ms(),
            cache_max_entries: default_cache_max_entries(),
        }
    }
}

impl BridgeConfig {
    pub fn process_timeout(&self) -> Duration {
        Duration::from_secs(self.process_timeout_secs.max(1))
    }

    pub fn enqueue_timeout(&self) -> Duration {
        Duration::from_millis(self.enqueue_timeout_ms)
    }
}

/// Public URL and environment name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Public base URL the gateway is reachable at. Overridden by WEBHOOK_URL env.
    pub webhook_url: Option<String>,
    /// Deployment environment label. Overridden by NODE_ENV or ENVIRONMENT env.
    pub environment: Option<String>,
}

/// Read an env var, trimmed; empty counts as unset.
fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

/// Raw value for tokens that must round-trip exactly; only an empty value is unset.
fn env_exact(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env_non_empty(name)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("config: ignoring {}={:?} (not a valid number)", name, raw);
            None
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Apply environment overrides on top of file values.
pub fn apply_env_overrides(config: &mut Config) {
    if let Some(port) = env_parsed("PORT") {
        config.gateway.port = port;
    }
    if let Some(v) = env_non_empty("VK_TOKEN") {
        config.vk.token = Some(v);
    }
    if let Some(v) = env_exact("VK_CONFIRMATION") {
        config.vk.confirmation = Some(v);
    }
    if let Some(v) = env_parsed("VK_GROUP_ID") {
        config.vk.group_id = v;
    }
    if let Some(v) = env_non_empty("VK_API_VERSION") {
        config.vk.api_version = v;
    }
    if let Some(v) = env_non_empty("VK_SECRET") {
        config.vk.secret = Some(v);
    }
    if let Some(v) = env_non_empty("API_BASE_URL") {
        config.inbox.base_url = Some(v);
    }
    if let Some(v) = env_non_empty("INBOX_IDENTIFIER") {
        config.inbox.inbox_identifier = Some(v);
    }
    if let Some(v) = env_parsed("INBOX_ID") {
        config.inbox.inbox_id = Some(v);
    }
    if let Some(v) = env_parsed("ACCOUNT_ID") {
        config.inbox.account_id = v;
    }
    if let Some(v) = env_non_empty("WEBHOOK_URL") {
        config.server.webhook_url = Some(v);
    }
    if let Some(v) = env_non_empty("NODE_ENV").or_else(|| env_non_empty("ENVIRONMENT")) {
        config.server.environment = Some(v);
    }
}

/// Confirmation string exactly as configured; None only when unset or empty.
pub fn resolve_confirmation(config: &Config) -> Option<String> {
    config.vk.confirmation.clone().filter(|s| !s.is_empty())
}

/// Callback secret, trimmed; None when unset or blank (secret check disabled).
pub fn resolve_secret(config: &Config) -> Option<String> {
    non_empty(&config.vk.secret)
}

/// VK access token, trimmed; None disables profile lookups.
pub fn resolve_vk_token(config: &Config) -> Option<String> {
    non_empty(&config.vk.token)
}

/// Public base URL without a trailing slash (empty when unset).
pub fn resolve_webhook_url(config: &Config) -> String {
    non_empty(&config.server.webhook_url)
        .map(|u| u.trim_end_matches('/').to_string())
        .unwrap_or_default()
}

/// Log warnings for settings the bridge cannot work without. Not fatal: the
/// gateway still answers confirmation and health checks.
pub fn warn_missing(config: &Config) {
    if non_empty(&config.inbox.inbox_identifier).is_none() {
        log::warn!("config: inbox identifier is not configured (INBOX_IDENTIFIER)");
    }
    if non_empty(&config.inbox.base_url).is_none() {
        log::warn!("config: inbox base url is not configured (API_BASE_URL)");
    }
    if resolve_confirmation(config).is_none() {
        log::warn!("config: VK confirmation string is not configured (VK_CONFIRMATION)");
    }
    if config.vk.group_id == 0 {
        log::warn!("config: VK group id is not configured (VK_GROUP_ID); group check accepts only group_id 0");
    }
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("VK_BRIDGE_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".vk-bridge").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path (or the default), then apply environment overrides.
/// Missing file => defaults plus environment.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let mut config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    apply_env_overrides(&mut config);
    Ok((config, path))
}
