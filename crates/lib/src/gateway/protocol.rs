//! Gateway HTTP request/response bodies for the operator endpoints.

use serde::{Deserialize, Serialize};

/// POST /vk/test body: both fields optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestMessageRequest {
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Outcome of a manual test or connectivity probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResponse {
    /// "success" or "error".
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_type: Option<String>,
    pub timestamp: String,
}

impl TestResponse {
    pub fn new(success: bool, ok_message: &str, err_message: &str) -> Self {
        Self {
            status: if success { "success" } else { "error" }.to_string(),
            message: if success { ok_message } else { err_message }.to_string(),
            user_id: None,
            api_type: None,
            timestamp: now_iso(),
        }
    }
}

/// GET /vk/health and GET / body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub service: String,
}

/// GET /vk/status body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub timestamp: String,
    pub vk: VkStatus,
    pub api: ApiStatus,
    pub server: ServerStatus,
    pub endpoints: Endpoints,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VkStatus {
    pub group_id: i64,
    pub confirmation_code_set: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiStatus {
    pub connected: bool,
    pub base_url: Option<String>,
    pub account_id: i64,
    pub inbox_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerStatus {
    pub webhook_url: String,
    pub environment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoints {
    pub vk_callback: String,
    pub test: String,
    pub test_api: String,
    pub status: String,
}

impl Endpoints {
    /// Endpoint URLs under the public base URL (may be empty).
    pub fn under(base: &str) -> Self {
        Self {
            vk_callback: format!("{}/vk/callback", base),
            test: format!("{}/vk/test", base),
            test_api: format!("{}/vk/test-api", base),
            status: format!("{}/vk/status", base),
        }
    }
}

/// RFC 3339 UTC timestamp with milliseconds.
pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
