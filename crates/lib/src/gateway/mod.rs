//! Gateway: HTTP entry point for VK callbacks and operator endpoints.
//!
//! `POST /vk/callback` always answers 200 with "ok" (or the confirmation string);
//! bridging runs on background workers. `/vk/test`, `/vk/test-api`, `/vk/status` and
//! `/vk/health` are for operators.

mod protocol;
mod server;

pub use protocol::{HealthResponse, StatusResponse, TestMessageRequest, TestResponse};
pub use server::{router, run_gateway, GatewayState};
