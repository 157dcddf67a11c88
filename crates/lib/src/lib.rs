//! VK → inbox bridge library: webhook verification and dispatch, contact and
//! conversation resolution, message forwarding, and the HTTP gateway used by the CLI.

pub mod bridge;
pub mod config;
pub mod dispatch;
pub mod gateway;
pub mod inbox;
pub mod vk;
