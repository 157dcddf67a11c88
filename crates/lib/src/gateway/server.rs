//! Gateway HTTP server: VK callback plus operator endpoints (single port).

use crate::bridge::{Bridge, IdentityCache};
use crate::config::{self, Config};
use crate::dispatch::{self, BridgeJob, EventDispatcher, Worker, ACK_OK};
use crate::gateway::protocol::{
    now_iso, ApiStatus, Endpoints, HealthResponse, ServerStatus, StatusResponse, TestMessageRequest,
    TestResponse, VkStatus,
};
use crate::inbox::{self, InboxClient};
use crate::vk::{InboundEvent, InboundMessage, ProfileLookup, VkProfileClient, WebhookVerifier};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use std::collections::HashMap;
use std::sync::Arc;

const SERVICE_NAME: &str = "vk-inbox-bridge";
const DEFAULT_TEST_MESSAGE: &str = "Test message from VK integration";

/// Shared state for the gateway handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    pub dispatcher: Arc<EventDispatcher>,
    pub bridge: Arc<Bridge>,
    pub worker: Arc<Worker>,
}

/// Build the router over prepared state.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/vk/callback", post(vk_callback))
        .route("/vk/test", post(vk_test))
        .route("/vk/test-api", post(vk_test_api))
        .route("/vk/status", get(vk_status))
        .route("/vk/health", get(health_http))
        .with_state(state)
}

/// Run the gateway; binds to config.gateway.bind:config.gateway.port and blocks until
/// shutdown (Ctrl+C / SIGTERM). In-flight bridging jobs are awaited before returning.
pub async fn run_gateway(config: Config) -> Result<()> {
    config::warn_missing(&config);
    let inbox = InboxClient::from_config(&config.inbox).context("building inbox client")?;
    let profiles =
        VkProfileClient::from_config(&config).context("building VK profile client")?;
    if config::resolve_vk_token(&config).is_none() {
        log::warn!("gateway: VK_TOKEN not set; contacts are named by placeholder");
    }
    log::info!("gateway: inbox client initialized for {}", inbox.inbox_url());

    let cache = Arc::new(IdentityCache::with_max_entries(config.bridge.cache_max_entries));
    let bridge = Arc::new(Bridge::new(Arc::new(inbox), cache));
    let profiles: Arc<dyn ProfileLookup> = Arc::new(profiles);
    let worker = Arc::new(Worker::new(
        bridge.clone(),
        profiles,
        config.bridge.process_timeout(),
    ));
    let (dispatcher, workers) = dispatch::start(
        WebhookVerifier::from_config(&config),
        worker.clone(),
        &config.bridge,
    );

    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), config.gateway.port);
    let state = GatewayState {
        config: Arc::new(config),
        dispatcher: Arc::new(dispatcher),
        bridge,
        worker,
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped accepting requests, draining bridging jobs");
    if let Err(e) = workers.await {
        log::warn!("gateway: worker task ended abnormally: {}", e);
    }
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received");
}

/// POST /vk/callback: Callback API events. Always 200; body is "ok" or the confirmation string.
async fn vk_callback(
    State(state): State<GatewayState>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> String {
    log::debug!("gateway: vk callback received");
    let event = match InboundEvent::from_request(&body, query.get("type").map(String::as_str)) {
        Ok(e) => e,
        Err(e) => {
            log::warn!("gateway: unparseable callback body: {}", e);
            return ACK_OK.to_string();
        }
    };
    state.dispatcher.dispatch(&event).await.body().to_string()
}

/// POST /vk/test: run one job synchronously for a test user and message, under the job deadline.
async fn vk_test(State(state): State<GatewayState>, body: Bytes) -> Json<TestResponse> {
    let req: TestMessageRequest = if body.iter().all(|b| b.is_ascii_whitespace()) {
        TestMessageRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(r) => r,
            Err(e) => {
                let mut res = TestResponse::new(false, "", "");
                res.message = format!("invalid request body: {}", e);
                return Json(res);
            }
        }
    };
    let user_id = req.user_id.unwrap_or(state.config.vk.default_user_id);
    let text = req
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_TEST_MESSAGE.to_string());
    log::info!("gateway: manual test for vk user {}: {}", user_id, text);

    let job = BridgeJob::new(InboundMessage {
        sender_id: user_id,
        text,
    });
    let success = state.worker.handle(job).await;
    let mut res = TestResponse::new(
        success,
        "Test message processed through inbox API",
        "Failed to process test message",
    );
    res.user_id = Some(user_id);
    res.api_type = Some("application".to_string());
    Json(res)
}

/// POST /vk/test-api: inbox connectivity probe.
async fn vk_test_api(State(state): State<GatewayState>) -> Json<TestResponse> {
    let connected = inbox::probe(state.bridge.inbox().as_ref()).await;
    Json(TestResponse::new(
        connected,
        "Inbox API connection is working",
        "Failed to connect to inbox API",
    ))
}

/// GET /vk/status: configuration reflection plus a live probe.
async fn vk_status(State(state): State<GatewayState>) -> Json<StatusResponse> {
    let connected = inbox::probe(state.bridge.inbox().as_ref()).await;
    let config = &state.config;
    let base = config::resolve_webhook_url(config);
    Json(StatusResponse {
        status: "online".to_string(),
        timestamp: now_iso(),
        vk: VkStatus {
            group_id: config.vk.group_id,
            confirmation_code_set: config::resolve_confirmation(config).is_some(),
        },
        api: ApiStatus {
            connected,
            base_url: config.inbox.base_url.clone(),
            account_id: config.inbox.account_id,
            inbox_id: config.inbox.inbox_id,
        },
        server: ServerStatus {
            webhook_url: format!("{}/vk/callback", base),
            environment: config.server.environment.clone(),
        },
        endpoints: Endpoints::under(&base),
    })
}

/// GET / and GET /vk/health: liveness.
async fn health_http() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: now_iso(),
        service: SERVICE_NAME.to_string(),
    })
}
