//! Event dispatch: verify and classify webhook events, queue `message_new` for bridging.
//!
//! The webhook handler only runs the synchronous stage ([`EventDispatcher::dispatch`]) and
//! answers right away. Bridging happens on the worker side of a bounded queue
//! ([`spawn_workers`]), with completion visible only in logs.

use crate::bridge::Bridge;
use crate::config::BridgeConfig;
use crate::vk::{
    profile_or_default, EventKind, InboundEvent, InboundMessage, ProfileLookup, Verdict,
    WebhookVerifier,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinHandle, JoinSet};

/// Generic acknowledgment body expected by the Callback API.
pub const ACK_OK: &str = "ok";

/// Response to the webhook transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    Ok,
    Confirmation(String),
}

impl Ack {
    pub fn body(&self) -> &str {
        match self {
            Ack::Ok => ACK_OK,
            Ack::Confirmation(token) => token,
        }
    }
}

/// One queued message, tagged with a delivery id for log correlation.
#[derive(Debug, Clone)]
pub struct BridgeJob {
    pub delivery_id: String,
    pub message: InboundMessage,
}

impl BridgeJob {
    pub fn new(message: InboundMessage) -> Self {
        Self {
            delivery_id: uuid::Uuid::new_v4().to_string(),
            message,
        }
    }
}

/// Bounded queue between the webhook handler and the workers.
pub fn job_queue(capacity: usize) -> (mpsc::Sender<BridgeJob>, mpsc::Receiver<BridgeJob>) {
    mpsc::channel(capacity.max(1))
}

pub struct EventDispatcher {
    verifier: WebhookVerifier,
    jobs: mpsc::Sender<BridgeJob>,
    enqueue_timeout: Duration,
}

impl EventDispatcher {
    pub fn new(
        verifier: WebhookVerifier,
        jobs: mpsc::Sender<BridgeJob>,
        enqueue_timeout: Duration,
    ) -> Self {
        Self {
            verifier,
            jobs,
            enqueue_timeout,
        }
    }

    /// Verify, classify and (for `message_new`) enqueue. Always acknowledges.
    pub async fn dispatch(&self, event: &InboundEvent) -> Ack {
        match self.verifier.verify(event) {
            Verdict::Confirm(token) => {
                log::info!("dispatch: answering confirmation handshake");
                return Ack::Confirmation(token);
            }
            Verdict::Reject(reason) => {
                log::warn!("dispatch: dropping {} event: {:?}", event.event_type, reason);
                return Ack::Ok;
            }
            Verdict::Accept => {}
        }

        match event.kind() {
            EventKind::MessageNew => match event.message() {
                Ok(message) => self.enqueue(message).await,
                Err(e) => log::warn!("dispatch: undecodable message_new payload: {}", e),
            },
            EventKind::Ignored => {
                log::debug!("dispatch: ignoring {}", event.event_type);
            }
            EventKind::Confirmation => {}
            EventKind::Unknown => {
                log::info!("dispatch: unhandled event {:?}", event.event_type);
            }
        }
        Ack::Ok
    }

    async fn enqueue(&self, message: InboundMessage) {
        let job = BridgeJob::new(message);
        let preview: String = job.message.text.chars().take(100).collect();
        log::info!(
            "dispatch: [{}] message from vk user {}: {}",
            job.delivery_id,
            job.message.sender_id,
            preview
        );
        let delivery_id = job.delivery_id.clone();
        let user_id = job.message.sender_id;
        match tokio::time::timeout(self.enqueue_timeout, self.jobs.send(job)).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => {
                log::error!("dispatch: [{}] job queue closed, dropping message from vk user {}", delivery_id, user_id);
            }
            Err(_) => {
                log::error!("dispatch: [{}] job queue full, dropping message from vk user {}", delivery_id, user_id);
            }
        }
    }
}

/// Runs one job: profile lookup, then the bridge, under a whole-job deadline.
pub struct Worker {
    bridge: Arc<Bridge>,
    profiles: Arc<dyn ProfileLookup>,
    process_timeout: Duration,
}

impl Worker {
    pub fn new(bridge: Arc<Bridge>, profiles: Arc<dyn ProfileLookup>, process_timeout: Duration) -> Self {
        Self {
            bridge,
            profiles,
            process_timeout,
        }
    }

    /// Process one message end to end. Failures are logged here; nothing propagates.
    pub async fn handle(&self, job: BridgeJob) -> bool {
        let user_id = job.message.sender_id;
        let run = async {
            let profile = profile_or_default(self.profiles.as_ref(), user_id).await;
            self.bridge.process(user_id, &profile, &job.message.text).await
        };
        match tokio::time::timeout(self.process_timeout, run).await {
            Ok(true) => {
                log::info!("worker: [{}] done for vk user {}", job.delivery_id, user_id);
                true
            }
            Ok(false) => {
                log::error!("worker: [{}] failed for vk user {}", job.delivery_id, user_id);
                false
            }
            Err(_) => {
                log::error!(
                    "worker: [{}] timed out after {:?} for vk user {}",
                    job.delivery_id,
                    self.process_timeout,
                    user_id
                );
                false
            }
        }
    }
}

/// Drain the job queue, running up to `max_concurrency` jobs at once. The returned task
/// finishes after the queue is closed and in-flight jobs complete.
pub fn spawn_workers(
    mut jobs: mpsc::Receiver<BridgeJob>,
    worker: Arc<Worker>,
    max_concurrency: usize,
) -> JoinHandle<()> {
    let limit = Arc::new(Semaphore::new(max_concurrency.max(1)));
    tokio::spawn(async move {
        let mut running = JoinSet::new();
        while let Some(job) = jobs.recv().await {
            let permit = match limit.clone().acquire_owned().await {
                Ok(p) => p,
                Err(_) => break,
            };
            let worker = worker.clone();
            running.spawn(async move {
                let _permit = permit;
                worker.handle(job).await
            });
            while let Some(done) = running.try_join_next() {
                log_join_failure(done);
            }
        }
        log::info!("worker: job queue closed, waiting for {} in-flight job(s)", running.len());
        while let Some(done) = running.join_next().await {
            log_join_failure(done);
        }
    })
}

fn log_join_failure(done: Result<bool, JoinError>) {
    if let Err(e) = done {
        log::error!("worker: job task failed: {}", e);
    }
}

/// Wire verifier, queue and worker pool from config. Returns the dispatcher and the worker task.
pub fn start(
    verifier: WebhookVerifier,
    worker: Arc<Worker>,
    config: &BridgeConfig,
) -> (EventDispatcher, JoinHandle<()>) {
    let (tx, rx) = job_queue(config.queue_capacity);
    let handle = spawn_workers(rx, worker, config.max_concurrency);
    (
        EventDispatcher::new(verifier, tx, config.enqueue_timeout()),
        handle,
    )
}
