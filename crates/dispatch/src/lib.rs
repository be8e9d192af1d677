//! Fire-and-forget webhook delivery.
//!
//! Events are enqueued onto a bounded channel and drained by a fixed
//! worker pool; each job fans out one POST per target URL concurrently.
//! There is no retry, no outbox and no durable queue: a failed delivery
//! is logged at debug level and dropped. The bounded queue keeps a burst
//! of mutations from spawning unbounded outbound work.

use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

/// Dispatcher tuning. The defaults match the usual deployment: 10 s per
/// delivery, 30 s per event fan-out.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Hard timeout for a single outbound POST.
    pub request_timeout: Duration,
    /// Overall budget for one job (all targets of one event).
    pub dispatch_timeout: Duration,
    pub workers: usize,
    pub queue_capacity: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            dispatch_timeout: Duration::from_secs(30),
            workers: 4,
            queue_capacity: 1024,
        }
    }
}

/// One event's delivery work: a serialized payload and the sink URLs
/// subscribed to it.
#[derive(Debug)]
pub struct DispatchJob {
    pub targets: Vec<String>,
    pub payload: Bytes,
}

/// Lock-free delivery counters.
#[derive(Debug, Default)]
struct DispatchStatsAtomic {
    enqueued: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

/// Snapshot of the dispatcher counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub enqueued: u64,
    pub delivered: u64,
    pub failed: u64,
    pub dropped: u64,
}

/// Asynchronous webhook fan-out with a bounded in-memory queue.
///
/// Cloning shares the queue and workers. Dropping the last handle closes
/// the queue and the workers exit after draining it.
#[derive(Clone)]
pub struct WebhookDispatcher {
    sender: mpsc::Sender<DispatchJob>,
    stats: Arc<DispatchStatsAtomic>,
}

impl WebhookDispatcher {
    /// Spawn the worker pool. Must be called within a tokio runtime.
    pub fn new(config: DispatcherConfig) -> Self {
        let (sender, receiver) = mpsc::channel::<DispatchJob>(config.queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let stats = Arc::new(DispatchStatsAtomic::default());
        let client = reqwest::Client::new();

        for worker in 0..config.workers.max(1) {
            let receiver = receiver.clone();
            let client = client.clone();
            let stats = stats.clone();
            let request_timeout = config.request_timeout;
            let dispatch_timeout = config.dispatch_timeout;

            tokio::spawn(async move {
                loop {
                    let job = { receiver.lock().await.recv().await };
                    let Some(job) = job else {
                        debug!("webhook worker {} shutting down", worker);
                        break;
                    };
                    let delivery = deliver(&client, &job, request_timeout, &stats);
                    if tokio::time::timeout(dispatch_timeout, delivery).await.is_err() {
                        warn!(
                            "webhook dispatch timed out after {:?} ({} targets)",
                            dispatch_timeout,
                            job.targets.len()
                        );
                    }
                }
            });
        }

        Self { sender, stats }
    }

    /// Queue one event for delivery. Never blocks: when the queue is
    /// full the event is dropped with a warning, which is acceptable
    /// loss for fire-and-forget delivery.
    pub fn enqueue(&self, targets: Vec<String>, payload: Bytes) {
        if targets.is_empty() {
            return;
        }
        let count = targets.len();
        match self.sender.try_send(DispatchJob { targets, payload }) {
            Ok(()) => {
                self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("webhook queue full, dropping event for {} targets", count);
            }
        }
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            enqueued: self.stats.enqueued.load(Ordering::Relaxed),
            delivered: self.stats.delivered.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
            dropped: self.stats.dropped.load(Ordering::Relaxed),
        }
    }
}

async fn deliver(
    client: &reqwest::Client,
    job: &DispatchJob,
    request_timeout: Duration,
    stats: &DispatchStatsAtomic,
) {
    let posts = job.targets.iter().map(|url| {
        let payload = job.payload.clone();
        async move {
            match client
                .post(url.as_str())
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .timeout(request_timeout)
                .body(payload)
                .send()
                .await
            {
                Ok(resp) => {
                    debug!("webhook sent to {}: {}", url, resp.status());
                    stats.delivered.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    debug!("webhook failed for {}: {}", url, e);
                    stats.failed.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    });
    futures::future::join_all(posts).await;
}
