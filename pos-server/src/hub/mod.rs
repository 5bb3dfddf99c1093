//! Event fan-out hub
//!
//! Committed events enter through [`FanoutHub::publish`] and reach every
//! registered subscriber. Publish is synchronous and infallible: it hands the
//! event to a broadcast channel and returns. A forwarder task per subscriber
//! drains its own receiver, so one slow display never blocks the others or
//! the command path. A subscriber whose sink closes or times out is removed;
//! the stream to everyone else keeps flowing.
//!
//! Per-subscriber ordering: the broadcast channel preserves send order for
//! each receiver, and the manager publishes under its command lock, so every
//! subscriber observes events in commit order.

pub mod subscriber;

pub use subscriber::{ChannelSubscriber, DeliveryError, SubscriberSink};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use shared::order::OrderEvent;

#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Broadcast buffer depth; a subscriber that falls further behind than
    /// this misses events and resyncs from storage on reconnect.
    pub channel_capacity: usize,
    /// Budget for one delivery before the subscriber is dropped.
    pub send_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            send_timeout: Duration::from_secs(5),
        }
    }
}

struct SubscriberHandle {
    cancel: CancellationToken,
    /// Identifies which forwarder owns this registration; a stale forwarder
    /// must not remove a successor registered under the same id.
    epoch: u64,
}

pub struct FanoutHub {
    tx: broadcast::Sender<OrderEvent>,
    subscribers: Arc<DashMap<String, SubscriberHandle>>,
    config: HubConfig,
    shutdown: CancellationToken,
    epoch: AtomicU64,
}

impl FanoutHub {
    pub fn new(config: HubConfig) -> Self {
        let (tx, _) = broadcast::channel(config.channel_capacity);
        Self {
            tx,
            subscribers: Arc::new(DashMap::new()),
            config,
            shutdown: CancellationToken::new(),
            epoch: AtomicU64::new(0),
        }
    }

    /// Register a subscriber and start forwarding to it. Events published
    /// before registration are not replayed; a joining display loads current
    /// state from storage first. Re-registering an id replaces the previous
    /// subscription: a display that reconnects under its stable id gets the
    /// new sink, and the old forwarder is stopped.
    pub fn subscribe(&self, id: impl Into<String>, sink: Arc<dyn SubscriberSink>) {
        let id = id.into();
        let epoch = self.epoch.fetch_add(1, Ordering::Relaxed);
        let cancel = self.shutdown.child_token();
        if let Some(old) = self.subscribers.insert(
            id.clone(),
            SubscriberHandle {
                cancel: cancel.clone(),
                epoch,
            },
        ) {
            old.cancel.cancel();
            debug!(subscriber = %id, "Replacing existing subscription");
        }
        info!(subscriber = %id, "Subscriber registered");

        let rx = self.tx.subscribe();
        let subscribers = Arc::clone(&self.subscribers);
        let send_timeout = self.config.send_timeout;
        tokio::spawn(forward_loop(
            id,
            epoch,
            sink,
            rx,
            cancel,
            subscribers,
            send_timeout,
        ));
    }

    /// Remove a subscriber. Unknown ids are a no-op.
    pub fn unsubscribe(&self, id: &str) {
        if let Some((_, handle)) = self.subscribers.remove(id) {
            handle.cancel.cancel();
            info!(subscriber = %id, "Subscriber removed");
        }
    }

    /// Hand one committed event to every subscriber's forwarder.
    ///
    /// Never fails: with no subscribers the event is simply dropped, and a
    /// misbehaving subscriber is the forwarder's problem, not the caller's.
    pub fn publish(&self, event: &OrderEvent) {
        trace!(sequence = event.sequence, kind = %event.kind(), "Publishing event");
        let _ = self.tx.send(event.clone());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Stop every forwarder task.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.subscribers.clear();
    }
}

impl Default for FanoutHub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}

async fn forward_loop(
    id: String,
    epoch: u64,
    sink: Arc<dyn SubscriberSink>,
    mut rx: broadcast::Receiver<OrderEvent>,
    cancel: CancellationToken,
    subscribers: Arc<DashMap<String, SubscriberHandle>>,
    send_timeout: Duration,
) {
    // Only this forwarder's own registration may be reaped: the id could
    // already belong to a replacement subscription.
    let reap = |subscribers: &DashMap<String, SubscriberHandle>| {
        subscribers.remove_if(&id, |_, handle| handle.epoch == epoch);
    };
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            recv = rx.recv() => match recv {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    // Skip, keep forwarding from here; the display resyncs
                    // from storage when it notices the sequence gap
                    warn!(subscriber = %id, missed, "Subscriber lagged, events skipped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        };

        match timeout(send_timeout, sink.send(&event)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(subscriber = %id, %err, "Delivery failed, dropping subscriber");
                reap(&subscribers);
                break;
            }
            Err(_) => {
                warn!(subscriber = %id, "Delivery timed out, dropping subscriber");
                reap(&subscribers);
                break;
            }
        }
    }
    debug!(subscriber = %id, "Forwarder stopped");
}
