//! Subscriber sink abstraction
//!
//! The hub pushes events through a [`SubscriberSink`]; the concrete sink is
//! whatever carries events to a display (an mpsc channel here, a socket in a
//! fuller deployment). Delivery failures never surface to command callers.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use shared::order::OrderEvent;

/// Why a delivery to one subscriber failed. Confined to the hub: the
/// subscriber gets dropped, the publish itself never fails.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("subscriber channel closed")]
    Closed,

    #[error("subscriber send timed out")]
    Timeout,
}

/// One connected event consumer.
#[async_trait]
pub trait SubscriberSink: Send + Sync {
    async fn send(&self, event: &OrderEvent) -> Result<(), DeliveryError>;
}

/// Channel-backed sink; the receiving half belongs to the display session.
pub struct ChannelSubscriber {
    tx: mpsc::Sender<OrderEvent>,
}

impl ChannelSubscriber {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<OrderEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl SubscriberSink for ChannelSubscriber {
    async fn send(&self, event: &OrderEvent) -> Result<(), DeliveryError> {
        self.tx
            .send(event.clone())
            .await
            .map_err(|_| DeliveryError::Closed)
    }
}
