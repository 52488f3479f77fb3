// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Subscription handle

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nostrmq::{Event, PublicKey, SubscriptionId};
use nostrmq_relay_pool::RelayPool;
use serde_json::Value;
use tokio::sync::mpsc;

/// A message delivered by the receive pipeline
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Decrypted application payload
    pub payload: Value,
    /// Author of the event
    pub sender: PublicKey,
    /// The raw event it arrived in
    pub event: Box<Event>,
}

/// Handle for an open receive subscription.
///
/// Holds the stream view and the `close` contract; the pool keeps the
/// actual subscription state, addressed by id.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    pool: RelayPool,
    closed: Arc<AtomicBool>,
    rx: mpsc::Receiver<IncomingMessage>,
}

impl Subscription {
    pub(crate) fn new(
        id: SubscriptionId,
        pool: RelayPool,
        closed: Arc<AtomicBool>,
        rx: mpsc::Receiver<IncomingMessage>,
    ) -> Self {
        Self {
            id,
            pool,
            closed,
            rx,
        }
    }

    /// Subscription id
    #[inline]
    pub fn id(&self) -> &SubscriptionId {
        &self.id
    }

    /// Next message, or `None` once the subscription is closed
    pub async fn recv(&mut self) -> Option<IncomingMessage> {
        self.rx.recv().await
    }

    /// Check if [`close`](Self::close) already ran
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Close the subscription: cancel it on every relay it was sent to,
    /// disconnect the pool, and end the stream view. Idempotent.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        close_subscription(&self.pool, self.id.clone()).await;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        // Dropping the handle must release relay-side state too; finish the
        // close on the runtime when there is one.
        let pool = self.pool.clone();
        let id = self.id.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                close_subscription(&pool, id).await;
            });
        }
    }
}

async fn close_subscription(pool: &RelayPool, id: SubscriptionId) {
    if let Err(e) = pool.unsubscribe(id.clone(), None).await {
        tracing::debug!(id = %id, error = %e, "Failed to unsubscribe.");
    }
    pool.shutdown().await;
}
