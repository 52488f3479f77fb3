// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Relay
//!
//! One websocket to one relay: framing, liveness, backoff/reconnect, and
//! subscription replay.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use nostrmq::{Event, Filter, RelayMessage, RelayUrl, SubscriptionId};
use tokio::sync::broadcast;

mod constants;
mod error;
mod inner;
pub mod options;
mod stats;
mod status;

pub use self::constants::{DEFAULT_CONNECTION_TIMEOUT, DEFAULT_SEND_TIMEOUT};
pub use self::error::Error;
use self::inner::InnerRelay;
pub use self::options::RelayOptions;
pub use self::stats::RelayConnectionStats;
pub use self::status::RelayStatus;
use crate::transport::WebSocketTransport;

/// Relay notification
#[derive(Debug, Clone)]
pub enum RelayNotification {
    /// Received an event on a subscription
    Event {
        /// Subscription ID
        subscription_id: SubscriptionId,
        /// Event
        event: Box<Event>,
    },
    /// Received a relay message
    Message {
        /// Relay message
        message: RelayMessage,
    },
    /// Relay status changed
    RelayStatus {
        /// Status
        status: RelayStatus,
    },
    /// Relay is shutting down
    Shutdown,
}

/// A single relay connection
#[derive(Debug, Clone)]
pub struct Relay {
    pub(crate) inner: InnerRelay,
}

impl PartialEq for Relay {
    fn eq(&self, other: &Self) -> bool {
        self.url() == other.url()
    }
}

impl Eq for Relay {}

impl Relay {
    /// New relay over a custom transport
    pub fn with_transport(
        url: RelayUrl,
        transport: Arc<dyn WebSocketTransport>,
        opts: RelayOptions,
    ) -> Self {
        Self {
            inner: InnerRelay::new(url, transport, opts),
        }
    }

    /// Get relay url
    #[inline]
    pub fn url(&self) -> &RelayUrl {
        &self.inner.url
    }

    /// Get relay status
    #[inline]
    pub fn status(&self) -> RelayStatus {
        self.inner.status()
    }

    /// Check if relay is connected
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    /// Get connection stats
    #[inline]
    pub fn stats(&self) -> &RelayConnectionStats {
        &self.inner.stats
    }

    /// Get a new notification listener
    #[inline]
    pub fn notifications(&self) -> broadcast::Receiver<RelayNotification> {
        self.inner.internal_notification_sender.subscribe()
    }

    /// Connect in the background and keep the connection alive
    #[inline]
    pub fn connect(&self) {
        self.inner.connect()
    }

    /// Connect and wait for the first attempt to resolve
    #[inline]
    pub async fn try_connect(&self, timeout: Duration) -> Result<(), Error> {
        self.inner.try_connect(timeout).await
    }

    /// Terminate the connection and its auto-connect loop
    #[inline]
    pub fn disconnect(&self) {
        self.inner.disconnect()
    }

    /// Send a raw client message
    #[inline]
    pub fn send_msg(&self, msg: nostrmq::ClientMessage) -> Result<(), Error> {
        self.inner.send_msg(msg)
    }

    /// Send an `EVENT` and wait for the matching `OK`
    #[inline]
    pub async fn send_event(&self, event: &Event) -> Result<(), Error> {
        self.inner.send_event(event).await
    }

    /// Subscribe; the REQ is replayed on every reconnection while the
    /// subscription is active
    #[inline]
    pub async fn subscribe_with_id(
        &self,
        id: SubscriptionId,
        filters: Vec<Filter>,
    ) -> Result<(), Error> {
        self.inner.subscribe_with_id(id, filters).await
    }

    /// Remove the subscription and send `CLOSE`
    #[inline]
    pub async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), Error> {
        self.inner.unsubscribe(id).await
    }

    /// Get active subscriptions
    #[inline]
    pub async fn subscriptions(&self) -> HashMap<SubscriptionId, Vec<Filter>> {
        self.inner.subscriptions().await
    }

    pub(crate) fn set_notification_sender(
        &self,
        sender: broadcast::Sender<crate::pool::RelayPoolNotification>,
    ) -> Result<(), Error> {
        self.inner.set_notification_sender(sender)
    }
}
