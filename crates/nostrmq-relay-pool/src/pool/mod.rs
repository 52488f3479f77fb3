// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Relay Pool
//!
//! Owns N relay connections, multiplexes subscriptions across them and
//! publishes events to a relay subset with per-relay acknowledgement.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use nostrmq::{Event, Filter, RelayMessage, RelayUrl, SubscriptionId};
use tokio::sync::broadcast;

mod error;
mod inner;
pub mod options;
mod output;

pub use self::error::Error;
use self::inner::{InnerRelayPool, SubscriptionRecord};
pub use self::options::RelayPoolOptions;
pub use self::output::Output;
use crate::relay::{Relay, RelayOptions};
use crate::transport::{DefaultWebsocketTransport, WebSocketTransport};

/// Relay pool notification
#[derive(Debug, Clone)]
pub enum RelayPoolNotification {
    /// Received an event on a subscription, tagged with its source relay.
    ///
    /// The pool does not deduplicate across relays.
    Event {
        /// Source relay
        relay_url: RelayUrl,
        /// Subscription ID
        subscription_id: SubscriptionId,
        /// Event
        event: Box<Event>,
    },
    /// Received a relay message
    Message {
        /// Source relay
        relay_url: RelayUrl,
        /// Relay message
        message: RelayMessage,
    },
    /// The pool was shut down
    Shutdown,
}

/// Relay Pool
#[derive(Debug, Clone)]
pub struct RelayPool {
    inner: Arc<InnerRelayPool>,
}

impl Default for RelayPool {
    fn default() -> Self {
        Self::new(RelayPoolOptions::default())
    }
}

impl RelayPool {
    /// New relay pool with the default websocket transport
    pub fn new(opts: RelayPoolOptions) -> Self {
        Self::with_transport(opts, Arc::new(DefaultWebsocketTransport))
    }

    /// New relay pool over a custom transport
    pub fn with_transport(opts: RelayPoolOptions, transport: Arc<dyn WebSocketTransport>) -> Self {
        Self {
            inner: Arc::new(InnerRelayPool::new(opts, transport)),
        }
    }

    /// Get a new notification listener
    #[inline]
    pub fn notifications(&self) -> broadcast::Receiver<RelayPoolNotification> {
        self.inner.notification_sender.subscribe()
    }

    fn check_shutdown(&self) -> Result<(), Error> {
        if self.inner.shutdown.load(Ordering::SeqCst) {
            return Err(Error::Shutdown);
        }
        Ok(())
    }

    /// Get relays
    pub async fn relays(&self) -> HashMap<RelayUrl, Relay> {
        self.inner.relays.read().await.clone()
    }

    /// Get a relay by url
    pub async fn relay(&self, url: &RelayUrl) -> Result<Relay, Error> {
        let relays = self.inner.relays.read().await;
        relays.get(url).cloned().ok_or_else(|| Error::RelayNotFound {
            url: url.clone(),
        })
    }

    /// Add a relay.
    ///
    /// Active subscriptions targeting it are installed right away; if the
    /// pool has already been connected, the relay starts connecting
    /// immediately. Returns `false` if the url was already present.
    pub async fn add_relay(&self, url: RelayUrl) -> Result<bool, Error> {
        let opts: RelayOptions = self.inner.opts.relay.clone();
        self.add_relay_with_opts(url, opts).await
    }

    /// Add a relay with custom options
    pub async fn add_relay_with_opts(
        &self,
        url: RelayUrl,
        opts: RelayOptions,
    ) -> Result<bool, Error> {
        self.check_shutdown()?;

        let mut relays = self.inner.relays.write().await;
        if relays.contains_key(&url) {
            return Ok(false);
        }

        let relay = Relay::with_transport(url.clone(), self.inner.transport.clone(), opts);
        relay.set_notification_sender(self.inner.notification_sender.clone())?;

        // Install subscriptions that target this relay
        {
            let subscriptions = self.inner.subscriptions.read().await;
            for (id, record) in subscriptions.iter() {
                if record.applies_to(&url) {
                    if let Err(e) = relay
                        .subscribe_with_id(id.clone(), record.filters.clone())
                        .await
                    {
                        tracing::error!(url = %url, id = %id, error = %e, "Failed to install subscription.");
                    }
                }
            }
        }

        if self.inner.started.load(Ordering::SeqCst) {
            relay.connect();
        }

        relays.insert(url, relay);
        Ok(true)
    }

    /// Disconnect and remove a relay
    pub async fn remove_relay(&self, url: &RelayUrl) -> Result<(), Error> {
        let mut relays = self.inner.relays.write().await;
        if let Some(relay) = relays.remove(url) {
            relay.disconnect();
        }
        Ok(())
    }

    /// Connect the pool: resolves as soon as **one** relay completes a
    /// handshake. Other relays keep connecting (and retrying) in the
    /// background; failing only if every relay fails.
    pub async fn connect(&self, timeout: Duration) -> Result<(), Error> {
        self.check_shutdown()?;
        self.inner.started.store(true, Ordering::SeqCst);

        let relays = self.relays().await;
        if relays.is_empty() {
            return Err(Error::NoRelays);
        }

        if relays.values().any(|relay| relay.is_connected()) {
            return Ok(());
        }

        let mut attempts = FuturesUnordered::new();
        for relay in relays.into_values() {
            attempts.push(async move { relay.try_connect(timeout).await });
        }

        while let Some(result) = attempts.next().await {
            if result.is_ok() {
                return Ok(());
            }
        }

        Err(Error::NoRelayConnected)
    }

    /// Terminate all connections, keeping the relay set
    pub async fn disconnect(&self) {
        let relays = self.relays().await;
        for relay in relays.values() {
            relay.disconnect();
        }
    }

    /// Shut the pool down: close every socket, cancel reconnect timers,
    /// drop every relay and notify consumers. Idempotent.
    pub async fn shutdown(&self) {
        if self.inner.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut relays = self.inner.relays.write().await;
        for relay in relays.values() {
            relay.disconnect();
        }
        relays.clear();
        drop(relays);

        let _ = self
            .inner
            .notification_sender
            .send(RelayPoolNotification::Shutdown);
    }

    /// Check if the pool was shut down
    #[inline]
    pub fn is_shutdown(&self) -> bool {
        self.inner.shutdown.load(Ordering::SeqCst)
    }

    /// Publish an event to `targets` (default: every relay) and collect
    /// per-relay acknowledgement.
    ///
    /// Every target gets the `EVENT` concurrently; one relay's failure
    /// never aborts the others. The call resolves as soon as the first
    /// relay accepts; stragglers are reported with whatever outcome they
    /// had at that point, not awaited.
    pub async fn publish(
        &self,
        event: Event,
        targets: Option<Vec<RelayUrl>>,
    ) -> Result<Output, Error> {
        use futures_util::FutureExt;

        self.check_shutdown()?;

        let relays = self.relays().await;
        if relays.is_empty() {
            return Err(Error::NoRelays);
        }

        let urls: HashSet<RelayUrl> = match targets {
            Some(urls) => {
                if urls.is_empty() {
                    return Err(Error::NoRelaysSpecified);
                }
                urls.into_iter().collect()
            }
            None => relays.keys().cloned().collect(),
        };

        let mut output = Output::default();
        let mut pending: HashSet<RelayUrl> = HashSet::with_capacity(urls.len());
        let mut sends = FuturesUnordered::new();

        for url in urls.into_iter() {
            match relays.get(&url) {
                Some(relay) => {
                    let relay = relay.clone();
                    let event = event.clone();
                    pending.insert(url.clone());
                    sends.push(async move {
                        let result = relay.send_event(&event).await;
                        (url, result)
                    });
                }
                None => {
                    output.failed.insert(url, String::from("relay not found"));
                }
            }
        }

        while let Some((url, result)) = sends.next().await {
            pending.remove(&url);
            match result {
                Ok(()) => {
                    output.success.insert(url);
                    // First accept wins
                    break;
                }
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, "Event not acknowledged.");
                    output.failed.insert(url, e.to_string());
                }
            }
        }

        // Harvest outcomes that are already in, without waiting for the rest
        while let Some(Some((url, result))) = sends.next().now_or_never() {
            pending.remove(&url);
            match result {
                Ok(()) => {
                    output.success.insert(url);
                }
                Err(e) => {
                    output.failed.insert(url, e.to_string());
                }
            }
        }

        for url in pending.into_iter() {
            output
                .failed
                .insert(url, String::from("no acknowledgement received"));
        }

        Ok(output)
    }

    /// Subscribe on `targets` (default: every relay, current and future).
    ///
    /// The subscription is recorded and replayed to any matching relay that
    /// (re)enters the connected state while it stays active.
    pub async fn subscribe(
        &self,
        id: SubscriptionId,
        filters: Vec<Filter>,
        targets: Option<Vec<RelayUrl>>,
    ) -> Result<(), Error> {
        self.check_shutdown()?;

        if filters.is_empty() {
            return Err(Error::Relay(crate::relay::Error::FiltersEmpty));
        }

        let targets: Option<HashSet<RelayUrl>> = targets.map(|t| t.into_iter().collect());

        {
            let mut subscriptions = self.inner.subscriptions.write().await;
            subscriptions.insert(
                id.clone(),
                SubscriptionRecord {
                    filters: filters.clone(),
                    targets: targets.clone(),
                    active: true,
                },
            );
        }

        let relays = self.relays().await;
        for (url, relay) in relays.iter() {
            let applies: bool = match &targets {
                Some(targets) => targets.contains(url),
                None => true,
            };
            if applies {
                if let Err(e) = relay.subscribe_with_id(id.clone(), filters.clone()).await {
                    tracing::error!(url = %url, id = %id, error = %e, "Failed to subscribe.");
                }
            }
        }

        Ok(())
    }

    /// Close the subscription on `targets` (default: everywhere).
    ///
    /// When no target relays remain, the subscription record is removed
    /// entirely.
    pub async fn unsubscribe(
        &self,
        id: SubscriptionId,
        targets: Option<Vec<RelayUrl>>,
    ) -> Result<(), Error> {
        // Lock order is always relays before subscriptions; grab the
        // snapshot before touching the subscription table.
        let relays = self.relays().await;

        let close_on: Vec<RelayUrl> = {
            let mut subscriptions = self.inner.subscriptions.write().await;
            if !subscriptions.contains_key(&id) {
                return Ok(());
            }
            match targets {
                None => {
                    subscriptions.remove(&id);
                    relays.keys().cloned().collect()
                }
                Some(urls) => {
                    // Narrow an "all relays" record to the survivors
                    let all: HashSet<RelayUrl> = relays.keys().cloned().collect();
                    let mut exhausted: bool = false;
                    if let Some(record) = subscriptions.get_mut(&id) {
                        let mut remaining: HashSet<RelayUrl> =
                            record.targets.take().unwrap_or(all);
                        for url in urls.iter() {
                            remaining.remove(url);
                        }
                        if remaining.is_empty() {
                            exhausted = true;
                        } else {
                            record.targets = Some(remaining);
                        }
                    }
                    if exhausted {
                        subscriptions.remove(&id);
                    }
                    urls
                }
            }
        };

        for url in close_on.into_iter() {
            if let Some(relay) = relays.get(&url) {
                if let Err(e) = relay.unsubscribe(id.clone()).await {
                    tracing::debug!(url = %url, id = %id, error = %e, "Failed to unsubscribe.");
                }
            }
        }

        Ok(())
    }

    /// Get the recorded subscription filters
    pub async fn subscription(&self, id: &SubscriptionId) -> Option<Vec<Filter>> {
        let subscriptions = self.inner.subscriptions.read().await;
        subscriptions.get(id).map(|record| record.filters.clone())
    }
}
