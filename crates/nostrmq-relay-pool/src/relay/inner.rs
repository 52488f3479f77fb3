// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

use std::cmp;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use nostrmq::message::Error as MessageError;
use nostrmq::{
    ClientMessage, Event, EventId, Filter, RelayMessage, RelayUrl, SubscriptionId, Timestamp,
};
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::{broadcast, watch, Mutex, MutexGuard, OnceCell, RwLock};
use tokio_tungstenite::tungstenite::Message as WsMessage;

use super::options::RelayOptions;
use super::stats::RelayConnectionStats;
use super::status::AtomicRelayStatus;
use super::{Error, RelayNotification, RelayStatus};
use crate::pool::RelayPoolNotification;
use crate::transport::{BoxSink, BoxStream, WebSocketTransport};

#[derive(Debug, Clone, Copy)]
enum RelayServiceEvent {
    /// Nothing to do
    None,
    /// Completely disconnect
    Terminate,
}

#[derive(Debug)]
struct RelayChannels {
    nostr: (
        Sender<Vec<ClientMessage>>,
        Mutex<Receiver<Vec<ClientMessage>>>,
    ),
    service: (
        watch::Sender<RelayServiceEvent>,
        Mutex<watch::Receiver<RelayServiceEvent>>,
    ),
}

impl RelayChannels {
    fn new() -> Self {
        let (tx_nostr, rx_nostr) = mpsc::channel::<Vec<ClientMessage>>(1024);
        let (tx_service, rx_service) = watch::channel::<RelayServiceEvent>(RelayServiceEvent::None);

        Self {
            nostr: (tx_nostr, Mutex::new(rx_nostr)),
            service: (tx_service, Mutex::new(rx_service)),
        }
    }

    fn send_client_msgs(&self, msgs: Vec<ClientMessage>) -> Result<(), Error> {
        self.nostr
            .0
            .try_send(msgs)
            .map_err(|_| Error::CantSendChannelMessage {
                channel: String::from("nostr"),
            })
    }

    async fn rx_nostr(&self) -> MutexGuard<'_, Receiver<Vec<ClientMessage>>> {
        self.nostr.1.lock().await
    }

    async fn rx_service(&self) -> MutexGuard<'_, watch::Receiver<RelayServiceEvent>> {
        self.service.1.lock().await
    }

    fn send_service_msg(&self, event: RelayServiceEvent) -> Result<(), Error> {
        self.service
            .0
            .send(event)
            .map_err(|_| Error::CantSendChannelMessage {
                channel: String::from("service"),
            })
    }
}

#[derive(Debug, Clone)]
struct SubscriptionData {
    filters: Vec<Filter>,
    /// When the REQ was last sent for the current websocket session
    subscribed_at: Timestamp,
    /// Closed by the relay via `CLOSED`
    closed: bool,
}

impl Default for SubscriptionData {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            subscribed_at: Timestamp::zero(),
            closed: false,
        }
    }
}

// Fields that need an `Arc` live here, so the relay handle clones one `Arc`
// instead of one per field.
#[derive(Debug)]
pub(super) struct AtomicPrivateData {
    status: AtomicRelayStatus,
    channels: RelayChannels,
    subscriptions: RwLock<HashMap<SubscriptionId, SubscriptionData>>,
    running: AtomicBool,
}

#[derive(Debug, Clone)]
pub(crate) struct InnerRelay {
    pub(super) url: RelayUrl,
    pub(super) atomic: Arc<AtomicPrivateData>,
    pub(super) opts: RelayOptions,
    pub(super) stats: RelayConnectionStats,
    transport: Arc<dyn WebSocketTransport>,
    pub(super) internal_notification_sender: broadcast::Sender<RelayNotification>,
    external_notification_sender: Arc<OnceCell<broadcast::Sender<RelayPoolNotification>>>,
}

impl InnerRelay {
    pub(super) fn new(
        url: RelayUrl,
        transport: Arc<dyn WebSocketTransport>,
        opts: RelayOptions,
    ) -> Self {
        let (relay_notification_sender, ..) = broadcast::channel::<RelayNotification>(2048);

        Self {
            url,
            atomic: Arc::new(AtomicPrivateData {
                status: AtomicRelayStatus::default(),
                channels: RelayChannels::new(),
                subscriptions: RwLock::new(HashMap::new()),
                running: AtomicBool::new(false),
            }),
            opts,
            stats: RelayConnectionStats::default(),
            transport,
            internal_notification_sender: relay_notification_sender,
            external_notification_sender: Arc::new(OnceCell::new()),
        }
    }

    /// Is the connection task running?
    #[inline]
    fn is_running(&self) -> bool {
        self.atomic.running.load(Ordering::SeqCst)
    }

    #[inline]
    pub fn status(&self) -> RelayStatus {
        self.atomic.status.load()
    }

    fn set_status(&self, status: RelayStatus, log: bool) {
        self.atomic.status.set(status);

        if log {
            match status {
                RelayStatus::Initialized => tracing::trace!(url = %self.url, "Relay initialized."),
                RelayStatus::Connecting => tracing::debug!("Connecting to '{}'", self.url),
                RelayStatus::Connected => tracing::info!("Connected to '{}'", self.url),
                RelayStatus::Disconnected => tracing::info!("Disconnected from '{}'", self.url),
                RelayStatus::Errored => tracing::debug!(url = %self.url, "Relay errored."),
                RelayStatus::Terminated => {
                    tracing::info!("Completely disconnected from '{}'", self.url)
                }
            }
        }

        self.send_notification(RelayNotification::RelayStatus { status }, false);
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.status().is_connected()
    }

    pub(crate) fn set_notification_sender(
        &self,
        notification_sender: broadcast::Sender<RelayPoolNotification>,
    ) -> Result<(), Error> {
        self.external_notification_sender
            .set(notification_sender)
            .map_err(|_| Error::CantSendChannelMessage {
                channel: String::from("external"),
            })
    }

    fn send_notification(&self, notification: RelayNotification, external: bool) {
        let _ = self.internal_notification_sender.send(notification.clone());

        if external {
            if let Some(external_notification_sender) = self.external_notification_sender.get() {
                let notification: Option<RelayPoolNotification> = match notification {
                    RelayNotification::Event {
                        subscription_id,
                        event,
                    } => Some(RelayPoolNotification::Event {
                        relay_url: self.url.clone(),
                        subscription_id,
                        event,
                    }),
                    RelayNotification::Message { message } => {
                        Some(RelayPoolNotification::Message {
                            relay_url: self.url.clone(),
                            message,
                        })
                    }
                    RelayNotification::RelayStatus { .. } | RelayNotification::Shutdown => None,
                };

                if let Some(notification) = notification {
                    let _ = external_notification_sender.send(notification);
                }
            }
        }
    }

    /// Spawn the auto-connect loop, if not already running.
    pub fn connect(&self) {
        if !self.status().can_connect() {
            return;
        }

        // Mark as connecting before the task starts, so a second `connect`
        // call can't spawn a twin loop.
        self.set_status(RelayStatus::Connecting, false);
        self.spawn_connection_task();
    }

    /// Spawn the auto-connect loop (if needed) and wait for the first
    /// attempt to resolve.
    pub async fn try_connect(&self, timeout: Duration) -> Result<(), Error> {
        let status: RelayStatus = self.status();

        if status.is_connected() {
            return Ok(());
        }

        let mut notifications = self.internal_notification_sender.subscribe();

        if status.can_connect() {
            self.set_status(RelayStatus::Connecting, false);
            self.spawn_connection_task();
        } else if self.is_connected() {
            // Won the race between the status check above and subscribing
            return Ok(());
        }

        tokio::time::timeout(timeout, async {
            while let Ok(notification) = notifications.recv().await {
                if let RelayNotification::RelayStatus { status } = notification {
                    if status.is_connected() {
                        return Ok(());
                    }
                    if status.is_disconnected() {
                        return Err(Error::NotConnected);
                    }
                }
            }
            Err(Error::Terminated)
        })
        .await
        .map_err(|_| Error::Timeout)?
    }

    fn spawn_connection_task(&self) {
        if self.is_running() {
            tracing::warn!(url = %self.url, "Connection task is already running.");
            return;
        }

        let relay = self.clone();
        tokio::spawn(async move {
            relay.atomic.running.store(true, Ordering::SeqCst);

            let mut rx_service = relay.atomic.channels.rx_service().await;

            loop {
                tokio::select! {
                    _ = relay.connect_and_run() => {},
                    _ = relay.handle_terminate(&mut rx_service) => {
                        relay.set_status(RelayStatus::Terminated, true);
                        break;
                    }
                }

                if relay.status().is_terminated() {
                    break;
                }

                let failures: u32 = relay.stats.consecutive_failures();
                if failures >= relay.opts.max_reconnect_attempts {
                    tracing::warn!(
                        url = %relay.url,
                        attempts = %failures,
                        "Too many failed attempts; parking relay. Re-add it to retry."
                    );
                    relay.set_status(RelayStatus::Terminated, true);
                    break;
                }

                if !relay.opts.reconnect {
                    relay.set_status(RelayStatus::Terminated, true);
                    break;
                }

                let interval: Duration = relay.retry_interval();
                tracing::debug!(
                    "Reconnecting to '{}' relay in {} secs",
                    relay.url,
                    interval.as_secs()
                );

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {},
                    _ = relay.handle_terminate(&mut rx_service) => {
                        relay.set_status(RelayStatus::Terminated, true);
                        break;
                    }
                }
            }

            relay.atomic.running.store(false, Ordering::SeqCst);

            tracing::debug!(url = %relay.url, "Auto-connect loop terminated.");
        });
    }

    /// Exponential backoff: base doubled per consecutive failure, capped.
    fn retry_interval(&self) -> Duration {
        let failures: u32 = self.stats.consecutive_failures().saturating_sub(1);
        let factor: u32 = super::constants::BACKOFF_FACTOR.saturating_pow(failures.min(16));
        cmp::min(
            self.opts.backoff_base.saturating_mul(factor),
            self.opts.backoff_cap,
        )
    }

    async fn handle_terminate(&self, rx_service: &mut watch::Receiver<RelayServiceEvent>) {
        loop {
            if rx_service.changed().await.is_ok() {
                match *rx_service.borrow_and_update() {
                    RelayServiceEvent::None => {}
                    RelayServiceEvent::Terminate => break,
                }
            }
        }
    }

    async fn connect_and_run(&self) {
        self.set_status(RelayStatus::Connecting, true);
        self.stats.new_attempt();

        match self
            .transport
            .connect(&self.url, self.opts.connection_timeout)
            .await
        {
            Ok((ws_tx, ws_rx)) => {
                self.set_status(RelayStatus::Connected, true);
                self.stats.new_success();
                self.run_message_handler(ws_tx, ws_rx).await;
            }
            Err(e) => {
                self.stats.new_failure();
                self.set_status(RelayStatus::Errored, false);
                tracing::error!(url = %self.url, error = %e, "Connection failed.");
            }
        }
    }

    async fn run_message_handler(&self, ws_tx: BoxSink, ws_rx: BoxStream) {
        // (Re)subscribe active subscriptions on the fresh session
        if let Err(e) = self.resubscribe().await {
            tracing::error!(url = %self.url, error = %e, "Impossible to subscribe.");
        }

        tokio::select! {
            res = self.receiver_message_handler(ws_rx) => match res {
                Ok(()) => {
                    // Clean close
                    self.set_status(RelayStatus::Disconnected, true);
                }
                Err(e) => {
                    tracing::error!(url = %self.url, error = %e, "Relay receiver exited with error.");
                    self.stats.new_failure();
                    self.set_status(RelayStatus::Errored, true);
                }
            },
            res = self.sender_message_handler(ws_tx) => match res {
                Ok(()) => self.set_status(RelayStatus::Disconnected, true),
                Err(e) => {
                    tracing::error!(url = %self.url, error = %e, "Relay sender exited with error.");
                    self.stats.new_failure();
                    self.set_status(RelayStatus::Errored, true);
                }
            },
        }
    }

    async fn sender_message_handler(&self, mut ws_tx: BoxSink) -> Result<(), Error> {
        let mut rx_nostr = self.atomic.channels.rx_nostr().await;

        while let Some(msgs) = rx_nostr.recv().await {
            let msgs: Vec<WsMessage> = msgs
                .into_iter()
                .map(|msg| WsMessage::Text(msg.as_json()))
                .collect();

            let size: usize = msgs.iter().map(|msg| msg.len()).sum();
            let len: usize = msgs.len();

            if len == 1 {
                let json = &msgs[0];
                tracing::debug!("Sending '{json}' to '{}' (size: {size} bytes)", self.url);
            } else {
                tracing::debug!("Sending {len} messages to '{}' (size: {size} bytes)", self.url);
            }

            for msg in msgs.into_iter() {
                ws_tx.feed(msg).await?;
            }
            ws_tx.flush().await?;
        }

        // Channel closed: close the websocket too
        ws_tx.close().await?;

        Ok(())
    }

    async fn receiver_message_handler(&self, mut ws_rx: BoxStream) -> Result<(), Error> {
        while let Some(msg) = ws_rx.next().await {
            match msg? {
                WsMessage::Text(json) => self.handle_relay_message(&json).await,
                WsMessage::Binary(..) => {
                    tracing::warn!(url = %self.url, "Binary messages aren't supported.");
                }
                WsMessage::Close(..) => break,
                _ => {}
            }
        }

        Ok(())
    }

    async fn handle_relay_message(&self, msg: &str) {
        tracing::trace!(url = %self.url, msg = %msg, "Received new relay message.");

        match RelayMessage::from_json(msg) {
            Ok(message) => {
                match &message {
                    RelayMessage::Notice(message) => {
                        tracing::warn!(url = %self.url, msg = %message, "Received NOTICE.")
                    }
                    RelayMessage::Ok {
                        event_id,
                        status,
                        message,
                    } => {
                        tracing::debug!(
                            url = %self.url,
                            id = %event_id,
                            status = %status,
                            msg = %message,
                            "Received OK."
                        );
                    }
                    RelayMessage::EndOfStoredEvents(id) => {
                        tracing::debug!(url = %self.url, id = %id, "Received EOSE.");
                    }
                    RelayMessage::Closed {
                        subscription_id,
                        message,
                    } => {
                        tracing::debug!(
                            url = %self.url,
                            id = %subscription_id,
                            msg = %message,
                            "Subscription closed."
                        );
                        self.subscription_closed(subscription_id).await;
                    }
                    RelayMessage::Event { .. } => {}
                }

                // Events additionally fan out under their subscription id
                if let RelayMessage::Event {
                    subscription_id,
                    event,
                } = &message
                {
                    self.send_notification(
                        RelayNotification::Event {
                            subscription_id: subscription_id.clone(),
                            event: event.clone(),
                        },
                        true,
                    );
                }

                self.send_notification(RelayNotification::Message { message }, true);
            }
            // Unknown kinds and parse failures are dropped; they must not
            // kill the connection.
            Err(MessageError::UnknownMessageKind(kind)) => {
                tracing::debug!(url = %self.url, kind = %kind, "Dropping unknown message kind.");
            }
            Err(e) => {
                tracing::warn!(
                    url = %self.url,
                    msg = %msg,
                    error = %e,
                    "Impossible to handle relay message."
                );
            }
        }
    }

    pub fn disconnect(&self) {
        if !self.status().is_terminated() {
            if let Err(e) = self
                .atomic
                .channels
                .send_service_msg(RelayServiceEvent::Terminate)
            {
                tracing::error!(url = %self.url, error = %e, "Impossible to terminate relay.");
            }
            self.send_notification(RelayNotification::Shutdown, false);
        }
    }

    #[inline]
    pub fn send_msg(&self, msg: ClientMessage) -> Result<(), Error> {
        self.batch_msg(vec![msg])
    }

    pub fn batch_msg(&self, msgs: Vec<ClientMessage>) -> Result<(), Error> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        self.atomic.channels.send_client_msgs(msgs)
    }

    /// Send an `EVENT` and wait for the matching `OK`.
    ///
    /// The notification receiver is subscribed before the send and dropped
    /// with this future, success or not: no listener outlives the wait.
    pub async fn send_event(&self, event: &Event) -> Result<(), Error> {
        let id: EventId = event.id;

        let mut notifications = self.internal_notification_sender.subscribe();

        self.send_msg(ClientMessage::event(event.clone()))?;

        let (status, message) = self
            .wait_for_ok(&mut notifications, id, self.opts.send_timeout)
            .await?;

        if status {
            Ok(())
        } else {
            Err(Error::EventRejected { message })
        }
    }

    async fn wait_for_ok(
        &self,
        notifications: &mut broadcast::Receiver<RelayNotification>,
        id: EventId,
        timeout: Duration,
    ) -> Result<(bool, String), Error> {
        tokio::time::timeout(timeout, async {
            while let Ok(notification) = notifications.recv().await {
                match notification {
                    RelayNotification::Message {
                        message:
                            RelayMessage::Ok {
                                event_id,
                                status,
                                message,
                            },
                    } => {
                        if id == event_id {
                            return Ok((status, message));
                        }
                    }
                    RelayNotification::RelayStatus { status } if status.is_disconnected() => {
                        return Err(Error::NotConnected);
                    }
                    RelayNotification::Shutdown => return Err(Error::Terminated),
                    _ => (),
                }
            }

            Err(Error::Terminated)
        })
        .await
        .map_err(|_| Error::Timeout)?
    }

    pub async fn subscriptions(&self) -> HashMap<SubscriptionId, Vec<Filter>> {
        let subscriptions = self.atomic.subscriptions.read().await;
        subscriptions
            .iter()
            .map(|(k, v)| (k.clone(), v.filters.clone()))
            .collect()
    }

    async fn update_subscription(
        &self,
        id: SubscriptionId,
        filters: Vec<Filter>,
        update_subscribed_at: bool,
    ) {
        let mut subscriptions = self.atomic.subscriptions.write().await;
        let data: &mut SubscriptionData = subscriptions.entry(id).or_default();
        data.filters = filters;
        data.closed = false;

        if update_subscribed_at {
            data.subscribed_at = Timestamp::now();
        }
    }

    /// Mark subscription as closed by the relay
    async fn subscription_closed(&self, id: &SubscriptionId) {
        let mut subscriptions = self.atomic.subscriptions.write().await;
        if let Some(data) = subscriptions.get_mut(id) {
            data.closed = true;
        }
    }

    /// Check if the subscription needs a REQ on the current session
    async fn should_resubscribe(&self, id: &SubscriptionId) -> bool {
        let subscriptions = self.atomic.subscriptions.read().await;
        match subscriptions.get(id) {
            Some(SubscriptionData {
                subscribed_at,
                closed,
                ..
            }) => {
                // Never sent, or killed by the relay
                if subscribed_at.is_zero() || *closed {
                    return true;
                }

                // Sent during a previous session
                self.stats.connected_at() > *subscribed_at
            }
            None => false,
        }
    }

    async fn remove_subscription(&self, id: &SubscriptionId) {
        let mut subscriptions = self.atomic.subscriptions.write().await;
        subscriptions.remove(id);
    }

    pub async fn resubscribe(&self) -> Result<(), Error> {
        let subscriptions = self.subscriptions().await;
        for (id, filters) in subscriptions.into_iter() {
            if !filters.is_empty() && self.should_resubscribe(&id).await {
                self.send_msg(ClientMessage::req(id.clone(), filters))?;
                self.update_subscription_sent(&id).await;
            } else {
                tracing::debug!("Skip re-subscription of '{id}'");
            }
        }

        Ok(())
    }

    async fn update_subscription_sent(&self, id: &SubscriptionId) {
        let mut subscriptions = self.atomic.subscriptions.write().await;
        if let Some(data) = subscriptions.get_mut(id) {
            data.subscribed_at = Timestamp::now();
            data.closed = false;
        }
    }

    /// Record the subscription and REQ it if currently connected; otherwise
    /// it is replayed as soon as a session is established.
    pub async fn subscribe_with_id(
        &self,
        id: SubscriptionId,
        filters: Vec<Filter>,
    ) -> Result<(), Error> {
        if filters.is_empty() {
            return Err(Error::FiltersEmpty);
        }

        self.update_subscription(id.clone(), filters.clone(), false)
            .await;

        if self.is_connected() {
            self.send_msg(ClientMessage::req(id.clone(), filters))?;
            self.update_subscription_sent(&id).await;
        }

        Ok(())
    }

    pub async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), Error> {
        self.remove_subscription(&id).await;

        if self.is_connected() {
            self.send_msg(ClientMessage::close(id))?;
        }

        Ok(())
    }
}
