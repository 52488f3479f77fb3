// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Client
//!
//! The send and receive pipelines, wired over a relay pool and a replay
//! tracker.

use std::future::Future;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use nostrmq::nips::nip04;
use nostrmq::nips::nip13;
use nostrmq::util::hex;
use nostrmq::{
    Envelope, Event, EventBuilder, EventId, Filter, Keys, Kind, PublicKey, RelayUrl,
    SubscriptionId, Tag, Timestamp, UnsignedEvent,
};
use nostrmq_relay_pool::relay::DEFAULT_CONNECTION_TIMEOUT;
use nostrmq_relay_pool::transport::WebSocketTransport;
use nostrmq_relay_pool::{Output, RelayPool, RelayPoolNotification, RelayPoolOptions};
use tokio::sync::{broadcast, mpsc};

pub mod options;
mod subscription;

pub use self::options::{PowPolicy, ReceiveOptions, SendOptions};
pub use self::subscription::{IncomingMessage, Subscription};
use crate::config::Config;
use crate::error::Error;
use crate::tracker::ReplayTracker;

/// Error a message handler may raise; logged, never propagated
type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// NostrMQ client
#[derive(Debug, Clone)]
pub struct Client {
    config: Config,
    pool: RelayPool,
}

impl Client {
    /// New client over the default websocket transport
    pub fn new(config: Config) -> Self {
        Self {
            config,
            pool: RelayPool::new(RelayPoolOptions::default()),
        }
    }

    /// New client over a custom transport
    pub fn with_transport(config: Config, transport: Arc<dyn WebSocketTransport>) -> Self {
        Self {
            config,
            pool: RelayPool::with_transport(RelayPoolOptions::default(), transport),
        }
    }

    /// Identity keys
    #[inline]
    pub fn keys(&self) -> &Keys {
        &self.config.keys
    }

    /// The underlying relay pool
    #[inline]
    pub fn pool(&self) -> &RelayPool {
        &self.pool
    }

    /// Add the configured relays to the pool and connect it, resolving on
    /// the first successful handshake. A no-op when already connected.
    async fn ensure_connected(&self) -> Result<(), Error> {
        for url in self.config.relays.iter() {
            self.pool.add_relay(url.clone()).await?;
        }
        self.pool.connect(DEFAULT_CONNECTION_TIMEOUT).await?;
        Ok(())
    }

    /// Shut the pool down; pending operations resolve with what they have
    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
    }

    /// Send an encrypted message.
    ///
    /// Builds the cleartext envelope, encrypts it for the target, assembles
    /// the kind-30072 template (`p` and `d` tags, plus a `response` tag when
    /// replies go elsewhere than the sender), optionally mines it, signs it
    /// and publishes. Succeeds iff at least one relay acknowledges within
    /// the timeout; the rejection error carries every relay's outcome.
    pub async fn send(&self, opts: SendOptions) -> Result<EventId, Error> {
        let target: PublicKey = PublicKey::from_hex(&opts.target)
            .map_err(|_| Error::InvalidArgument(format!("invalid target: {}", opts.target)))?;
        let response: PublicKey = match &opts.response {
            Some(response) => PublicKey::from_hex(response).map_err(|_| {
                Error::InvalidArgument(format!("invalid response key: {response}"))
            })?,
            None => self.config.keys.public_key(),
        };

        let envelope = Envelope::new(target, response, opts.payload.clone());
        let content: String =
            nip04::encrypt(self.config.keys.secret_key(), &target, envelope.as_json())
                .map_err(Error::Encrypt)?;

        let mut builder = EventBuilder::new(
            Kind::MESSAGE,
            content,
            [Tag::PublicKey(target), Tag::Identifier(unique_identifier())],
        );
        if response != self.config.keys.public_key() {
            builder = builder.add_tag(Tag::Response(response));
        }
        let mut template: UnsignedEvent = builder.build(self.config.keys.public_key());

        let difficulty: u8 = opts.pow.resolve(self.config.pow_difficulty);
        if difficulty > 0 {
            let threads: usize = self.config.pow_threads;
            template = tokio::task::spawn_blocking(move || {
                nip13::mine_event(template, difficulty, threads, nip13::DEFAULT_MINING_TIMEOUT)
            })
            .await?
            .map_err(Error::Pow)?;
        }

        let event: Event = template.sign(&self.config.keys)?;
        let event_id: EventId = event.id;

        let output: Output = tokio::time::timeout(opts.timeout, async {
            self.ensure_connected().await?;
            self.pool
                .publish(event, opts.relays.clone())
                .await
                .map_err(Error::from)
        })
        .await
        .map_err(|_| Error::PublishTimeout {
            timeout: opts.timeout,
        })??;

        if output.is_success() {
            tracing::debug!(id = %event_id, %output, "Message published.");
            Ok(event_id)
        } else {
            Err(Error::PublishRejected { output })
        }
    }

    /// Subscribe to messages addressed to this identity.
    ///
    /// Every event passing validation is decrypted, deduplicated against
    /// the replay tracker, handed to `on_message`, and then marked
    /// processed; a failing handler does not un-deliver a message. The
    /// returned handle is also an async stream of the same messages.
    pub async fn receive<F, Fut>(
        &self,
        opts: ReceiveOptions,
        on_message: F,
    ) -> Result<Subscription, Error>
    where
        F: Fn(IncomingMessage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        let keys: Keys = match opts.privkey_override.clone() {
            Some(secret_key) => Keys::new(secret_key),
            None => self.config.keys.clone(),
        };

        let tracker: ReplayTracker = ReplayTracker::init(self.config.tracking.clone()).await;

        self.ensure_connected().await?;

        let filter: Filter = Filter::new()
            .kind(Kind::MESSAGE)
            .pubkey(keys.public_key())
            .since(tracker.subscription_since());
        let id: SubscriptionId = SubscriptionId::generate();
        self.pool
            .subscribe(id.clone(), vec![filter], opts.relays.clone())
            .await?;

        let (tx, rx) = mpsc::channel::<IncomingMessage>(1024);
        let closed = Arc::new(AtomicBool::new(false));

        let pool: RelayPool = self.pool.clone();
        let sub_id: SubscriptionId = id.clone();
        let auto_ack: bool = opts.auto_ack;
        tokio::spawn(async move {
            receive_loop(pool, sub_id, keys, tracker, on_message, tx, auto_ack).await;
        });

        Ok(Subscription::new(id, self.pool.clone(), closed, rx))
    }
}

/// Replaceable-event identifier for the `d` tag
fn unique_identifier() -> String {
    let random: [u8; 4] = rand::random();
    format!("{}-{}", Timestamp::now().as_u64(), hex::encode(random))
}

async fn receive_loop<F, Fut>(
    pool: RelayPool,
    sub_id: SubscriptionId,
    keys: Keys,
    mut tracker: ReplayTracker,
    on_message: F,
    tx: mpsc::Sender<IncomingMessage>,
    auto_ack: bool,
) where
    F: Fn(IncomingMessage) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    let mut notifications = pool.notifications();

    loop {
        match notifications.recv().await {
            Ok(RelayPoolNotification::Event {
                relay_url,
                subscription_id,
                event,
            }) => {
                if subscription_id != sub_id {
                    continue;
                }
                handle_incoming(
                    &relay_url,
                    *event,
                    &keys,
                    &mut tracker,
                    &on_message,
                    &tx,
                    auto_ack,
                )
                .await;
            }
            Ok(RelayPoolNotification::Shutdown) => break,
            Ok(RelayPoolNotification::Message { .. }) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped = %skipped, "Receive loop lagged; notifications skipped.");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }

    tracing::debug!(id = %sub_id, "Receive loop terminated.");
}

/// The per-event ladder: validate, decrypt, deduplicate, deliver, record.
async fn handle_incoming<F, Fut>(
    relay_url: &RelayUrl,
    event: Event,
    keys: &Keys,
    tracker: &mut ReplayTracker,
    on_message: &F,
    tx: &mpsc::Sender<IncomingMessage>,
    auto_ack: bool,
) where
    F: Fn(IncomingMessage) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    if event.kind != Kind::MESSAGE {
        return;
    }

    if !event.is_addressed_to(&keys.public_key()) {
        return;
    }

    // Duplicates (same event from another relay, or replays) drop silently
    if tracker.has_processed(&event.id, event.created_at) {
        return;
    }

    let cleartext: String =
        match nip04::decrypt(keys.secret_key(), &event.pubkey, &event.content) {
            Ok(cleartext) => cleartext,
            Err(e) => {
                tracing::debug!(
                    url = %relay_url,
                    id = %event.id,
                    error = %e,
                    "Can't decrypt event content; dropping."
                );
                return;
            }
        };

    let envelope: Envelope = match Envelope::from_json(&cleartext) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::debug!(
                url = %relay_url,
                id = %event.id,
                error = %e,
                "Invalid envelope; dropping."
            );
            return;
        }
    };

    if !envelope.is_for(&keys.public_key()) {
        tracing::debug!(
            url = %relay_url,
            id = %event.id,
            "Envelope target doesn't match our key; dropping."
        );
        return;
    }

    let message = IncomingMessage {
        payload: envelope.payload,
        sender: event.pubkey,
        event: Box::new(event),
    };

    if let Err(e) = on_message(message.clone()).await {
        tracing::warn!(id = %message.event.id, error = %e, "Message handler failed.");
    }

    // Delivered either way; record it
    tracker
        .mark_processed(message.event.id, message.event.created_at)
        .await;

    if auto_ack {
        // Hook only: no acknowledgement protocol is defined
        tracing::trace!(id = %message.event.id, "auto_ack set; nothing to send.");
    }

    if tx.try_send(message).is_err() {
        tracing::debug!("Stream consumer missing or full; message not queued.");
    }
}
