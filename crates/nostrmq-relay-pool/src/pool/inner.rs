// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Relay pool internals

use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use nostrmq::{Filter, RelayUrl, SubscriptionId};
use tokio::sync::{broadcast, RwLock};

use super::options::RelayPoolOptions;
use super::RelayPoolNotification;
use crate::relay::Relay;
use crate::transport::WebSocketTransport;

pub(super) type Relays = HashMap<RelayUrl, Relay>;

/// A subscription as the pool remembers it: replayed to relays that join or
/// reconnect while it's active.
#[derive(Debug, Clone)]
pub(super) struct SubscriptionRecord {
    pub(super) filters: Vec<Filter>,
    /// `None` targets every relay in the pool
    pub(super) targets: Option<HashSet<RelayUrl>>,
    pub(super) active: bool,
}

impl SubscriptionRecord {
    pub(super) fn applies_to(&self, url: &RelayUrl) -> bool {
        self.active
            && match &self.targets {
                Some(targets) => targets.contains(url),
                None => true,
            }
    }
}

#[derive(Debug)]
pub(super) struct InnerRelayPool {
    pub(super) relays: RwLock<Relays>,
    pub(super) subscriptions: RwLock<HashMap<SubscriptionId, SubscriptionRecord>>,
    pub(super) started: AtomicBool,
    pub(super) shutdown: AtomicBool,
    pub(super) notification_sender: broadcast::Sender<RelayPoolNotification>,
    pub(super) transport: Arc<dyn WebSocketTransport>,
    pub(super) opts: RelayPoolOptions,
}

impl InnerRelayPool {
    pub(super) fn new(opts: RelayPoolOptions, transport: Arc<dyn WebSocketTransport>) -> Self {
        let (notification_sender, ..) =
            broadcast::channel::<RelayPoolNotification>(opts.notification_channel_size);

        Self {
            relays: RwLock::new(HashMap::new()),
            subscriptions: RwLock::new(HashMap::new()),
            started: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            notification_sender,
            transport,
            opts,
        }
    }
}
