// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Relay pool options

use crate::relay::RelayOptions;

const DEFAULT_NOTIFICATION_CHANNEL_SIZE: usize = 4096;

/// [`RelayPool`](super::RelayPool) options
#[derive(Debug, Clone)]
pub struct RelayPoolOptions {
    pub(super) notification_channel_size: usize,
    pub(super) relay: RelayOptions,
}

impl Default for RelayPoolOptions {
    fn default() -> Self {
        Self {
            notification_channel_size: DEFAULT_NOTIFICATION_CHANNEL_SIZE,
            relay: RelayOptions::default(),
        }
    }
}

impl RelayPoolOptions {
    /// New default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Notification channel size (default: 4096)
    pub fn notification_channel_size(mut self, size: usize) -> Self {
        self.notification_channel_size = size;
        self
    }

    /// Options applied to every relay added without explicit options
    pub fn relay_options(mut self, opts: RelayOptions) -> Self {
        self.relay = opts;
        self
    }
}
