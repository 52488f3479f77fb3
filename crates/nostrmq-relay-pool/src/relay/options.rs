// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Relay options

use std::time::Duration;

use super::constants::{
    BACKOFF_BASE, BACKOFF_CAP, DEFAULT_CONNECTION_TIMEOUT, DEFAULT_SEND_TIMEOUT,
    MAX_RECONNECT_ATTEMPTS,
};

/// [`Relay`](super::Relay) options
#[derive(Debug, Clone)]
pub struct RelayOptions {
    pub(super) connection_timeout: Duration,
    pub(super) send_timeout: Duration,
    pub(super) reconnect: bool,
    pub(super) backoff_base: Duration,
    pub(super) backoff_cap: Duration,
    pub(super) max_reconnect_attempts: u32,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            reconnect: true,
            backoff_base: BACKOFF_BASE,
            backoff_cap: BACKOFF_CAP,
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
        }
    }
}

impl RelayOptions {
    /// New default [`RelayOptions`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Timeout for a single connection attempt (default: 10 s)
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Wait for the `OK` acknowledging a published event (default: 5 s)
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Enable/disable auto reconnection (default: true)
    pub fn reconnect(mut self, reconnect: bool) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Reconnect attempts before the relay parks and must be re-added
    /// (default: 10)
    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Backoff base and cap (default: 1 s doubling up to 30 s)
    pub fn backoff(mut self, base: Duration, cap: Duration) -> Self {
        self.backoff_base = base;
        self.backoff_cap = cap;
        self
    }
}
