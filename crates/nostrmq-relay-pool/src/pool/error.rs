// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Relay pool error

use crate::relay::Error as RelayError;

/// [`RelayPool`](super::RelayPool) error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Relay error
    #[error(transparent)]
    Relay(#[from] RelayError),
    /// The pool has no relays
    #[error("no relays")]
    NoRelays,
    /// An empty relay set was specified
    #[error("no relays specified")]
    NoRelaysSpecified,
    /// Target relay isn't in the pool
    #[error("relay not found: {url}")]
    RelayNotFound {
        /// URL
        url: nostrmq::RelayUrl,
    },
    /// Every relay failed to connect
    #[error("failed to connect to any relay")]
    NoRelayConnected,
    /// Pool was shut down
    #[error("relay pool is shutdown")]
    Shutdown,
}
