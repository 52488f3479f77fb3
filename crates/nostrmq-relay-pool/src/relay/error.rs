// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Relay error

use crate::transport::TransportError;

/// [`Relay`](super::Relay) error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport error
    #[error("transport: {0}")]
    Transport(#[from] TransportError),
    /// Message handling error
    #[error("message: {0}")]
    Message(#[from] nostrmq::message::Error),
    /// Internal channel error
    #[error("can't send message to the '{channel}' channel")]
    CantSendChannelMessage {
        /// Channel name
        channel: String,
    },
    /// Relay not connected
    #[error("relay not connected")]
    NotConnected,
    /// Relay answered the `EVENT` with `OK false`
    #[error("event rejected: {message}")]
    EventRejected {
        /// Relay-provided reason
        message: String,
    },
    /// Timeout
    #[error("timeout")]
    Timeout,
    /// Connection task terminated while a request was in flight
    #[error("terminated")]
    Terminated,
    /// Subscription filters are empty
    #[error("subscription filters are empty")]
    FiltersEmpty,
}
