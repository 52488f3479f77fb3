// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Messages
//!
//! Wire framing of the relay protocol subset this system speaks:
//! outbound `EVENT`/`REQ`/`CLOSE`, inbound `EVENT`/`OK`/`EOSE`/`CLOSED`/`NOTICE`.

mod client;
mod relay;
mod subscription;

pub use self::client::ClientMessage;
pub use self::relay::{MachineReadablePrefix, RelayMessage};
pub use self::subscription::{Filter, SubscriptionId};

/// Message handling error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Message is not a valid protocol array
    #[error("invalid message format")]
    InvalidMessageFormat,
    /// Recognized array shape, unrecognized verb
    #[error("unknown message kind: {0}")]
    UnknownMessageKind(String),
    /// Json error
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}
