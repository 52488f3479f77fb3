// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Client error

use std::time::Duration;

use nostrmq::nips::{nip04, nip13};
use nostrmq_relay_pool::pool;
use nostrmq_relay_pool::Output;

use crate::config::ConfigError;

/// Client error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration error
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    /// Invalid call argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Payload encryption failed
    #[error("encrypt: {0}")]
    Encrypt(nip04::Error),
    /// Event construction or signing failed
    #[error("event: {0}")]
    Event(#[from] nostrmq::event::Error),
    /// Proof-of-work mining failed (deadline, worker failure)
    #[error("proof of work: {0}")]
    Pow(#[from] nip13::Error),
    /// Relay pool error
    #[error("pool: {0}")]
    Pool(#[from] pool::Error),
    /// No relay acknowledged the event
    #[error("event not accepted by any relay: {output}")]
    PublishRejected {
        /// Per-relay outcome
        output: Output,
    },
    /// The publish didn't finish within the caller's budget
    #[error("publish timed out after {timeout:?}")]
    PublishTimeout {
        /// Elapsed budget
        timeout: Duration,
    },
    /// A background task died
    #[error("task: {0}")]
    Join(#[from] tokio::task::JoinError),
}
