// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Configuration
//!
//! Static configuration loaded once at process start. Environment plumbing
//! lives outside this crate; when it is used, the canonical variable prefix
//! is `NOSTRMQ_*` (e.g. `NOSTRMQ_SECRET_KEY`, `NOSTRMQ_RELAYS`).

use nostrmq::types::url;
use nostrmq::{Keys, RelayUrl};

use crate::tracker::TrackerOptions;

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Secret key missing or malformed
    #[error("secret key must be 64 lowercase hex characters encoding a valid key")]
    InvalidSecretKey,
    /// Relay list is empty
    #[error("at least one relay URL is required")]
    NoRelays,
    /// A relay URL failed to parse
    #[error("invalid relay URL '{url}': {error}")]
    InvalidRelayUrl {
        /// Offending input
        url: String,
        /// Parse error
        error: url::Error,
    },
    /// Worker count must be at least one
    #[error("pow_threads must be >= 1")]
    InvalidPowThreads,
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) keys: Keys,
    pub(crate) relays: Vec<RelayUrl>,
    pub(crate) pow_difficulty: u8,
    pub(crate) pow_threads: usize,
    pub(crate) tracking: TrackerOptions,
}

impl Config {
    /// Build a configuration from a secret key (64 lowercase hex chars) and
    /// at least one `ws`/`wss` relay URL.
    pub fn new<S, I, U>(secret_key: S, relays: I) -> Result<Self, ConfigError>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = U>,
        U: AsRef<str>,
    {
        let secret_key: &str = secret_key.as_ref();
        if secret_key.len() != 64 || secret_key.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(ConfigError::InvalidSecretKey);
        }
        let keys: Keys = Keys::parse(secret_key).map_err(|_| ConfigError::InvalidSecretKey)?;

        let relays: Vec<RelayUrl> = relays
            .into_iter()
            .map(|url| {
                RelayUrl::parse(url.as_ref()).map_err(|error| ConfigError::InvalidRelayUrl {
                    url: url.as_ref().to_string(),
                    error,
                })
            })
            .collect::<Result<_, _>>()?;
        if relays.is_empty() {
            return Err(ConfigError::NoRelays);
        }

        Ok(Self {
            keys,
            relays,
            pow_difficulty: 0,
            pow_threads: 1,
            tracking: TrackerOptions::default(),
        })
    }

    /// Default leading-zero-bit target for sends that enable proof of work
    /// (0 disables)
    pub fn pow_difficulty(mut self, difficulty: u8) -> Self {
        self.pow_difficulty = difficulty;
        self
    }

    /// Mining worker count
    pub fn pow_threads(mut self, threads: usize) -> Result<Self, ConfigError> {
        if threads == 0 {
            return Err(ConfigError::InvalidPowThreads);
        }
        self.pow_threads = threads;
        Ok(self)
    }

    /// Replay tracker options
    pub fn tracking(mut self, tracking: TrackerOptions) -> Self {
        self.tracking = tracking;
        self
    }

    /// Identity keys
    #[inline]
    pub fn keys(&self) -> &Keys {
        &self.keys
    }

    /// Configured relays
    #[inline]
    pub fn relays(&self) -> &[RelayUrl] {
        &self.relays
    }
}
