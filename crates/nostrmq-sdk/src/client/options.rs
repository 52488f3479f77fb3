// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Send/receive options

use std::time::Duration;

use nostrmq::{RelayUrl, SecretKey};
use serde_json::Value;

/// Default budget for the whole publish step of a send
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_millis(2000);

/// Proof-of-work policy for a send
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PowPolicy {
    /// No mining
    #[default]
    Disabled,
    /// Use the configured `pow_difficulty`
    ConfigDefault,
    /// Explicit leading-zero-bit target
    Bits(u8),
}

impl PowPolicy {
    pub(crate) fn resolve(&self, config_difficulty: u8) -> u8 {
        match self {
            Self::Disabled => 0,
            Self::ConfigDefault => config_difficulty,
            Self::Bits(bits) => *bits,
        }
    }
}

impl From<bool> for PowPolicy {
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::ConfigDefault
        } else {
            Self::Disabled
        }
    }
}

impl From<u8> for PowPolicy {
    fn from(bits: u8) -> Self {
        Self::Bits(bits)
    }
}

/// Options for [`Client::send`](crate::client::Client::send)
#[derive(Debug, Clone)]
pub struct SendOptions {
    pub(crate) target: String,
    pub(crate) payload: Value,
    pub(crate) response: Option<String>,
    pub(crate) relays: Option<Vec<RelayUrl>>,
    pub(crate) pow: PowPolicy,
    pub(crate) timeout: Duration,
}

impl SendOptions {
    /// New send: `target` is the recipient public key (hex), `payload` any
    /// JSON value.
    pub fn new<S>(target: S, payload: Value) -> Self
    where
        S: Into<String>,
    {
        Self {
            target: target.into(),
            payload,
            response: None,
            relays: None,
            pow: PowPolicy::default(),
            timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    /// Public key (hex) replies should be addressed to, when different from
    /// the sender's own
    pub fn response<S>(mut self, response: S) -> Self
    where
        S: Into<String>,
    {
        self.response = Some(response.into());
        self
    }

    /// Restrict the publish to a relay subset
    pub fn relays(mut self, relays: Vec<RelayUrl>) -> Self {
        self.relays = Some(relays);
        self
    }

    /// Proof-of-work policy (accepts `bool` and `u8` too)
    pub fn pow<P>(mut self, pow: P) -> Self
    where
        P: Into<PowPolicy>,
    {
        self.pow = pow.into();
        self
    }

    /// Budget for the publish step (default: 2 s)
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Options for [`Client::receive`](crate::client::Client::receive)
#[derive(Debug, Clone, Default)]
pub struct ReceiveOptions {
    pub(crate) relays: Option<Vec<RelayUrl>>,
    pub(crate) privkey_override: Option<SecretKey>,
    pub(crate) auto_ack: bool,
}

impl ReceiveOptions {
    /// New default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the subscription to a relay subset
    pub fn relays(mut self, relays: Vec<RelayUrl>) -> Self {
        self.relays = Some(relays);
        self
    }

    /// Receive for a different identity than the configured one
    pub fn privkey_override(mut self, secret_key: SecretKey) -> Self {
        self.privkey_override = Some(secret_key);
        self
    }

    /// Auto-acknowledgement hook. Accepted for forward compatibility;
    /// currently a no-op, no acknowledgement protocol exists.
    pub fn auto_ack(mut self, auto_ack: bool) -> Self {
        self.auto_ack = auto_ack;
        self
    }
}
