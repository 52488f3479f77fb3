// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! NostrMQ protocol
//!
//! Encrypted point-to-point messaging over Nostr: event model, NIP-04
//! payload encryption, NIP-13 proof of work, and the wire framing of the
//! relay protocol subset the transport speaks.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

use once_cell::sync::Lazy;
use secp256k1::{All, Secp256k1};

pub mod envelope;
pub mod event;
pub mod key;
pub mod message;
pub mod nips;
pub mod prelude;
pub mod types;
pub mod util;

pub use self::envelope::Envelope;
pub use self::event::{Event, EventBuilder, EventId, Kind, Tag, TagKind, UnsignedEvent};
pub use self::key::{Keys, PublicKey, SecretKey};
pub use self::message::{ClientMessage, Filter, RelayMessage, SubscriptionId};
pub use self::types::{RelayUrl, Timestamp};

// Crates exposed in the public API
pub use {secp256k1, serde_json};

/// Shared secp256k1 context
pub static SECP256K1: Lazy<Secp256k1<All>> = Lazy::new(|| {
    let mut ctx = Secp256k1::new();
    ctx.randomize(&mut secp256k1::rand::thread_rng());
    ctx
});
