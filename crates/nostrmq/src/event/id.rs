// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Event Id

use core::fmt;
use core::str::FromStr;

use bitcoin_hashes::sha256::Hash as Sha256Hash;
use bitcoin_hashes::Hash;
use serde::de::Error as DeserializerError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};

use super::{Kind, Tag};
use crate::key::PublicKey;
use crate::util::hex;
use crate::Timestamp;

/// [`EventId`] error
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// Hex decode error
    #[error("hex: {0}")]
    Hex(#[from] hex::Error),
}

/// Event Id
///
/// 32-byte, lowercase hex-encoded SHA-256 of the serialized event data:
/// `[0, pubkey, created_at, kind, tags, content]` with no extra whitespace.
///
/// <https://github.com/nostr-protocol/nips/blob/master/01.md>
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(Sha256Hash);

impl EventId {
    /// Compute the id of an event template
    pub fn new(
        pubkey: &PublicKey,
        created_at: Timestamp,
        kind: Kind,
        tags: &[Tag],
        content: &str,
    ) -> Self {
        let json: Value = json!([0, pubkey, created_at, kind, tags, content]);
        let event_str: String = json.to_string();
        Self(Sha256Hash::hash(event_str.as_bytes()))
    }

    /// Parse from a 64-char hex string
    pub fn from_hex<S>(hex: S) -> Result<Self, Error>
    where
        S: AsRef<str>,
    {
        let bytes: [u8; 32] = hex::decode_to_array(hex.as_ref())?;
        Ok(Self::from_byte_array(bytes))
    }

    /// Construct from 32 bytes
    #[inline]
    pub fn from_byte_array(bytes: [u8; 32]) -> Self {
        Self(Sha256Hash::from_byte_array(bytes))
    }

    /// Get as byte slice
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_byte_array()
    }

    /// Get as 32 bytes
    #[inline]
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_byte_array()
    }

    /// Get as lowercase hex string
    #[inline]
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    /// Check if the id carries at least `difficulty` leading zero bits (NIP-13)
    #[inline]
    pub fn check_pow(&self, difficulty: u8) -> bool {
        crate::nips::nip13::get_leading_zero_bits(self) >= difficulty
    }
}

impl FromStr for EventId {
    type Err = Error;

    fn from_str(hex: &str) -> Result<Self, Self::Err> {
        Self::from_hex(hex)
    }
}

impl AsRef<[u8]> for EventId {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for EventId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex: String = String::deserialize(deserializer)?;
        Self::from_hex(hex).map_err(DeserializerError::custom)
    }
}
