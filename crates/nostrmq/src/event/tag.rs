// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Tag

use core::fmt;

use serde::de::Deserializer;
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

use crate::key::PublicKey;

/// Tag kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagKind {
    /// Recipient public key (`p`)
    P,
    /// Replaceable identifier (`d`)
    D,
    /// Reply target (`response`)
    Response,
    /// Proof-of-work nonce (`nonce`, NIP-13)
    Nonce,
    /// Anything else
    Custom(String),
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::P => write!(f, "p"),
            Self::D => write!(f, "d"),
            Self::Response => write!(f, "response"),
            Self::Nonce => write!(f, "nonce"),
            Self::Custom(kind) => write!(f, "{kind}"),
        }
    }
}

/// Tag
///
/// Recognized tags get a typed variant; everything else round-trips through
/// [`Tag::Generic`] untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    /// Recipient: `["p", <pubkey hex>]`
    PublicKey(PublicKey),
    /// Replaceable identifier: `["d", <unique id>]`
    Identifier(String),
    /// Reply target: `["response", <pubkey hex>]`
    Response(PublicKey),
    /// NIP-13 proof of work: `["nonce", <nonce>, <declared difficulty>]`
    Nonce {
        /// Mined nonce
        nonce: u128,
        /// Declared leading-zero-bit target
        difficulty: u8,
    },
    /// Unrecognized tag, kept verbatim
    Generic(Vec<String>),
}

impl Tag {
    /// Parse a raw string vector into a tag.
    ///
    /// Malformed values of recognized kinds (bad hex, bad numbers) fall back
    /// to [`Tag::Generic`] rather than failing: foreign events may carry
    /// anything.
    pub fn parse(tag: Vec<String>) -> Self {
        match tag.as_slice() {
            [kind, value] if kind == "p" => match PublicKey::from_hex(value) {
                Ok(public_key) => Self::PublicKey(public_key),
                Err(_) => Self::Generic(tag),
            },
            [kind, value] if kind == "d" => Self::Identifier(value.clone()),
            [kind, value] if kind == "response" => match PublicKey::from_hex(value) {
                Ok(public_key) => Self::Response(public_key),
                Err(_) => Self::Generic(tag),
            },
            [kind, nonce, difficulty] if kind == "nonce" => {
                match (nonce.parse::<u128>(), difficulty.parse::<u8>()) {
                    (Ok(nonce), Ok(difficulty)) => Self::Nonce { nonce, difficulty },
                    _ => Self::Generic(tag),
                }
            }
            _ => Self::Generic(tag),
        }
    }

    /// Get tag kind
    pub fn kind(&self) -> TagKind {
        match self {
            Self::PublicKey(..) => TagKind::P,
            Self::Identifier(..) => TagKind::D,
            Self::Response(..) => TagKind::Response,
            Self::Nonce { .. } => TagKind::Nonce,
            Self::Generic(tag) => match tag.first() {
                Some(kind) => TagKind::Custom(kind.clone()),
                None => TagKind::Custom(String::new()),
            },
        }
    }

    /// Render as the wire-level string vector
    pub fn as_vec(&self) -> Vec<String> {
        match self {
            Self::PublicKey(public_key) => {
                vec![String::from("p"), public_key.to_hex()]
            }
            Self::Identifier(id) => vec![String::from("d"), id.clone()],
            Self::Response(public_key) => {
                vec![String::from("response"), public_key.to_hex()]
            }
            Self::Nonce { nonce, difficulty } => vec![
                String::from("nonce"),
                nonce.to_string(),
                difficulty.to_string(),
            ],
            Self::Generic(tag) => tag.clone(),
        }
    }
}

impl Serialize for Tag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let data: Vec<String> = self.as_vec();
        let mut seq = serializer.serialize_seq(Some(data.len()))?;
        for element in data.into_iter() {
            seq.serialize_element(&element)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tag: Vec<String> = Vec::deserialize(deserializer)?;
        Ok(Self::parse(tag))
    }
}
