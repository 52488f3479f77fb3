// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Event

use core::fmt;

use secp256k1::schnorr::Signature;
use secp256k1::Message;
use serde::{Deserialize, Serialize};

pub mod builder;
pub mod id;
pub mod kind;
pub mod tag;
pub mod unsigned;

pub use self::builder::EventBuilder;
pub use self::id::EventId;
pub use self::kind::Kind;
pub use self::tag::{Tag, TagKind};
pub use self::unsigned::UnsignedEvent;
use crate::key::PublicKey;
use crate::{Timestamp, SECP256K1};

/// [`Event`] error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid signature
    #[error("invalid signature")]
    InvalidSignature,
    /// Invalid event id
    #[error("invalid event id")]
    InvalidId,
    /// Signing keys don't match the template author
    #[error("signing keys don't match the template author")]
    PublicKeyMismatch,
    /// Error serializing or deserializing JSON data
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// A signed Nostr event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Id
    pub id: EventId,
    /// Author
    pub pubkey: PublicKey,
    /// Timestamp (seconds)
    pub created_at: Timestamp,
    /// Kind
    pub kind: Kind,
    /// Tag list
    pub tags: Vec<Tag>,
    /// Content
    pub content: String,
    /// Signature
    pub sig: Signature,
}

impl Event {
    /// Verify both the id (recomputed from the canonical serialization) and
    /// the Schnorr signature.
    pub fn verify(&self) -> Result<(), Error> {
        let id: EventId = EventId::new(
            &self.pubkey,
            self.created_at,
            self.kind,
            &self.tags,
            &self.content,
        );
        if id != self.id {
            return Err(Error::InvalidId);
        }

        let message: Message = Message::from_digest(id.to_bytes());
        SECP256K1
            .verify_schnorr(&self.sig, &message, &self.pubkey)
            .map_err(|_| Error::InvalidSignature)
    }

    /// Iterate the recipients declared in `p` tags
    pub fn public_key_tags(&self) -> impl Iterator<Item = &PublicKey> {
        self.tags.iter().filter_map(|tag| match tag {
            Tag::PublicKey(public_key) => Some(public_key),
            _ => None,
        })
    }

    /// Check if `public_key` appears in a `p` tag
    #[inline]
    pub fn is_addressed_to(&self, public_key: &PublicKey) -> bool {
        self.public_key_tags().any(|pk| pk == public_key)
    }

    /// Get the `d` tag value, if any
    pub fn identifier(&self) -> Option<&str> {
        self.tags.iter().find_map(|tag| match tag {
            Tag::Identifier(id) => Some(id.as_str()),
            _ => None,
        })
    }

    /// The key replies should target: the `response` tag if present,
    /// otherwise the author.
    pub fn response_target(&self) -> PublicKey {
        self.tags
            .iter()
            .find_map(|tag| match tag {
                Tag::Response(public_key) => Some(*public_key),
                _ => None,
            })
            .unwrap_or(self.pubkey)
    }

    /// Get the NIP-13 nonce tag, if any
    pub fn pow_nonce(&self) -> Option<(u128, u8)> {
        self.tags.iter().find_map(|tag| match tag {
            Tag::Nonce { nonce, difficulty } => Some((*nonce, *difficulty)),
            _ => None,
        })
    }

    /// Deserialize from JSON string.
    ///
    /// Parses only; call [`Event::verify`] to check id and signature.
    pub fn from_json<T>(json: T) -> Result<Self, Error>
    where
        T: AsRef<[u8]>,
    {
        Ok(serde_json::from_slice(json.as_ref())?)
    }

    /// Serialize as JSON string
    pub fn as_json(&self) -> String {
        serde_json::json!(self).to_string()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Keys;

    const SAMPLE_EVENT: &str = r#"{"content":"uRuvYr585B80L6rSJiHocw==?iv=oh6LVqdsYYol3JfFnXTbPA==","created_at":1640839235,"id":"2be17aa3031bdcb006f0fce80c146dea9c1c0268b0af2398bb673365c6444d45","kind":4,"pubkey":"f86c44a2de95d9149b51c6a29afeabba264c18e2fa7c49de93424a0c56947785","sig":"a5d9290ef9659083c490b303eb7ee41356d8778ff19f2f91776c8dc4443388a64ffcf336e61af4c25c05ac3ae952d1ced889ed655b67790891222aaa15b99fdd","tags":[["p","13adc511de7e1cfcf1c6b7f6365fb5a03442d7bcacf565ea57fa7770912c023d"]]}"#;

    #[test]
    fn test_parse_and_verify_sample() {
        let event = Event::from_json(SAMPLE_EVENT).unwrap();
        event.verify().unwrap();
        assert_eq!(event.kind, Kind::from(4));
        assert_eq!(event.public_key_tags().count(), 1);
    }

    #[test]
    fn test_json_round_trip() {
        let event = Event::from_json(SAMPLE_EVENT).unwrap();
        let back = Event::from_json(event.as_json()).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn test_tampered_content_fails_verify() {
        let mut event = Event::from_json(SAMPLE_EVENT).unwrap();
        event.content.push('x');
        assert!(matches!(event.verify(), Err(Error::InvalidId)));
    }

    #[test]
    fn test_response_target_defaults_to_author() {
        let keys = Keys::generate();
        let event = EventBuilder::new(Kind::MESSAGE, "ciphertext", [])
            .sign(&keys)
            .unwrap();
        assert_eq!(event.response_target(), keys.public_key());

        let other = Keys::generate().public_key();
        let event = EventBuilder::new(Kind::MESSAGE, "ciphertext", [Tag::Response(other)])
            .sign(&keys)
            .unwrap();
        assert_eq!(event.response_target(), other);
    }
}
