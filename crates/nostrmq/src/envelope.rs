// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Cleartext envelope
//!
//! The JSON document that gets encrypted into `event.content`:
//! `{"target": <pubkey>, "response": <pubkey>, "payload": <any JSON>}`.
//! `target` always equals the `p` tag of the enclosing event.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::key::PublicKey;

/// Cleartext envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Recipient
    pub target: PublicKey,
    /// Key replies should be addressed to
    pub response: PublicKey,
    /// Application payload
    pub payload: Value,
}

impl Envelope {
    /// Create new [`Envelope`]
    pub fn new(target: PublicKey, response: PublicKey, payload: Value) -> Self {
        Self {
            target,
            response,
            payload,
        }
    }

    /// Check that the envelope is addressed to `public_key`.
    ///
    /// A mismatch means the sender encrypted for one key but tagged another;
    /// such messages are dropped.
    #[inline]
    pub fn is_for(&self, public_key: &PublicKey) -> bool {
        self.target == *public_key
    }

    /// Deserialize from JSON; all three fields are required and the pubkeys
    /// must be valid hex.
    pub fn from_json<T>(json: T) -> Result<Self, serde_json::Error>
    where
        T: AsRef<[u8]>,
    {
        serde_json::from_slice(json.as_ref())
    }

    /// Serialize as JSON string
    pub fn as_json(&self) -> String {
        serde_json::json!(self).to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::key::Keys;

    #[test]
    fn test_round_trip() {
        let target = Keys::generate().public_key();
        let response = Keys::generate().public_key();
        let envelope = Envelope::new(target, response, json!({"n": 1}));

        let back = Envelope::from_json(envelope.as_json()).unwrap();
        assert_eq!(back, envelope);
        assert!(back.is_for(&target));
        assert!(!back.is_for(&response));
    }

    #[test]
    fn test_missing_fields_are_rejected() {
        let target = Keys::generate().public_key();
        assert!(Envelope::from_json(format!(r#"{{"target":"{target}"}}"#)).is_err());
        assert!(Envelope::from_json("{}").is_err());
        assert!(Envelope::from_json("not json").is_err());
    }

    #[test]
    fn test_invalid_pubkey_is_rejected() {
        let json = r#"{"target":"nope","response":"nope","payload":null}"#;
        assert!(Envelope::from_json(json).is_err());
    }
}
