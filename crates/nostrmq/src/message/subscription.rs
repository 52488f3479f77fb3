// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Subscription id and filters

use core::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::event::{Event, Kind};
use crate::key::PublicKey;
use crate::util::hex;
use crate::Timestamp;

/// Subscription ID
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    /// Create new [`SubscriptionId`]
    pub fn new<S>(id: S) -> Self
    where
        S: Into<String>,
    {
        Self(id.into())
    }

    /// Generate a random 32-char [`SubscriptionId`]
    pub fn generate() -> Self {
        let mut random: [u8; 16] = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut random);
        Self::new(hex::encode(random))
    }

    /// Get as `&str`
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Subscription filter
///
/// Serializes to the NIP-01 filter object; empty fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Event ids (hex)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<String>,
    /// Authors
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<PublicKey>,
    /// Kinds
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kinds: Vec<Kind>,
    /// `#p` tag values
    #[serde(rename = "#p", default, skip_serializing_if = "Vec::is_empty")]
    pub pubkeys: Vec<PublicKey>,
    /// `#d` tag values
    #[serde(rename = "#d", default, skip_serializing_if = "Vec::is_empty")]
    pub identifiers: Vec<String>,
    /// Events must be newer than this to pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<Timestamp>,
    /// Events must be older than this to pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<Timestamp>,
    /// Maximum number of events returned by the initial query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl Filter {
    /// Create new empty [`Filter`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event id (hex)
    pub fn id<S>(mut self, id: S) -> Self
    where
        S: Into<String>,
    {
        let id: String = id.into();
        if !self.ids.contains(&id) {
            self.ids.push(id);
        }
        self
    }

    /// Add an author
    pub fn author(mut self, author: PublicKey) -> Self {
        if !self.authors.contains(&author) {
            self.authors.push(author);
        }
        self
    }

    /// Add a kind
    pub fn kind(mut self, kind: Kind) -> Self {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
        self
    }

    /// Add a `#p` value
    pub fn pubkey(mut self, pubkey: PublicKey) -> Self {
        if !self.pubkeys.contains(&pubkey) {
            self.pubkeys.push(pubkey);
        }
        self
    }

    /// Add a `#d` value
    pub fn identifier<S>(mut self, identifier: S) -> Self
    where
        S: Into<String>,
    {
        let identifier: String = identifier.into();
        if !self.identifiers.contains(&identifier) {
            self.identifiers.push(identifier);
        }
        self
    }

    /// Set `since`
    pub fn since(mut self, since: Timestamp) -> Self {
        self.since = Some(since);
        self
    }

    /// Set `until`
    pub fn until(mut self, until: Timestamp) -> Self {
        self.until = Some(until);
        self
    }

    /// Set `limit`
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check if `event` passes this filter
    pub fn match_event(&self, event: &Event) -> bool {
        if !self.ids.is_empty() && !self.ids.iter().any(|id| *id == event.id.to_hex()) {
            return false;
        }
        if !self.authors.is_empty() && !self.authors.contains(&event.pubkey) {
            return false;
        }
        if !self.kinds.is_empty() && !self.kinds.contains(&event.kind) {
            return false;
        }
        if !self.pubkeys.is_empty() && !self.pubkeys.iter().any(|pk| event.is_addressed_to(pk)) {
            return false;
        }
        if !self.identifiers.is_empty()
            && !event
                .identifier()
                .is_some_and(|id| self.identifiers.iter().any(|i| i == id))
        {
            return false;
        }
        if let Some(since) = self.since {
            if event.created_at < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if event.created_at > until {
                return false;
            }
        }
        true
    }

    /// Serialize to JSON string
    pub fn as_json(&self) -> String {
        serde_json::json!(self).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventBuilder;
    use crate::key::Keys;

    #[test]
    fn test_filter_json_shape() {
        let pk =
            PublicKey::from_hex("379e863e8357163b5bce5d2688dc4f1dcc2d505222fb8d74db600f30535dfdfe")
                .unwrap();
        let filter = Filter::new()
            .kind(Kind::MESSAGE)
            .pubkey(pk)
            .since(Timestamp::from(1_700_000_000));
        assert_eq!(
            filter.as_json(),
            r##"{"#p":["379e863e8357163b5bce5d2688dc4f1dcc2d505222fb8d74db600f30535dfdfe"],"kinds":[30072],"since":1700000000}"##
        );
    }

    #[test]
    fn test_filter_serde_round_trip() {
        let filter = Filter::new()
            .kind(Kind::MESSAGE)
            .identifier("req-7")
            .limit(10);
        let back: Filter = serde_json::from_str(&filter.as_json()).unwrap();
        assert_eq!(back, filter);
    }

    #[test]
    fn test_match_event() {
        let keys = Keys::generate();
        let target = Keys::generate().public_key();
        let event = EventBuilder::new(
            Kind::MESSAGE,
            "ciphertext",
            [crate::event::Tag::PublicKey(target)],
        )
        .custom_created_at(Timestamp::from(1_700_000_000))
        .sign(&keys)
        .unwrap();

        assert!(Filter::new().kind(Kind::MESSAGE).match_event(&event));
        assert!(Filter::new().pubkey(target).match_event(&event));
        assert!(!Filter::new()
            .pubkey(keys.public_key())
            .match_event(&event));
        assert!(Filter::new()
            .since(Timestamp::from(1_700_000_000))
            .match_event(&event));
        assert!(!Filter::new()
            .since(Timestamp::from(1_700_000_001))
            .match_event(&event));
        assert!(!Filter::new().kind(Kind::from(4)).match_event(&event));
    }

    #[test]
    fn test_subscription_id_generate() {
        let a = SubscriptionId::generate();
        let b = SubscriptionId::generate();
        assert_eq!(a.as_str().len(), 32);
        assert_ne!(a, b);
    }
}
