// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Event builder

use super::{Error, Event, Kind, Tag, UnsignedEvent};
use crate::key::{Keys, PublicKey};
use crate::Timestamp;

/// Event template builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBuilder {
    kind: Kind,
    content: String,
    tags: Vec<Tag>,
    custom_created_at: Option<Timestamp>,
}

impl EventBuilder {
    /// New builder
    pub fn new<S, I>(kind: Kind, content: S, tags: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = Tag>,
    {
        Self {
            kind,
            content: content.into(),
            tags: tags.into_iter().collect(),
            custom_created_at: None,
        }
    }

    /// Append a tag
    pub fn add_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Override `created_at` (defaults to now at build time)
    pub fn custom_created_at(mut self, created_at: Timestamp) -> Self {
        self.custom_created_at = Some(created_at);
        self
    }

    /// Build the unsigned template for `pubkey`
    pub fn build(self, pubkey: PublicKey) -> UnsignedEvent {
        let created_at: Timestamp = self.custom_created_at.unwrap_or_else(Timestamp::now);
        UnsignedEvent::new(pubkey, created_at, self.kind, self.tags, self.content)
    }

    /// Build and sign in one step
    pub fn sign(self, keys: &Keys) -> Result<Event, Error> {
        self.build(keys.public_key()).sign(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_tag_order_preserved() {
        let keys = Keys::generate();
        let target = Keys::generate().public_key();
        let event = EventBuilder::new(
            Kind::MESSAGE,
            "ciphertext",
            [
                Tag::PublicKey(target),
                Tag::Identifier(String::from("1700000000-1")),
            ],
        )
        .sign(&keys)
        .unwrap();

        assert_eq!(event.tags[0], Tag::PublicKey(target));
        assert_eq!(event.tags[1], Tag::Identifier(String::from("1700000000-1")));
        assert!(event.is_addressed_to(&target));
    }

    #[test]
    fn test_custom_created_at() {
        let keys = Keys::generate();
        let unsigned = EventBuilder::new(Kind::MESSAGE, "", [])
            .custom_created_at(Timestamp::from(1_650_000_000))
            .build(keys.public_key());
        assert_eq!(unsigned.created_at, Timestamp::from(1_650_000_000));
    }
}
