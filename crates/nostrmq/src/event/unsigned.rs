// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Unsigned Event

use secp256k1::schnorr::Signature;
use secp256k1::Message;
use serde::{Deserialize, Serialize};

use super::{Error, Event, EventId, Kind, Tag};
use crate::key::{Keys, PublicKey};
use crate::Timestamp;

/// An event template: everything but the signature.
///
/// The id is kept coherent with the other fields by construction; mutating
/// methods recompute it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedEvent {
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
}

impl UnsignedEvent {
    /// Build a template, computing its id
    pub fn new(
        pubkey: PublicKey,
        created_at: Timestamp,
        kind: Kind,
        tags: Vec<Tag>,
        content: String,
    ) -> Self {
        let id: EventId = EventId::new(&pubkey, created_at, kind, &tags, &content);
        Self {
            id,
            pubkey,
            created_at,
            kind,
            tags,
            content,
        }
    }

    /// Recompute the id after a field mutation
    pub fn recompute_id(&mut self) {
        self.id = EventId::new(
            &self.pubkey,
            self.created_at,
            self.kind,
            &self.tags,
            &self.content,
        );
    }

    /// Sign the template.
    ///
    /// Fails if `keys` does not match the template's author.
    pub fn sign(self, keys: &Keys) -> Result<Event, Error> {
        if keys.public_key() != self.pubkey {
            return Err(Error::PublicKeyMismatch);
        }
        let message: Message = Message::from_digest(self.id.to_bytes());
        let sig: Signature = keys.sign_schnorr(&message);
        self.add_signature(sig)
    }

    /// Attach an externally produced signature and verify the result
    pub fn add_signature(self, sig: Signature) -> Result<Event, Error> {
        let event = Event {
            id: self.id,
            pubkey: self.pubkey,
            created_at: self.created_at,
            kind: self.kind,
            tags: self.tags,
            content: self.content,
            sig,
        };
        event.verify()?;
        Ok(event)
    }
}
