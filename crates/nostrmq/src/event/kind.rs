// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Event Kind

use core::fmt;

use serde::{Deserialize, Serialize};

/// Event kind
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Kind(u16);

impl Kind {
    /// The kind carrying NostrMQ messages.
    ///
    /// Lives in the addressable range, so relays treat a `(pubkey, kind, d)`
    /// triple as replaceable.
    pub const MESSAGE: Self = Self(30072);

    /// Construct from a raw kind number
    #[inline]
    pub const fn new(kind: u16) -> Self {
        Self(kind)
    }

    /// Get as [`u16`]
    #[inline]
    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    /// Check if the kind is addressable (parameterized replaceable): `30000 <= kind < 40000`
    #[inline]
    pub fn is_addressable(&self) -> bool {
        (30_000..40_000).contains(&self.0)
    }
}

impl From<u16> for Kind {
    fn from(kind: u16) -> Self {
        Self(kind)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
