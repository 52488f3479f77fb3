// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! NIPs
//!
//! <https://github.com/nostr-protocol/nips>

pub mod nip04;
pub mod nip13;
