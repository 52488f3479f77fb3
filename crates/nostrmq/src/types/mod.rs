// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Types

pub mod time;
pub mod url;

pub use self::time::Timestamp;
pub use self::url::RelayUrl;
