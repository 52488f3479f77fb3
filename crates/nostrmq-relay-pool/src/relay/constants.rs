// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Relay constants

use core::time::Duration;

/// Default timeout for a single connection attempt
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Default wait for the `OK` acknowledging a published event
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

pub(super) const BACKOFF_BASE: Duration = Duration::from_secs(1);
pub(super) const BACKOFF_FACTOR: u32 = 2;
pub(super) const BACKOFF_CAP: Duration = Duration::from_secs(30);

/// Reconnect attempts before a relay parks in `Terminated`
pub(super) const MAX_RECONNECT_ATTEMPTS: u32 = 10;
