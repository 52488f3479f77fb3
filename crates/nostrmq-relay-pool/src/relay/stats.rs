// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Relay connection stats

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use nostrmq::Timestamp;

/// Relay connection stats
#[derive(Debug, Clone, Default)]
pub struct RelayConnectionStats {
    inner: Arc<InnerStats>,
}

#[derive(Debug, Default)]
struct InnerStats {
    attempts: AtomicU32,
    success: AtomicU32,
    consecutive_failures: AtomicU32,
    connected_at: AtomicU64,
}

impl RelayConnectionStats {
    /// Total connection attempts
    #[inline]
    pub fn attempts(&self) -> u32 {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    /// Successful handshakes
    #[inline]
    pub fn success(&self) -> u32 {
        self.inner.success.load(Ordering::SeqCst)
    }

    /// Failures since the last successful handshake; drives backoff and
    /// parking.
    #[inline]
    pub fn consecutive_failures(&self) -> u32 {
        self.inner.consecutive_failures.load(Ordering::SeqCst)
    }

    /// When the current websocket session was established (zero if never)
    pub fn connected_at(&self) -> Timestamp {
        Timestamp::from(self.inner.connected_at.load(Ordering::SeqCst))
    }

    pub(super) fn new_attempt(&self) {
        self.inner.attempts.fetch_add(1, Ordering::SeqCst);
    }

    pub(super) fn new_success(&self) {
        self.inner.success.fetch_add(1, Ordering::SeqCst);
        self.inner.consecutive_failures.store(0, Ordering::SeqCst);
        self.inner
            .connected_at
            .store(Timestamp::now().as_u64(), Ordering::SeqCst);
    }

    pub(super) fn new_failure(&self) {
        self.inner.consecutive_failures.fetch_add(1, Ordering::SeqCst);
    }
}
