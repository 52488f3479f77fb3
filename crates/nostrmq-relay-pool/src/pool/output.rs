// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Publish output

use std::collections::{HashMap, HashSet};
use std::fmt;

use nostrmq::RelayUrl;

/// Per-relay outcome of a publish
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    /// Relays that acknowledged the event
    pub success: HashSet<RelayUrl>,
    /// Relays that failed, with the reason
    pub failed: HashMap<RelayUrl, String>,
}

impl Output {
    /// A publish succeeded iff at least one relay acknowledged
    #[inline]
    pub fn is_success(&self) -> bool {
        !self.success.is_empty()
    }

    /// Check a single relay's outcome
    #[inline]
    pub fn acknowledged(&self, url: &RelayUrl) -> bool {
        self.success.contains(url)
    }

    /// Number of relays the event was offered to
    #[inline]
    pub fn len(&self) -> usize {
        self.success.len() + self.failed.len()
    }

    /// Check if no relay was tried
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.success.is_empty() && self.failed.is_empty()
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} relays acknowledged",
            self.success.len(),
            self.len()
        )?;
        for (url, reason) in self.failed.iter() {
            write!(f, "; {url}: {reason}")?;
        }
        Ok(())
    }
}
