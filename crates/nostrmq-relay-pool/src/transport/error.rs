// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Transport error

use std::fmt;

/// Transport error
#[derive(Debug)]
pub enum TransportError {
    /// Connection attempt didn't complete in time
    Timeout,
    /// Backend error
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

impl std::error::Error for TransportError {}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Backend(e) => write!(f, "{e}"),
        }
    }
}

impl TransportError {
    /// Wrap a backend error
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(error))
    }
}
