// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Utilities

use core::future::Future;
use core::pin::Pin;

pub mod hex;

/// Boxed future
pub type BoxedFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
