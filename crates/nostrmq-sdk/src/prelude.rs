// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Prelude

#![allow(unknown_lints)]
#![allow(ambiguous_glob_reexports)]
#![doc(hidden)]

pub use nostrmq::prelude::*;
pub use nostrmq_relay_pool::prelude::*;

pub use crate::client::options::*;
pub use crate::client::*;
pub use crate::config::*;
pub use crate::error::*;
pub use crate::tracker::*;
