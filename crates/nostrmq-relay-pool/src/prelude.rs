// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Prelude

#![allow(unknown_lints)]
#![allow(ambiguous_glob_reexports)]
#![doc(hidden)]

pub use nostrmq::prelude::*;

pub use crate::pool::*;
pub use crate::relay::*;
pub use crate::transport::*;
