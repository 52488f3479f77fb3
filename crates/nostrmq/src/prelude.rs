// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Prelude

#![allow(unknown_lints)]
#![allow(ambiguous_glob_reexports)]
#![doc(hidden)]

pub use crate::envelope::*;
pub use crate::event::builder::*;
pub use crate::event::id::*;
pub use crate::event::kind::*;
pub use crate::event::tag::*;
pub use crate::event::unsigned::*;
pub use crate::event::*;
pub use crate::key::*;
pub use crate::message::*;
pub use crate::nips::nip04;
pub use crate::nips::nip13;
pub use crate::types::time::*;
pub use crate::types::url::*;
pub use crate::util::hex;
pub use crate::{Timestamp, SECP256K1};
