// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! NostrMQ Relay Pool
//!
//! A multi-endpoint websocket client: persistent relay connections with
//! backoff/reconnect, multiplexed subscriptions, and publishes with
//! per-relay acknowledgement.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

pub mod pool;
pub mod prelude;
pub mod relay;
pub mod transport;

pub use self::pool::{Output, RelayPool, RelayPoolNotification, RelayPoolOptions};
pub use self::relay::{Relay, RelayConnectionStats, RelayNotification, RelayOptions, RelayStatus};
pub use self::transport::{DefaultWebsocketTransport, WebSocketTransport};
