// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! NostrMQ SDK
//!
//! High-level client for encrypted point-to-point messaging over Nostr
//! relays: the send pipeline (encrypt, optionally mine, sign, publish),
//! the receive pipeline (subscribe, validate, decrypt, deduplicate,
//! deliver), replay tracking and configuration.
//!
//! ```no_run
//! use nostrmq_sdk::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::new(
//!         "6b911fd37cdf5c81d4c0adb1ab7fa822ed253ab0ad9aa18d77257c88b29b718e",
//!         ["wss://relay.example.com"],
//!     )?;
//!     let client = Client::new(config);
//!
//!     let mut subscription = client
//!         .receive(ReceiveOptions::new(), |message| async move {
//!             println!("{} says: {}", message.sender, message.payload);
//!             Ok(())
//!         })
//!         .await?;
//!
//!     while let Some(message) = subscription.recv().await {
//!         let reply = SendOptions::new(
//!             message.event.response_target().to_hex(),
//!             serde_json::json!({"ack": message.event.id}),
//!         );
//!         client.send(reply).await?;
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

pub mod client;
pub mod config;
pub mod error;
pub mod prelude;
pub mod tracker;

pub use self::client::{
    Client, IncomingMessage, PowPolicy, ReceiveOptions, SendOptions, Subscription,
};
pub use self::config::{Config, ConfigError};
pub use self::error::Error;
pub use self::tracker::{ReplayTracker, TrackerOptions};
