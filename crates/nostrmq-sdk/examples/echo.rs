// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Echo node: replies to every message with its own payload.
//!
//! ```sh
//! cargo run --example echo -- <secret-key-hex> <relay-url>...
//! ```

use nostrmq_sdk::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let secret_key = args.next().expect("usage: echo <secret-key-hex> <relay-url>...");
    let relays: Vec<String> = args.collect();

    let config = Config::new(secret_key, relays)?
        .tracking(TrackerOptions::new().cache_dir(".nostrmq-echo"));
    let client = Client::new(config);

    println!("listening as {}", client.keys().public_key());

    let mut subscription = client
        .receive(ReceiveOptions::new(), |message| async move {
            println!("{} -> {}", message.sender, message.payload);
            Ok(())
        })
        .await?;

    while let Some(message) = subscription.recv().await {
        let reply = SendOptions::new(
            message.event.response_target().to_hex(),
            serde_json::json!({ "echo": message.payload }),
        );
        match client.send(reply).await {
            Ok(id) => println!("echoed in {id}"),
            Err(e) => eprintln!("echo failed: {e}"),
        }
    }

    Ok(())
}
