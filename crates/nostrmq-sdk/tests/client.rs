// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

mod common;

use std::sync::Arc;
use std::time::Duration;

use nostrmq::nips::nip04;
use nostrmq::{Envelope, EventBuilder, Keys, Kind, Tag};
use nostrmq_sdk::{Client, Config, Error, IncomingMessage, ReceiveOptions, SendOptions, TrackerOptions};
use serde_json::json;
use tokio::sync::Mutex;
use tokio::time::timeout;

use self::common::{MockBehavior, MockRelay};

const WAIT: Duration = Duration::from_secs(5);
const QUIET: Duration = Duration::from_millis(500);

fn config_for(keys: &Keys, relays: &[&MockRelay]) -> Config {
    Config::new(
        keys.secret_key().to_secret_hex(),
        relays.iter().map(|r| r.url().to_string()),
    )
    .unwrap()
    .tracking(TrackerOptions::new().enable_persistence(false))
}

fn recording_handler(
    sink: Arc<Mutex<Vec<IncomingMessage>>>,
) -> impl Fn(IncomingMessage) -> futures_util::future::BoxFuture<'static, Result<(), Box<dyn std::error::Error + Send + Sync>>>
       + Send
       + Sync
       + 'static {
    move |message| {
        let sink = sink.clone();
        Box::pin(async move {
            sink.lock().await.push(message);
            Ok(())
        })
    }
}

#[tokio::test]
async fn test_self_loop_send_receive() {
    let relay = MockRelay::start().await;
    let keys = Keys::generate();
    let client = Client::new(config_for(&keys, &[&relay]));

    let received: Arc<Mutex<Vec<IncomingMessage>>> = Arc::new(Mutex::new(Vec::new()));
    let mut subscription = client
        .receive(ReceiveOptions::new(), recording_handler(received.clone()))
        .await
        .unwrap();

    let event_id = client
        .send(
            SendOptions::new(keys.public_key().to_hex(), json!({"n": 1})).timeout(WAIT),
        )
        .await
        .unwrap();

    let message = timeout(WAIT, subscription.recv())
        .await
        .expect("message in time")
        .expect("stream open");

    assert_eq!(message.payload, json!({"n": 1}));
    assert_eq!(message.sender, keys.public_key());
    assert_eq!(message.event.id, event_id);
    // Reply target defaults to the author
    assert_eq!(message.event.response_target(), keys.public_key());

    // Exactly once
    assert!(timeout(QUIET, subscription.recv()).await.is_err());
    assert_eq!(received.lock().await.len(), 1);

    subscription.close().await;
}

#[tokio::test]
async fn test_send_between_two_identities() {
    let relay = MockRelay::start().await;
    let alice = Keys::generate();
    let bob = Keys::generate();

    let bob_client = Client::new(config_for(&bob, &[&relay]));
    let mut inbox = bob_client
        .receive(ReceiveOptions::new(), |_| async { Ok(()) })
        .await
        .unwrap();

    let alice_client = Client::new(config_for(&alice, &[&relay]));
    alice_client
        .send(
            SendOptions::new(bob.public_key().to_hex(), json!({"rpc": "ping"})).timeout(WAIT),
        )
        .await
        .unwrap();

    let message = timeout(WAIT, inbox.recv())
        .await
        .expect("message in time")
        .expect("stream open");

    assert_eq!(message.sender, alice.public_key());
    assert_eq!(message.payload, json!({"rpc": "ping"}));
    assert_eq!(message.event.response_target(), alice.public_key());

    inbox.close().await;
    alice_client.shutdown().await;
}

#[tokio::test]
async fn test_duplicate_event_from_two_relays_is_delivered_once() {
    let relay_a = MockRelay::start().await;
    let relay_b = MockRelay::start().await;
    let keys = Keys::generate();

    let client = Client::new(config_for(&keys, &[&relay_a, &relay_b]));

    let received: Arc<Mutex<Vec<IncomingMessage>>> = Arc::new(Mutex::new(Vec::new()));
    let mut subscription = client
        .receive(ReceiveOptions::new(), recording_handler(received.clone()))
        .await
        .unwrap();

    client
        .send(SendOptions::new(keys.public_key().to_hex(), json!({"n": 2})).timeout(WAIT))
        .await
        .unwrap();

    let first = timeout(WAIT, subscription.recv()).await.unwrap().unwrap();
    assert_eq!(first.payload, json!({"n": 2}));

    // The copy from the second relay must be suppressed
    assert!(timeout(QUIET, subscription.recv()).await.is_err());
    assert_eq!(received.lock().await.len(), 1);

    subscription.close().await;
}

#[tokio::test]
async fn test_publish_rejected_when_no_relay_accepts() {
    let relay = MockRelay::start_with(MockBehavior::Reject).await;
    let keys = Keys::generate();
    let client = Client::new(config_for(&keys, &[&relay]));

    let err = client
        .send(SendOptions::new(keys.public_key().to_hex(), json!(null)).timeout(WAIT))
        .await
        .unwrap_err();

    match err {
        Error::PublishRejected { output } => {
            assert!(!output.is_success());
            assert_eq!(output.failed.len(), 1);
            assert!(output.failed[&relay.url()].contains("blocked"));
        }
        other => panic!("expected PublishRejected, got: {other}"),
    }

    client.shutdown().await;
}

#[tokio::test]
async fn test_send_validates_target() {
    let relay = MockRelay::start().await;
    let keys = Keys::generate();
    let client = Client::new(config_for(&keys, &[&relay]));

    let err = client
        .send(SendOptions::new("not-a-pubkey", json!(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(..)));

    let err = client
        .send(
            SendOptions::new(keys.public_key().to_hex(), json!(1)).response("also-invalid"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(..)));
}

#[tokio::test]
async fn test_mismatched_envelope_target_is_dropped() {
    let relay = MockRelay::start().await;
    let alice = Keys::generate();
    let bob = Keys::generate();
    let carol = Keys::generate();

    let bob_client = Client::new(config_for(&bob, &[&relay]));
    let received: Arc<Mutex<Vec<IncomingMessage>>> = Arc::new(Mutex::new(Vec::new()));
    let mut inbox = bob_client
        .receive(ReceiveOptions::new(), recording_handler(received.clone()))
        .await
        .unwrap();

    // Tagged for Bob, but the sealed envelope says Carol
    let envelope = Envelope::new(carol.public_key(), alice.public_key(), json!("sneaky"));
    let content =
        nip04::encrypt(alice.secret_key(), &bob.public_key(), envelope.as_json()).unwrap();
    let event = EventBuilder::new(
        Kind::MESSAGE,
        content,
        [
            Tag::PublicKey(bob.public_key()),
            Tag::Identifier(String::from("forged-1")),
        ],
    )
    .sign(&alice)
    .unwrap();

    let sender = Client::new(config_for(&alice, &[&relay]));
    sender.pool().add_relay(relay.url()).await.unwrap();
    sender.pool().connect(WAIT).await.unwrap();
    let output = sender.pool().publish(event, None).await.unwrap();
    assert!(output.is_success());

    assert!(timeout(QUIET, inbox.recv()).await.is_err());
    assert!(received.lock().await.is_empty());

    inbox.close().await;
    sender.shutdown().await;
}

#[tokio::test]
async fn test_send_with_pow_carries_valid_nonce() {
    use nostrmq::nips::nip13;

    let relay = MockRelay::start().await;
    let keys = Keys::generate();
    let client = Client::new(config_for(&keys, &[&relay]));

    client
        .send(
            SendOptions::new(keys.public_key().to_hex(), json!({"mined": true}))
                .pow(8u8)
                .timeout(WAIT),
        )
        .await
        .unwrap();

    let events = relay.events().await;
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert!(nip13::has_valid_pow(event, 8));
    assert!(matches!(
        event.pow_nonce(),
        Some((_, 8))
    ));
    event.verify().unwrap();

    client.shutdown().await;
}
