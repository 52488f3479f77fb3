// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Mock relay speaking the NIP-01 subset the pool needs.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{Sink, SinkExt, StreamExt};
use nostrmq::{Event, Filter, RelayUrl};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, RwLock};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// How the relay reacts to an `EVENT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    /// Store, reply `OK true`, feed subscribers
    Accept,
    /// Reply `OK false`
    Reject,
    /// Close the socket without replying
    DropConnection,
}

#[derive(Debug)]
struct State {
    behavior: MockBehavior,
    events: RwLock<Vec<Event>>,
    feed: broadcast::Sender<Event>,
}

/// Mock relay bound to a random localhost port
pub struct MockRelay {
    addr: SocketAddr,
    state: Arc<State>,
    shutdown: broadcast::Sender<()>,
}

impl MockRelay {
    pub async fn start() -> Self {
        Self::start_with(MockBehavior::Accept).await
    }

    pub async fn start_with(behavior: MockBehavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown, mut shutdown_rx) = broadcast::channel::<()>(1);
        let (feed, ..) = broadcast::channel::<Event>(64);

        let state = Arc::new(State {
            behavior,
            events: RwLock::new(Vec::new()),
            feed,
        });

        let accept_state = state.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    result = listener.accept() => {
                        if let Ok((stream, ..)) = result {
                            tokio::spawn(handle_connection(stream, accept_state.clone()));
                        }
                    }
                }
            }
        });

        Self {
            addr,
            state,
            shutdown,
        }
    }

    pub fn url(&self) -> RelayUrl {
        RelayUrl::parse(&format!("ws://{}", self.addr)).unwrap()
    }

    /// Events the relay accepted
    pub async fn events(&self) -> Vec<Event> {
        self.state.events.read().await.clone()
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }
}

impl Drop for MockRelay {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn handle_connection(stream: TcpStream, state: Arc<State>) {
    let ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(..) => return,
    };

    let (mut write, mut read) = ws.split();
    let mut local_subs: HashMap<String, Vec<Filter>> = HashMap::new();
    let mut feed = state.feed.subscribe();

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if !process_message(&text, &state, &mut local_subs, &mut write).await {
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = write.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(..))) | Some(Err(..)) | None => break,
                    _ => {}
                }
            }
            event = feed.recv() => {
                if let Ok(event) = event {
                    for (sub_id, filters) in local_subs.iter() {
                        if filters.iter().any(|f| f.match_event(&event)) {
                            let msg = json!(["EVENT", sub_id, event]).to_string();
                            let _ = write.send(Message::Text(msg)).await;
                        }
                    }
                }
            }
        }
    }
}

/// Returns `false` when the connection should be dropped.
async fn process_message(
    text: &str,
    state: &Arc<State>,
    local_subs: &mut HashMap<String, Vec<Filter>>,
    write: &mut (impl Sink<Message> + Unpin),
) -> bool {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return true;
    };
    let Some(array) = value.as_array() else {
        return true;
    };

    match array.first().and_then(Value::as_str) {
        Some("EVENT") => {
            let Some(event) = array
                .get(1)
                .cloned()
                .and_then(|v| serde_json::from_value::<Event>(v).ok())
            else {
                return true;
            };

            match state.behavior {
                MockBehavior::Accept => {
                    state.events.write().await.push(event.clone());
                    let ok = json!(["OK", event.id, true, ""]).to_string();
                    let _ = write.send(Message::Text(ok)).await;
                    let _ = state.feed.send(event);
                }
                MockBehavior::Reject => {
                    let ok = json!(["OK", event.id, false, "blocked: mock relay says no"])
                        .to_string();
                    let _ = write.send(Message::Text(ok)).await;
                }
                MockBehavior::DropConnection => return false,
            }
        }
        Some("REQ") => {
            let Some(sub_id) = array.get(1).and_then(Value::as_str) else {
                return true;
            };
            let filters: Vec<Filter> = array[2..]
                .iter()
                .cloned()
                .filter_map(|v| serde_json::from_value(v).ok())
                .collect();

            // Stored events first, then EOSE
            for event in state.events.read().await.iter() {
                if filters.iter().any(|f| f.match_event(event)) {
                    let msg = json!(["EVENT", sub_id, event]).to_string();
                    let _ = write.send(Message::Text(msg)).await;
                }
            }
            let _ = write
                .send(Message::Text(json!(["EOSE", sub_id]).to_string()))
                .await;

            local_subs.insert(sub_id.to_string(), filters);
        }
        Some("CLOSE") => {
            if let Some(sub_id) = array.get(1).and_then(Value::as_str) {
                local_subs.remove(sub_id);
                let _ = write
                    .send(Message::Text(json!(["CLOSED", sub_id, ""]).to_string()))
                    .await;
            }
        }
        _ => {}
    }

    true
}
