// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! WebSocket transport
//!
//! The pool talks to relays through [`WebSocketTransport`], so tests can
//! stand in a fake relay at this seam without touching the connection logic.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{Sink, SinkExt, Stream, StreamExt, TryStreamExt};
use nostrmq::util::BoxedFuture;
use nostrmq::RelayUrl;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub mod error;

pub use self::error::TransportError;

/// WebSocket transport sink
pub type BoxSink = Box<dyn Sink<Message, Error = TransportError> + Send + Unpin>;
/// WebSocket transport stream
pub type BoxStream = Box<dyn Stream<Item = Result<Message, TransportError>> + Send + Unpin>;

/// WebSocket transport
pub trait WebSocketTransport: fmt::Debug + Send + Sync {
    /// Connect to `url`, resolving within `timeout`
    fn connect<'a>(
        &'a self,
        url: &'a RelayUrl,
        timeout: Duration,
    ) -> BoxedFuture<'a, Result<(BoxSink, BoxStream), TransportError>>;
}

/// Default websocket transport, backed by `tokio-tungstenite`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DefaultWebsocketTransport;

impl WebSocketTransport for DefaultWebsocketTransport {
    fn connect<'a>(
        &'a self,
        url: &'a RelayUrl,
        timeout: Duration,
    ) -> BoxedFuture<'a, Result<(BoxSink, BoxStream), TransportError>> {
        Box::pin(async move {
            let (socket, _) = tokio::time::timeout(timeout, connect_async(url.as_str()))
                .await
                .map_err(|_| TransportError::Timeout)?
                .map_err(TransportError::backend)?;

            let (tx, rx) = socket.split();

            let sink: BoxSink = Box::new(TransportSink(tx)) as BoxSink;
            let stream: BoxStream = Box::new(rx.map_err(TransportError::backend)) as BoxStream;

            Ok((sink, stream))
        })
    }
}

// Explicit sink wrapper instead of `sink_map_err`: the combinator panics if
// polled after an error.
struct TransportSink(SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>);

impl Sink<Message> for TransportSink {
    type Error = TransportError;

    fn poll_ready(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.0
            .poll_ready_unpin(cx)
            .map_err(TransportError::backend)
    }

    fn start_send(mut self: Pin<&mut Self>, item: Message) -> Result<(), Self::Error> {
        self.0
            .start_send_unpin(item)
            .map_err(TransportError::backend)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.0
            .poll_flush_unpin(cx)
            .map_err(TransportError::backend)
    }

    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.0
            .poll_close_unpin(cx)
            .map_err(TransportError::backend)
    }
}
