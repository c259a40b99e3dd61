//! WebSocket channel handle.
//!
//! One implementation parameterized by channel kind. The handle owns the
//! connect/close lifecycle of a single duplex connection and surfaces inbound
//! traffic and state transitions on a shared event stream. It never
//! reconnects on its own: a dropped channel stays dropped until the user
//! re-initiates connection through the coordinator.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream};

use crate::common::time::now_unix_millis;

use super::error::SessionError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// The three channel kinds of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Chat,
    VideoRelay,
    PredictionStream,
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Chat => "chat",
            Self::VideoRelay => "video",
            Self::PredictionStream => "prediction",
        };
        f.write_str(name)
    }
}

/// Transport-driven lifecycle of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closing,
    Closed,
}

/// Events surfaced by a channel to its owning coordinator
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    /// An inbound text payload, delivered in transport order
    Message { kind: ChannelKind, text: String },
    /// A lifecycle transition; `Closed` fires at most once per handle
    StateChanged { kind: ChannelKind, state: ChannelState },
}

pub(crate) enum OutboundCommand {
    Text(String),
    Close,
}

/// Shared lifecycle cell: the single place state transitions happen, so a
/// duplicate `Closed` can never be emitted.
struct Lifecycle {
    kind: ChannelKind,
    state: watch::Sender<ChannelState>,
    events: mpsc::UnboundedSender<ChannelEvent>,
}

impl Lifecycle {
    /// Apply a transition unless the channel is already closed or already in
    /// the target state. Returns whether the transition took effect.
    fn transition(&self, next: ChannelState) -> bool {
        let changed = self.state.send_if_modified(|current| {
            if *current == next || *current == ChannelState::Closed {
                false
            } else {
                *current = next;
                true
            }
        });
        if changed {
            let _ = self.events.send(ChannelEvent::StateChanged {
                kind: self.kind,
                state: next,
            });
        }
        changed
    }
}

/// Handle to one duplex channel, owned exclusively by its session.
pub struct ChannelHandle {
    kind: ChannelKind,
    endpoint: String,
    outbound: mpsc::UnboundedSender<OutboundCommand>,
    state: watch::Receiver<ChannelState>,
    lifecycle: Arc<Lifecycle>,
    last_activity: Arc<AtomicI64>,
}

impl ChannelHandle {
    /// Establish the connection and spawn the reader/writer tasks.
    ///
    /// Fails with [`SessionError::Connect`] when the transport cannot be
    /// established; a connect failure on one channel never affects another.
    pub async fn open(
        kind: ChannelKind,
        endpoint: &str,
        events: mpsc::UnboundedSender<ChannelEvent>,
    ) -> Result<Self, SessionError> {
        let (ws_stream, _response) =
            connect_async(endpoint)
                .await
                .map_err(|e| SessionError::Connect {
                    kind,
                    reason: e.to_string(),
                })?;
        tracing::info!("{} channel connected to {}", kind, endpoint);

        let (write, read) = ws_stream.split();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ChannelState::Connecting);
        let lifecycle = Arc::new(Lifecycle {
            kind,
            state: state_tx,
            events,
        });
        lifecycle.transition(ChannelState::Open);

        let last_activity = Arc::new(AtomicI64::new(now_unix_millis()));

        tokio::spawn(write_loop(write, outbound_rx, lifecycle.clone()));
        tokio::spawn(read_loop(read, lifecycle.clone(), last_activity.clone()));

        Ok(Self {
            kind,
            endpoint: endpoint.to_string(),
            outbound: outbound_tx,
            state: state_rx,
            lifecycle,
            last_activity,
        })
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    /// Whether the handle still counts as the live connection for its kind
    pub fn is_live(&self) -> bool {
        matches!(self.state(), ChannelState::Connecting | ChannelState::Open)
    }

    /// Unix millis of the last accepted send or inbound message
    pub fn last_activity_at(&self) -> i64 {
        self.last_activity.load(Ordering::Relaxed)
    }

    /// Queue one text payload for transmission.
    ///
    /// A no-op (not an error) unless the channel is `Open`: message loss is
    /// tolerable in this domain and senders never block on a closed gate.
    pub fn send(&self, text: String) {
        if self.state() != ChannelState::Open {
            tracing::debug!("{} channel not open, dropping outbound message", self.kind);
            return;
        }
        if self.outbound.send(OutboundCommand::Text(text)).is_ok() {
            self.last_activity.store(now_unix_millis(), Ordering::Relaxed);
        }
    }

    /// Begin closing the channel. Idempotent: calling it on a closing or
    /// closed handle does nothing and fires no duplicate events.
    pub fn close(&self) {
        if !self.lifecycle.transition(ChannelState::Closing) {
            return;
        }
        let _ = self.outbound.send(OutboundCommand::Close);
    }

    /// Test construction without a transport: the handle reports `Open` and
    /// outbound payloads are captured on the returned receiver.
    #[cfg(test)]
    pub(crate) fn detached(
        kind: ChannelKind,
        events: mpsc::UnboundedSender<ChannelEvent>,
    ) -> (Self, mpsc::UnboundedReceiver<OutboundCommand>) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ChannelState::Open);
        let lifecycle = Arc::new(Lifecycle {
            kind,
            state: state_tx,
            events,
        });
        let handle = Self {
            kind,
            endpoint: format!("test://{}", kind),
            outbound: outbound_tx,
            state: state_rx,
            lifecycle,
            last_activity: Arc::new(AtomicI64::new(0)),
        };
        (handle, outbound_rx)
    }

    /// Emulate a transport-driven close for tests.
    #[cfg(test)]
    pub(crate) fn force_closed(&self) {
        self.lifecycle.transition(ChannelState::Closed);
    }
}

async fn write_loop(
    mut write: SplitSink<WsStream, Message>,
    mut outbound: mpsc::UnboundedReceiver<OutboundCommand>,
    lifecycle: Arc<Lifecycle>,
) {
    while let Some(command) = outbound.recv().await {
        match command {
            OutboundCommand::Text(text) => {
                if let Err(e) = write.send(Message::Text(text.into())).await {
                    tracing::warn!("{} channel write error: {}", lifecycle.kind, e);
                    lifecycle.transition(ChannelState::Closed);
                    break;
                }
            }
            OutboundCommand::Close => {
                let _ = write.send(Message::Close(None)).await;
                break;
            }
        }
    }
}

async fn read_loop(
    mut read: SplitStream<WsStream>,
    lifecycle: Arc<Lifecycle>,
    last_activity: Arc<AtomicI64>,
) {
    while let Some(message) = read.next().await {
        match message {
            Ok(Message::Text(text)) => {
                last_activity.store(now_unix_millis(), Ordering::Relaxed);
                let event = ChannelEvent::Message {
                    kind: lifecycle.kind,
                    text: text.to_string(),
                };
                if lifecycle.events.send(event).is_err() {
                    // Owner is gone, nothing left to deliver to
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                tracing::info!("{} channel closed by remote", lifecycle.kind);
                break;
            }
            Err(e) => {
                tracing::warn!("{} channel read error: {}", lifecycle.kind, e);
                break;
            }
            _ => {}
        }
    }
    lifecycle.transition(ChannelState::Closed);
}
