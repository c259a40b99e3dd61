//! Session coordinator: the state machine that owns the three channels.
//!
//! All inbound traffic funnels through [`SessionCoordinator::handle_event`],
//! making the coordinator the single writer of session state. Channel tasks
//! and the embedding application talk to it only over mpsc channels; there is
//! no shared mutable state and no locking anywhere in the session layer.
//!
//! The one non-obvious rule lives here: a prediction received on the shared
//! prediction stream is re-published on the chat channel. The prediction
//! endpoint is a shared inference service with no notion of peers, so the
//! only path a prediction can take to the other side is the channel that does
//! carry peer-addressed traffic.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::common::time::Clock;
use crate::domain::{ChatEntry, PeerId, Prediction, Timestamp};
use crate::infrastructure::dto::chat::{ChatInbound, ChatOutbound};
use crate::infrastructure::dto::prediction::{PredictionInbound, PredictionOutbound};
use crate::infrastructure::dto::video::VideoMessage;
use crate::perception::pipeline::LandmarkEvent;

use super::channel::{ChannelEvent, ChannelHandle, ChannelKind, ChannelState};
use super::endpoints::Endpoints;
use super::error::SessionError;
use super::throttle::SendGate;

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Joined,
    Disconnecting,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Joined => "joined",
            Self::Disconnecting => "disconnecting",
        };
        f.write_str(name)
    }
}

/// User-driven actions, fed to [`SessionCoordinator::run`]
#[derive(Debug)]
pub enum SessionCommand {
    SetIdentity(PeerId),
    SetPeer(PeerId),
    Connect,
    EnableMedia,
    DisableMedia,
    Disconnect,
    SendChat(String),
    Landmarks(LandmarkEvent),
    OutboundFrame(String),
}

/// Typed notifications to the UI / render surface.
///
/// This is the only way session state reaches the outside; the render layer
/// registers a receiver instead of listening for ambient broadcasts.
#[derive(Debug, Clone)]
pub enum SessionNotification {
    StateChanged(SessionState),
    ChannelStatus { kind: ChannelKind, state: ChannelState },
    ChatAppended(ChatEntry),
    ChatCleared,
    LocalPrediction(Prediction),
    LocalPredictionCleared,
    RemotePrediction(Prediction),
    /// An undecoded inbound video frame (data-URL JPEG)
    RemoteFrame(String),
    /// Transient status text (connect failures, service notices)
    Notice(String),
}

/// Owns the channels, the chat log and the prediction slots for one
/// `(local_id, peer_id)` pair.
pub struct SessionCoordinator {
    endpoints: Endpoints,
    local_id: Option<PeerId>,
    peer_id: Option<PeerId>,
    state: SessionState,
    media_enabled: bool,
    chat: Option<ChannelHandle>,
    video: Option<ChannelHandle>,
    prediction: Option<ChannelHandle>,
    chat_log: Vec<ChatEntry>,
    local_prediction: Option<Prediction>,
    remote_prediction: Option<Prediction>,
    gate: SendGate,
    events_tx: mpsc::UnboundedSender<ChannelEvent>,
    notifications: mpsc::UnboundedSender<SessionNotification>,
    clock: Arc<dyn Clock>,
}

impl SessionCoordinator {
    /// Create an idle coordinator.
    ///
    /// `events_tx` is the sender half of the channel-event stream; the caller
    /// keeps the receiver and feeds it to [`run`](Self::run) (or pumps
    /// [`handle_event`](Self::handle_event) directly).
    pub fn new(
        endpoints: Endpoints,
        events_tx: mpsc::UnboundedSender<ChannelEvent>,
        notifications: mpsc::UnboundedSender<SessionNotification>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            endpoints,
            local_id: None,
            peer_id: None,
            state: SessionState::Idle,
            media_enabled: false,
            chat: None,
            video: None,
            prediction: None,
            chat_log: Vec::new(),
            local_prediction: None,
            remote_prediction: None,
            gate: SendGate::new(),
            events_tx,
            notifications,
            clock,
        }
    }

    // ========================================
    // Accessors
    // ========================================

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn joined(&self) -> bool {
        self.state == SessionState::Joined
    }

    pub fn media_enabled(&self) -> bool {
        self.media_enabled
    }

    pub fn chat_log(&self) -> &[ChatEntry] {
        &self.chat_log
    }

    pub fn local_prediction(&self) -> Option<&Prediction> {
        self.local_prediction.as_ref()
    }

    pub fn remote_prediction(&self) -> Option<&Prediction> {
        self.remote_prediction.as_ref()
    }

    pub fn channel_state(&self, kind: ChannelKind) -> ChannelState {
        let handle = match kind {
            ChannelKind::Chat => &self.chat,
            ChannelKind::VideoRelay => &self.video,
            ChannelKind::PredictionStream => &self.prediction,
        };
        handle
            .as_ref()
            .map(|h| h.state())
            .unwrap_or(ChannelState::Closed)
    }

    pub fn set_identity(&mut self, id: PeerId) {
        self.local_id = Some(id);
    }

    pub fn set_peer(&mut self, id: PeerId) {
        self.peer_id = Some(id);
    }

    // ========================================
    // User actions
    // ========================================

    /// Open the chat channel, the canonical signal of peer reachability.
    ///
    /// Joined state is entered when the channel reports `Open` through the
    /// event stream, not here. A connect while a live chat handle exists is
    /// ignored: there is at most one live connection per channel kind.
    pub async fn connect(&mut self) -> Result<(), SessionError> {
        let (local, peer) = self.require_ids()?;
        if let Some(chat) = &self.chat {
            if chat.is_live() {
                tracing::debug!("chat channel already live, ignoring connect");
                return Ok(());
            }
        }

        self.set_state(SessionState::Connecting);
        let endpoint = self.endpoints.chat(&peer, &local);
        match ChannelHandle::open(ChannelKind::Chat, &endpoint, self.events_tx.clone()).await {
            Ok(handle) => {
                self.chat = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.set_state(SessionState::Idle);
                Err(e)
            }
        }
    }

    /// Open the video and prediction channels independently.
    ///
    /// Media is an enhancement of the chat session, not a precondition:
    /// either channel may fail to open without reverting the Joined state,
    /// and the failure is surfaced only as a notice.
    pub async fn enable_media(&mut self) {
        if self.state != SessionState::Joined {
            tracing::warn!("enable_media ignored outside a joined session");
            return;
        }
        let Ok((local, peer)) = self.require_ids() else {
            return;
        };
        self.media_enabled = true;

        if self.video.as_ref().is_none_or(|h| !h.is_live()) {
            let endpoint = self.endpoints.video(&peer, &local);
            match ChannelHandle::open(ChannelKind::VideoRelay, &endpoint, self.events_tx.clone())
                .await
            {
                Ok(handle) => self.video = Some(handle),
                Err(e) => {
                    tracing::warn!("{}", e);
                    self.notify(SessionNotification::Notice(e.to_string()));
                }
            }
        }

        if self.prediction.as_ref().is_none_or(|h| !h.is_live()) {
            let endpoint = self.endpoints.prediction();
            match ChannelHandle::open(
                ChannelKind::PredictionStream,
                &endpoint,
                self.events_tx.clone(),
            )
            .await
            {
                Ok(handle) => self.prediction = Some(handle),
                Err(e) => {
                    tracing::warn!("{}", e);
                    self.notify(SessionNotification::Notice(e.to_string()));
                }
            }
        }
    }

    /// Close the media channels, keeping the chat session alive.
    pub fn disable_media(&mut self) {
        if let Some(video) = &self.video {
            video.close();
        }
        if let Some(prediction) = &self.prediction {
            prediction.close();
        }
        self.media_enabled = false;
    }

    /// Tear the whole session down.
    pub fn disconnect(&mut self) {
        if self.state == SessionState::Idle {
            return;
        }
        self.teardown();
    }

    /// Send a free-text chat message to the peer.
    pub fn send_chat(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        let Some(chat) = &self.chat else {
            tracing::debug!("no chat channel, dropping outbound text");
            return;
        };
        match serde_json::to_string(&ChatOutbound::Message { text }) {
            Ok(json) => chat.send(json),
            Err(e) => tracing::error!("failed to serialize chat message: {}", e),
        }
    }

    // ========================================
    // Perception-side inputs
    // ========================================

    /// Forward one landmark event on the prediction stream, throttled.
    ///
    /// `has_hands = false` resets the local prediction immediately (at device
    /// rate); the wire envelope itself is still subject to the gate.
    pub fn on_landmarks(&mut self, event: &LandmarkEvent) {
        if !event.has_hands && self.local_prediction.take().is_some() {
            self.notify(SessionNotification::LocalPredictionCleared);
        }

        let Some(prediction) = &self.prediction else {
            return;
        };
        let now = self.clock.now_unix_millis();
        if !self.gate.permit(ChannelKind::PredictionStream, now) {
            return;
        }

        let envelope = if event.has_hands {
            PredictionOutbound::Landmarks {
                landmarks: event.vector.to_vec(),
                has_hands: true,
            }
        } else {
            PredictionOutbound::Landmarks {
                landmarks: Vec::new(),
                has_hands: false,
            }
        };
        match serde_json::to_string(&envelope) {
            Ok(json) => prediction.send(json),
            Err(e) => tracing::error!("failed to serialize landmarks: {}", e),
        }
    }

    /// Forward one encoded local frame on the video relay, throttled.
    pub fn on_outbound_frame(&mut self, frame_data: String) {
        let Some(video) = &self.video else {
            return;
        };
        let now = self.clock.now_unix_millis();
        if !self.gate.permit(ChannelKind::VideoRelay, now) {
            return;
        }
        match serde_json::to_string(&VideoMessage::Frame { frame_data }) {
            Ok(json) => video.send(json),
            Err(e) => tracing::error!("failed to serialize video frame: {}", e),
        }
    }

    // ========================================
    // Inbound events
    // ========================================

    /// Apply one channel event. The single entry point for all inbound
    /// traffic; no ordering is assumed between events of different channels.
    pub fn handle_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Message { kind, text } => match kind {
                ChannelKind::Chat => self.on_chat_message(&text),
                ChannelKind::VideoRelay => self.on_video_message(&text),
                ChannelKind::PredictionStream => self.on_prediction_message(&text),
            },
            ChannelEvent::StateChanged { kind, state } => self.on_state_changed(kind, state),
        }
    }

    /// Drive the coordinator from its two input streams until both close.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<ChannelEvent>,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
    ) {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => {
                        self.disconnect();
                        break;
                    }
                },
            }
        }
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::SetIdentity(id) => self.set_identity(id),
            SessionCommand::SetPeer(id) => self.set_peer(id),
            SessionCommand::Connect => {
                if let Err(e) = self.connect().await {
                    tracing::warn!("connect failed: {}", e);
                    self.notify(SessionNotification::Notice(e.to_string()));
                }
            }
            SessionCommand::EnableMedia => self.enable_media().await,
            SessionCommand::DisableMedia => self.disable_media(),
            SessionCommand::Disconnect => self.disconnect(),
            SessionCommand::SendChat(text) => self.send_chat(text),
            SessionCommand::Landmarks(event) => self.on_landmarks(&event),
            SessionCommand::OutboundFrame(frame_data) => self.on_outbound_frame(frame_data),
        }
    }

    fn on_chat_message(&mut self, text: &str) {
        let message = match serde_json::from_str::<ChatInbound>(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!("skipping unparseable chat payload: {}", e);
                return;
            }
        };
        match message {
            ChatInbound::Message { sender, text } => {
                let Ok(sender) = PeerId::new(sender) else {
                    tracing::debug!("skipping chat message with invalid sender id");
                    return;
                };
                let entry = ChatEntry::Message {
                    sender,
                    text,
                    received_at: Timestamp::new(self.clock.now_unix_millis()),
                };
                self.chat_log.push(entry.clone());
                self.notify(SessionNotification::ChatAppended(entry));
            }
            ChatInbound::AslPrediction { label, confidence } => {
                let produced_at = Timestamp::new(self.clock.now_unix_millis());
                match Prediction::new(label, confidence, produced_at) {
                    Ok(prediction) => {
                        self.remote_prediction = Some(prediction.clone());
                        self.notify(SessionNotification::RemotePrediction(prediction));
                    }
                    Err(e) => tracing::debug!("skipping invalid relayed prediction: {}", e),
                }
            }
        }
    }

    fn on_video_message(&mut self, text: &str) {
        match serde_json::from_str::<VideoMessage>(text) {
            Ok(VideoMessage::Frame { frame_data }) => {
                self.notify(SessionNotification::RemoteFrame(frame_data));
            }
            Err(e) => tracing::debug!("skipping unparseable video payload: {}", e),
        }
    }

    fn on_prediction_message(&mut self, text: &str) {
        let message = match serde_json::from_str::<PredictionInbound>(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!("skipping unparseable prediction payload: {}", e);
                return;
            }
        };
        match message {
            PredictionInbound::Prediction { label, confidence } => {
                let produced_at = Timestamp::new(self.clock.now_unix_millis());
                let prediction = match Prediction::new(label, confidence, produced_at) {
                    Ok(prediction) => prediction,
                    Err(e) => {
                        tracing::debug!("skipping invalid prediction: {}", e);
                        return;
                    }
                };

                // Store locally and re-publish for the peer, exactly once each.
                self.local_prediction = Some(prediction.clone());
                if let Some(chat) = &self.chat {
                    let relay = ChatOutbound::AslPrediction {
                        label: prediction.label.clone(),
                        confidence: prediction.confidence.value(),
                    };
                    match serde_json::to_string(&relay) {
                        Ok(json) => chat.send(json),
                        Err(e) => tracing::error!("failed to serialize prediction relay: {}", e),
                    }
                }
                self.notify(SessionNotification::LocalPrediction(prediction));
            }
            PredictionInbound::Connection { message } => {
                tracing::info!("prediction stream: {}", message);
                self.notify(SessionNotification::Notice(message));
            }
            PredictionInbound::Error { message } => {
                tracing::warn!("prediction stream error: {}", message);
                self.notify(SessionNotification::Notice(message));
            }
        }
    }

    fn on_state_changed(&mut self, kind: ChannelKind, state: ChannelState) {
        self.notify(SessionNotification::ChannelStatus { kind, state });
        match (kind, state) {
            (ChannelKind::Chat, ChannelState::Open) => {
                if self.state != SessionState::Joined {
                    self.set_state(SessionState::Joined);
                    let entry = ChatEntry::system("Chat connected");
                    self.chat_log.push(entry.clone());
                    self.notify(SessionNotification::ChatAppended(entry));
                }
            }
            (ChannelKind::Chat, ChannelState::Closed) => {
                // Loss of chat ends the joined session entirely; losing a
                // media channel below only degrades it.
                if self.state != SessionState::Idle {
                    self.teardown();
                }
            }
            (ChannelKind::VideoRelay, ChannelState::Closed) => {
                self.video = None;
                if self.prediction.is_none() {
                    self.media_enabled = false;
                }
            }
            (ChannelKind::PredictionStream, ChannelState::Closed) => {
                self.prediction = None;
                if self.video.is_none() {
                    self.media_enabled = false;
                }
            }
            _ => {}
        }
    }

    // ========================================
    // Internals
    // ========================================

    fn require_ids(&self) -> Result<(PeerId, PeerId), SessionError> {
        match (&self.local_id, &self.peer_id) {
            (Some(local), Some(peer)) => Ok((local.clone(), peer.clone())),
            _ => Err(SessionError::MissingPeer),
        }
    }

    /// Close everything and return to Idle. Closes are fire-and-forget mpsc
    /// sends, so no channel's close can block another's.
    fn teardown(&mut self) {
        self.set_state(SessionState::Disconnecting);
        if let Some(chat) = self.chat.take() {
            chat.close();
        }
        if let Some(video) = self.video.take() {
            video.close();
        }
        if let Some(prediction) = self.prediction.take() {
            prediction.close();
        }
        self.chat_log.clear();
        self.local_prediction = None;
        self.remote_prediction = None;
        self.media_enabled = false;
        self.gate = SendGate::new();
        self.notify(SessionNotification::ChatCleared);
        self.set_state(SessionState::Idle);
    }

    fn set_state(&mut self, next: SessionState) {
        if self.state != next {
            tracing::info!("session state: {} -> {}", self.state, next);
            self.state = next;
            self.notify(SessionNotification::StateChanged(next));
        }
    }

    fn notify(&self, notification: SessionNotification) {
        // A departed UI is not an error; the session keeps running.
        let _ = self.notifications.send(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    use crate::domain::FeatureVector;
    use crate::session::channel::OutboundCommand;
    use crate::session::throttle::{FRAME_SEND_INTERVAL_MS, LANDMARK_SEND_INTERVAL_MS};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - セッション状態機械の遷移（Idle → Connecting → Joined → Idle）
    // - チャネル間の独立性（1 チャネルの喪失が他チャネルに波及しない）
    // - 予測のクロスリレー（予測ストリーム受信 → チャット再送が各 1 回）
    // - 送信ゲートの適用（ランドマーク・フレームの間引き）
    //
    // 【なぜこのテストが必要か】
    // - コーディネータは全チャネルの唯一の書き込み手であり、
    //   状態破壊はセッション全体の破壊になる
    // - クロスリレーはこの層の中核の正しさ特性
    //
    // 【どのようなシナリオをテストするか】
    // - デタッチされたチャネルハンドルでソケットなしにイベントを注入する
    // ========================================

    struct ManualClock(AtomicI64);

    impl ManualClock {
        fn new(start: i64) -> Arc<Self> {
            Arc::new(Self(AtomicI64::new(start)))
        }

        fn set(&self, millis: i64) {
            self.0.store(millis, Ordering::Relaxed);
        }
    }

    impl Clock for ManualClock {
        fn now_unix_millis(&self) -> i64 {
            self.0.load(Ordering::Relaxed)
        }
    }

    struct Harness {
        coordinator: SessionCoordinator,
        notifications_rx: mpsc::UnboundedReceiver<SessionNotification>,
        clock: Arc<ManualClock>,
    }

    fn harness() -> Harness {
        let (events_tx, _events_rx) = mpsc::unbounded_channel();
        let (notifications_tx, notifications_rx) = mpsc::unbounded_channel();
        let clock = ManualClock::new(0);
        let mut coordinator = SessionCoordinator::new(
            Endpoints::new("ws://127.0.0.1:8000"),
            events_tx,
            notifications_tx,
            clock.clone(),
        );
        coordinator.set_identity(PeerId::new("ABCD1234".to_string()).unwrap());
        coordinator.set_peer(PeerId::new("WXYZ5678".to_string()).unwrap());
        Harness {
            coordinator,
            notifications_rx,
            clock,
        }
    }

    /// Attach a detached channel handle and return its captured outbound queue
    fn attach(
        harness: &mut Harness,
        kind: ChannelKind,
    ) -> mpsc::UnboundedReceiver<OutboundCommand> {
        let (events_tx, _events_rx) = mpsc::unbounded_channel();
        let (handle, outbound_rx) = ChannelHandle::detached(kind, events_tx);
        match kind {
            ChannelKind::Chat => harness.coordinator.chat = Some(handle),
            ChannelKind::VideoRelay => harness.coordinator.video = Some(handle),
            ChannelKind::PredictionStream => harness.coordinator.prediction = Some(handle),
        }
        outbound_rx
    }

    fn join(harness: &mut Harness) -> mpsc::UnboundedReceiver<OutboundCommand> {
        let chat_outbound = attach(harness, ChannelKind::Chat);
        harness.coordinator.handle_event(ChannelEvent::StateChanged {
            kind: ChannelKind::Chat,
            state: ChannelState::Open,
        });
        chat_outbound
    }

    fn drain_outbound(rx: &mut mpsc::UnboundedReceiver<OutboundCommand>) -> Vec<String> {
        let mut sent = Vec::new();
        while let Ok(command) = rx.try_recv() {
            if let OutboundCommand::Text(text) = command {
                sent.push(text);
            }
        }
        sent
    }

    fn drain_notifications(
        rx: &mut mpsc::UnboundedReceiver<SessionNotification>,
    ) -> Vec<SessionNotification> {
        let mut seen = Vec::new();
        while let Ok(notification) = rx.try_recv() {
            seen.push(notification);
        }
        seen
    }

    fn landmark_event(has_hands: bool) -> LandmarkEvent {
        let vector = if has_hands {
            FeatureVector::new(vec![0.5; crate::domain::FEATURE_LEN]).unwrap()
        } else {
            FeatureVector::zeroed()
        };
        LandmarkEvent { has_hands, vector }
    }

    #[tokio::test]
    async fn test_connect_without_ids_fails_synchronously() {
        // テスト項目: ID が揃っていない connect が MissingPeer で失敗しチャネルを開かない
        // given (前提条件):
        let (events_tx, _events_rx) = mpsc::unbounded_channel();
        let (notifications_tx, _notifications_rx) = mpsc::unbounded_channel();
        let mut coordinator = SessionCoordinator::new(
            Endpoints::new("ws://127.0.0.1:8000"),
            events_tx,
            notifications_tx,
            ManualClock::new(0),
        );
        coordinator.set_identity(PeerId::new("ABCD1234".to_string()).unwrap());

        // when (操作):
        let result = coordinator.connect().await;

        // then (期待する結果):
        assert!(matches!(result, Err(SessionError::MissingPeer)));
        assert_eq!(coordinator.state(), SessionState::Idle);
        assert_eq!(coordinator.channel_state(ChannelKind::Chat), ChannelState::Closed);
    }

    #[tokio::test]
    async fn test_connect_is_ignored_while_chat_is_live() {
        // テスト項目: チャットが生きている間の connect が無視される
        // given (前提条件):
        let mut harness = harness();
        let _chat_outbound = join(&mut harness);
        drain_notifications(&mut harness.notifications_rx);

        // when (操作):
        let result = harness.coordinator.connect().await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(harness.coordinator.state(), SessionState::Joined);
        // No Connecting transition was notified
        let notifications = drain_notifications(&mut harness.notifications_rx);
        assert!(notifications.is_empty());
    }

    #[test]
    fn test_chat_open_enters_joined_with_system_notice() {
        // テスト項目: チャット Open で Joined に遷移しシステム通知が記録される
        // given (前提条件):
        let mut harness = harness();

        // when (操作):
        let _chat_outbound = join(&mut harness);

        // then (期待する結果):
        assert!(harness.coordinator.joined());
        assert_eq!(
            harness.coordinator.chat_log(),
            &[ChatEntry::system("Chat connected")]
        );
    }

    #[test]
    fn test_inbound_chat_message_is_appended() {
        // テスト項目: ピアからのメッセージがチャットログに追加される
        // given (前提条件):
        let mut harness = harness();
        let _chat_outbound = join(&mut harness);
        harness.clock.set(5000);

        // when (操作):
        harness.coordinator.handle_event(ChannelEvent::Message {
            kind: ChannelKind::Chat,
            text: r#"{"type":"message","sender":"WXYZ5678","text":"hi"}"#.to_string(),
        });

        // then (期待する結果):
        let log = harness.coordinator.chat_log();
        assert_eq!(log.len(), 2);
        assert_eq!(
            log[1],
            ChatEntry::Message {
                sender: PeerId::new("WXYZ5678".to_string()).unwrap(),
                text: "hi".to_string(),
                received_at: Timestamp::new(5000),
            }
        );
    }

    #[test]
    fn test_local_prediction_is_stored_and_relayed_exactly_once() {
        // テスト項目: 予測ストリーム受信 1 件につきチャット再送とローカル保存が各 1 回行われる
        // given (前提条件):
        let mut harness = harness();
        let mut chat_outbound = join(&mut harness);
        let _prediction_outbound = attach(&mut harness, ChannelKind::PredictionStream);

        // when (操作):
        harness.coordinator.handle_event(ChannelEvent::Message {
            kind: ChannelKind::PredictionStream,
            text: r#"{"type":"prediction","label":"hello","confidence":0.91}"#.to_string(),
        });

        // then (期待する結果):
        let local = harness.coordinator.local_prediction().unwrap();
        assert_eq!(local.label, "hello");
        assert_eq!(local.confidence.value(), 0.91);

        let sent = drain_outbound(&mut chat_outbound);
        assert_eq!(sent.len(), 1);
        let relayed: serde_json::Value = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(
            relayed,
            serde_json::json!({"type": "asl_prediction", "label": "hello", "confidence": 0.91})
        );

        // The remote slot is untouched by local predictions
        assert!(harness.coordinator.remote_prediction().is_none());
    }

    #[test]
    fn test_each_prediction_event_relays_again() {
        // テスト項目: 予測イベントごとに再送が 1 回ずつ行われる
        // given (前提条件):
        let mut harness = harness();
        let mut chat_outbound = join(&mut harness);
        let _prediction_outbound = attach(&mut harness, ChannelKind::PredictionStream);

        // when (操作):
        for confidence in ["0.91", "0.92"] {
            harness.coordinator.handle_event(ChannelEvent::Message {
                kind: ChannelKind::PredictionStream,
                text: format!(r#"{{"type":"prediction","label":"A","confidence":{confidence}}}"#),
            });
        }

        // then (期待する結果):
        assert_eq!(drain_outbound(&mut chat_outbound).len(), 2);
        assert_eq!(
            harness.coordinator.local_prediction().unwrap().confidence.value(),
            0.92
        );
    }

    #[test]
    fn test_relayed_prediction_from_peer_sets_remote_slot_only() {
        // テスト項目: チャット経由の予測リレーがリモート予測のみを更新する
        // given (前提条件):
        let mut harness = harness();
        let _chat_outbound = join(&mut harness);

        // when (操作):
        harness.coordinator.handle_event(ChannelEvent::Message {
            kind: ChannelKind::Chat,
            text: r#"{"type":"asl_prediction","label":"thanks","confidence":0.76}"#.to_string(),
        });

        // then (期待する結果):
        let remote = harness.coordinator.remote_prediction().unwrap();
        assert_eq!(remote.label, "thanks");
        assert_eq!(remote.confidence.value(), 0.76);
        assert!(harness.coordinator.local_prediction().is_none());
        // The relay is not appended to the chat log
        assert_eq!(harness.coordinator.chat_log().len(), 1);
    }

    #[test]
    fn test_video_channel_loss_does_not_affect_chat() {
        // テスト項目: ビデオチャネル喪失がチャット状態とログに影響しない
        // given (前提条件):
        let mut harness = harness();
        let _chat_outbound = join(&mut harness);
        let _video_outbound = attach(&mut harness, ChannelKind::VideoRelay);
        harness.coordinator.handle_event(ChannelEvent::Message {
            kind: ChannelKind::Chat,
            text: r#"{"type":"message","sender":"WXYZ5678","text":"still here"}"#.to_string(),
        });

        // when (操作):
        harness.coordinator.handle_event(ChannelEvent::StateChanged {
            kind: ChannelKind::VideoRelay,
            state: ChannelState::Closed,
        });

        // then (期待する結果):
        assert_eq!(harness.coordinator.state(), SessionState::Joined);
        assert_eq!(harness.coordinator.chat_log().len(), 2);
        assert_eq!(
            harness.coordinator.channel_state(ChannelKind::Chat),
            ChannelState::Open
        );
    }

    #[test]
    fn test_chat_channel_loss_tears_the_session_down() {
        // テスト項目: チャット喪失でセッション全体が解体される
        // given (前提条件):
        let mut harness = harness();
        let _chat_outbound = join(&mut harness);
        let _video_outbound = attach(&mut harness, ChannelKind::VideoRelay);
        let _prediction_outbound = attach(&mut harness, ChannelKind::PredictionStream);
        harness.coordinator.media_enabled = true;

        // when (操作):
        harness.coordinator.handle_event(ChannelEvent::StateChanged {
            kind: ChannelKind::Chat,
            state: ChannelState::Closed,
        });

        // then (期待する結果):
        assert_eq!(harness.coordinator.state(), SessionState::Idle);
        assert!(harness.coordinator.chat_log().is_empty());
        assert!(!harness.coordinator.media_enabled());
        assert_eq!(
            harness.coordinator.channel_state(ChannelKind::VideoRelay),
            ChannelState::Closed
        );
        assert_eq!(
            harness.coordinator.channel_state(ChannelKind::PredictionStream),
            ChannelState::Closed
        );
    }

    #[test]
    fn test_explicit_disconnect_clears_chat_history() {
        // テスト項目: 明示的な切断でチャット履歴が破棄される
        // given (前提条件):
        let mut harness = harness();
        let _chat_outbound = join(&mut harness);
        harness.coordinator.handle_event(ChannelEvent::Message {
            kind: ChannelKind::Chat,
            text: r#"{"type":"message","sender":"WXYZ5678","text":"bye"}"#.to_string(),
        });

        // when (操作):
        harness.coordinator.disconnect();

        // then (期待する結果):
        assert_eq!(harness.coordinator.state(), SessionState::Idle);
        assert!(harness.coordinator.chat_log().is_empty());
        let notifications = drain_notifications(&mut harness.notifications_rx);
        assert!(notifications
            .iter()
            .any(|n| matches!(n, SessionNotification::ChatCleared)));
    }

    #[test]
    fn test_landmark_sends_are_throttled() {
        // テスト項目: ランドマーク送信が間引かれる
        // given (前提条件):
        let mut harness = harness();
        let _chat_outbound = join(&mut harness);
        let mut prediction_outbound = attach(&mut harness, ChannelKind::PredictionStream);
        let event = landmark_event(true);

        // when (操作):
        for now in [0, 10, 20, LANDMARK_SEND_INTERVAL_MS] {
            harness.clock.set(now);
            harness.coordinator.on_landmarks(&event);
        }

        // then (期待する結果):
        assert_eq!(drain_outbound(&mut prediction_outbound).len(), 2);
    }

    #[test]
    fn test_no_hands_event_clears_prediction_and_sends_empty_envelope() {
        // テスト項目: has_hands=false でローカル予測が消え空ランドマークが送られる
        // given (前提条件):
        let mut harness = harness();
        let _chat_outbound = join(&mut harness);
        let mut prediction_outbound = attach(&mut harness, ChannelKind::PredictionStream);
        harness.coordinator.handle_event(ChannelEvent::Message {
            kind: ChannelKind::PredictionStream,
            text: r#"{"type":"prediction","label":"hello","confidence":0.91}"#.to_string(),
        });
        drain_notifications(&mut harness.notifications_rx);

        // when (操作):
        harness.coordinator.on_landmarks(&landmark_event(false));

        // then (期待する結果):
        assert!(harness.coordinator.local_prediction().is_none());
        let notifications = drain_notifications(&mut harness.notifications_rx);
        assert!(notifications
            .iter()
            .any(|n| matches!(n, SessionNotification::LocalPredictionCleared)));

        let sent = drain_outbound(&mut prediction_outbound);
        assert_eq!(sent.len(), 1);
        let envelope: serde_json::Value = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(
            envelope,
            serde_json::json!({"type": "landmarks", "landmarks": [], "has_hands": false})
        );
    }

    #[test]
    fn test_outbound_frames_are_throttled() {
        // テスト項目: フレーム送信が間引かれる
        // given (前提条件):
        let mut harness = harness();
        let _chat_outbound = join(&mut harness);
        let mut video_outbound = attach(&mut harness, ChannelKind::VideoRelay);

        // when (操作):
        for now in [0, 100, FRAME_SEND_INTERVAL_MS] {
            harness.clock.set(now);
            harness
                .coordinator
                .on_outbound_frame("data:image/jpeg;base64,AAAA".to_string());
        }

        // then (期待する結果):
        assert_eq!(drain_outbound(&mut video_outbound).len(), 2);
    }

    #[test]
    fn test_inbound_frame_is_forwarded_as_notification() {
        // テスト項目: 受信フレームが通知としてそのまま転送される
        // given (前提条件):
        let mut harness = harness();
        let _chat_outbound = join(&mut harness);
        drain_notifications(&mut harness.notifications_rx);

        // when (操作):
        harness.coordinator.handle_event(ChannelEvent::Message {
            kind: ChannelKind::VideoRelay,
            text: r#"{"type":"frame","frame_data":"data:image/jpeg;base64,AAAA"}"#.to_string(),
        });

        // then (期待する結果):
        let notifications = drain_notifications(&mut harness.notifications_rx);
        assert!(notifications.iter().any(|n| matches!(
            n,
            SessionNotification::RemoteFrame(data) if data == "data:image/jpeg;base64,AAAA"
        )));
    }

    #[test]
    fn test_malformed_payloads_are_skipped_silently() {
        // テスト項目: 不正なペイロードが黙って破棄され状態が変化しない
        // given (前提条件):
        let mut harness = harness();
        let _chat_outbound = join(&mut harness);
        drain_notifications(&mut harness.notifications_rx);

        // when (操作):
        for kind in [
            ChannelKind::Chat,
            ChannelKind::VideoRelay,
            ChannelKind::PredictionStream,
        ] {
            harness.coordinator.handle_event(ChannelEvent::Message {
                kind,
                text: "not json at all".to_string(),
            });
        }

        // then (期待する結果):
        assert_eq!(harness.coordinator.state(), SessionState::Joined);
        assert_eq!(harness.coordinator.chat_log().len(), 1);
        assert!(drain_notifications(&mut harness.notifications_rx).is_empty());
    }

    #[test]
    fn test_send_chat_serializes_the_message_envelope() {
        // テスト項目: チャット送信が規定のエンベロープで転送キューに積まれる
        // given (前提条件):
        let mut harness = harness();
        let mut chat_outbound = join(&mut harness);

        // when (操作):
        harness.coordinator.send_chat("hello there".to_string());

        // then (期待する結果):
        let sent = drain_outbound(&mut chat_outbound);
        assert_eq!(sent.len(), 1);
        let envelope: serde_json::Value = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(
            envelope,
            serde_json::json!({"type": "message", "text": "hello there"})
        );
    }

    #[test]
    fn test_disable_media_keeps_the_session_joined() {
        // テスト項目: メディア無効化後もセッションが Joined のまま維持される
        // given (前提条件):
        let mut harness = harness();
        let _chat_outbound = join(&mut harness);
        let _video_outbound = attach(&mut harness, ChannelKind::VideoRelay);
        let _prediction_outbound = attach(&mut harness, ChannelKind::PredictionStream);
        harness.coordinator.media_enabled = true;

        // when (操作):
        harness.coordinator.disable_media();

        // then (期待する結果):
        assert!(!harness.coordinator.media_enabled());
        assert_eq!(harness.coordinator.state(), SessionState::Joined);
        assert_eq!(
            harness.coordinator.channel_state(ChannelKind::VideoRelay),
            ChannelState::Closing
        );
    }
}
