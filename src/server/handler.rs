//! WebSocket and HTTP handlers of the relay server.
//!
//! The chat and video endpoints are pair-scoped relays: a connection
//! registers under its own id and every accepted payload is forwarded to the
//! single peer named in the path. The prediction endpoint is shared and has
//! no peer scope.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use futures_util::{sink::Sink, sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::common::time::now_unix_millis;
use crate::domain::FeatureVector;
use crate::infrastructure::dto::chat::{ChatInbound, ChatOutbound};
use crate::infrastructure::dto::prediction::{PredictionInbound, PredictionOutbound};
use crate::infrastructure::dto::video::VideoMessage;
use crate::session::identity::Identity;

use super::predictor::SequenceBuffer;
use super::state::{AppState, PeerLink, RelayQuery};

// ========================================
// Chat relay
// ========================================

pub async fn chat_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(peer_id): Path<String>,
    Query(query): Query<RelayQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let self_id = query.self_id;
    let (tx, rx) = mpsc::unbounded_channel();
    let link = PeerLink {
        sender: tx,
        connected_at: now_unix_millis(),
    };

    if !state.chat.register(&self_id, link).await {
        tracing::warn!(
            "chat connection for '{}' rejected: id already connected",
            self_id
        );
        return Err(StatusCode::CONFLICT);
    }
    tracing::info!("chat: '{}' connected, addressing '{}'", self_id, peer_id);

    Ok(ws.on_upgrade(move |socket| handle_chat_socket(socket, state, self_id, peer_id, rx)))
}

async fn handle_chat_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    self_id: String,
    peer_id: String,
    mut rx: mpsc::UnboundedReceiver<String>,
) {
    let (mut sender, mut receiver) = socket.split();

    let state_clone = state.clone();
    let self_id_clone = self_id.clone();
    let peer_id_clone = peer_id.clone();

    let mut recv_task = tokio::spawn(async move {
        while let Some(message) = receiver.next().await {
            let message = match message {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!("chat socket error for '{}': {}", self_id_clone, e);
                    break;
                }
            };
            match message {
                Message::Text(text) => {
                    let forwarded = match serde_json::from_str::<ChatOutbound>(&text) {
                        Ok(ChatOutbound::Message { text }) => ChatInbound::Message {
                            sender: self_id_clone.clone(),
                            text,
                        },
                        Ok(ChatOutbound::AslPrediction { label, confidence }) => {
                            ChatInbound::AslPrediction { label, confidence }
                        }
                        Err(e) => {
                            tracing::debug!("chat: skipping unparseable payload: {}", e);
                            continue;
                        }
                    };
                    let json = match serde_json::to_string(&forwarded) {
                        Ok(json) => json,
                        Err(e) => {
                            tracing::error!("chat: failed to serialize forward: {}", e);
                            continue;
                        }
                    };
                    if !state_clone.chat.push_to(&peer_id_clone, json).await {
                        tracing::debug!(
                            "chat: peer '{}' not connected, dropping payload",
                            peer_id_clone
                        );
                    }
                }
                Message::Close(_) => {
                    tracing::info!("chat: '{}' requested close", self_id_clone);
                    break;
                }
                _ => {}
            }
        }
    });

    let mut send_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.chat.unregister(&self_id).await;
    tracing::info!("chat: '{}' disconnected", self_id);
}

// ========================================
// Video relay
// ========================================

pub async fn video_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(peer_id): Path<String>,
    Query(query): Query<RelayQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let self_id = query.self_id;
    let (tx, rx) = mpsc::unbounded_channel();
    let link = PeerLink {
        sender: tx,
        connected_at: now_unix_millis(),
    };

    if !state.video.register(&self_id, link).await {
        tracing::warn!(
            "video connection for '{}' rejected: id already connected",
            self_id
        );
        return Err(StatusCode::CONFLICT);
    }
    tracing::info!("video: '{}' connected, addressing '{}'", self_id, peer_id);

    Ok(ws.on_upgrade(move |socket| handle_video_socket(socket, state, self_id, peer_id, rx)))
}

async fn handle_video_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    self_id: String,
    peer_id: String,
    mut rx: mpsc::UnboundedReceiver<String>,
) {
    let (mut sender, mut receiver) = socket.split();

    let state_clone = state.clone();
    let self_id_clone = self_id.clone();
    let peer_id_clone = peer_id.clone();

    let mut recv_task = tokio::spawn(async move {
        while let Some(message) = receiver.next().await {
            let message = match message {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!("video socket error for '{}': {}", self_id_clone, e);
                    break;
                }
            };
            match message {
                Message::Text(text) => {
                    // Validate the envelope, then forward the original text
                    // unchanged; frames are opaque to the relay.
                    if let Err(e) = serde_json::from_str::<VideoMessage>(&text) {
                        tracing::debug!("video: skipping unparseable payload: {}", e);
                        continue;
                    }
                    if !state_clone
                        .video
                        .push_to(&peer_id_clone, text.to_string())
                        .await
                    {
                        tracing::debug!(
                            "video: peer '{}' not connected, dropping frame",
                            peer_id_clone
                        );
                    }
                }
                Message::Close(_) => {
                    tracing::info!("video: '{}' requested close", self_id_clone);
                    break;
                }
                _ => {}
            }
        }
    });

    let mut send_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.video.unregister(&self_id).await;
    tracing::info!("video: '{}' disconnected", self_id);
}

// ========================================
// Prediction stream
// ========================================

pub async fn asl_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_asl_socket(socket, state))
}

async fn handle_asl_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let greeting = match &state.predictor {
        Some(_) => PredictionInbound::Connection {
            message: "sign predictor ready".to_string(),
        },
        None => PredictionInbound::Error {
            message: "prediction model not available".to_string(),
        },
    };
    if send_prediction_message(&mut sender, &greeting).await.is_err() {
        return;
    }

    let mut buffer = SequenceBuffer::new();

    while let Some(message) = receiver.next().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("asl socket error: {}", e);
                break;
            }
        };
        match message {
            Message::Text(text) => match serde_json::from_str::<PredictionOutbound>(&text) {
                Ok(PredictionOutbound::Landmarks {
                    landmarks,
                    has_hands,
                }) => {
                    // The flag is the sole discriminator: no hands means the
                    // sequence restarts, regardless of vector content.
                    if !has_hands {
                        buffer.reset();
                        continue;
                    }
                    let vector = match FeatureVector::new(landmarks) {
                        Ok(vector) => vector,
                        Err(e) => {
                            tracing::debug!("asl: skipping invalid landmark vector: {}", e);
                            continue;
                        }
                    };
                    buffer.push(vector);

                    let Some(predictor) = &state.predictor else {
                        continue;
                    };
                    let Some(window) = buffer.window() else {
                        continue;
                    };
                    let reply = match predictor.predict(window).await {
                        Ok(Some(output)) => PredictionInbound::Prediction {
                            label: output.label,
                            confidence: output.confidence,
                        },
                        Ok(None) => continue,
                        Err(e) => PredictionInbound::Error {
                            message: e.to_string(),
                        },
                    };
                    if send_prediction_message(&mut sender, &reply).await.is_err() {
                        break;
                    }
                }
                Ok(PredictionOutbound::Reset) => buffer.reset(),
                Err(e) => {
                    tracing::debug!("asl: skipping unparseable payload: {}", e);
                }
            },
            Message::Close(_) => {
                tracing::info!("asl: client requested close");
                break;
            }
            _ => {}
        }
    }
}

async fn send_prediction_message(
    sender: &mut (impl Sink<Message, Error = axum::Error> + Unpin),
    message: &PredictionInbound,
) -> Result<(), ()> {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("asl: failed to serialize reply: {}", e);
            return Ok(());
        }
    };
    sender.send(Message::Text(json.into())).await.map_err(|e| {
        tracing::warn!("asl: failed to send reply: {}", e);
    })
}

// ========================================
// HTTP endpoints
// ========================================

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

#[derive(Debug, serde::Deserialize)]
pub struct IdentityRequest {
    pub username: String,
}

/// Issue a peer-addressable identity for a username.
pub async fn issue_identity(
    Json(request): Json<IdentityRequest>,
) -> Result<Json<Identity>, StatusCode> {
    if request.username.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let hex = Uuid::new_v4().simple().to_string();
    let random_id = hex[..8].to_uppercase();
    tracing::info!("issued id '{}' for user '{}'", random_id, request.username);
    Ok(Json(Identity {
        username: request.username,
        random_id,
    }))
}
