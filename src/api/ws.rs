//! Live summary streaming over WebSocket.
//!
//! Protocol: the server sends `connected` on upgrade. Each text message
//! from the client (optionally `{"user": "..."}`) starts one generation
//! whose fragments arrive as `token` frames, optionally followed by one
//! `error` frame, and always closed by an `end` frame. Closing the socket
//! cancels an in-flight generation.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use chrono::Local;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::AppState;
use crate::orchestrator::stream::{StreamOutcome, SummaryFragment};

/// Frames sent to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsFrame {
    /// Connection established.
    Connected {
        /// Identifier of this connection, for log correlation.
        client_id: String,
    },
    /// One summary fragment.
    Token {
        /// Fragment text.
        content: String,
    },
    /// The summary stream failed.
    Error {
        /// Failure description.
        message: String,
    },
    /// End of one generation.
    End {
        /// Stored report id, when the report was persisted.
        report_id: Option<String>,
    },
}

#[derive(Debug, Default, Deserialize)]
struct StreamRequest {
    #[serde(default)]
    user: Option<String>,
}

/// Why the socket loop stopped serving one generation.
enum Served {
    Done,
    ClientGone,
}

/// `GET /ws/summary`: upgrade to a summary stream.
pub async fn summary_stream(
    State(state): State<Arc<AppState>>,
    upgrade: WebSocketUpgrade,
) -> Response {
    upgrade.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn send_frame(socket: &mut WebSocket, frame: &WsFrame) -> bool {
    let Ok(text) = serde_json::to_string(frame) else {
        return false;
    };
    socket.send(Message::Text(text.into())).await.is_ok()
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let client_id = Uuid::new_v4().to_string();
    info!(%client_id, "summary stream client connected");

    if !send_frame(
        &mut socket,
        &WsFrame::Connected {
            client_id: client_id.clone(),
        },
    )
    .await
    {
        return;
    }

    while let Some(message) = socket.recv().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        };

        let request: StreamRequest = serde_json::from_str(text.as_str()).unwrap_or_default();
        let owner = request
            .user
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| state.config.default_owner.clone());

        if let Served::ClientGone = serve_one(&mut socket, &state, owner).await {
            break;
        }
    }

    info!(%client_id, "summary stream client disconnected");
}

/// Run one generation, relaying fragments until it ends or the client leaves.
async fn serve_one(socket: &mut WebSocket, state: &Arc<AppState>, owner: String) -> Served {
    let (tx, mut rx) = mpsc::channel::<SummaryFragment>(1);
    let generator = state.generator.clone();
    let producer = tokio::spawn(async move {
        generator
            .stream_report(&owner, Local::now().date_naive(), tx)
            .await
    });

    let mut client_gone = false;
    loop {
        tokio::select! {
            fragment = rx.recv() => {
                let frame = match fragment {
                    Some(SummaryFragment::Token(content)) => WsFrame::Token { content },
                    Some(SummaryFragment::Error(message)) => WsFrame::Error { message },
                    None => break,
                };
                if !send_frame(socket, &frame).await {
                    client_gone = true;
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_)) | Err(_)) | None => {
                        client_gone = true;
                        break;
                    }
                    Some(Ok(_)) => debug!("ignoring client message during stream"),
                }
            }
        }
    }

    // Dropping the receiver tells the producer to stop.
    drop(rx);
    let report_id = match producer.await {
        Ok(StreamOutcome::Completed(outcome)) if outcome.persisted => Some(outcome.report.id),
        Ok(_) => None,
        Err(err) => {
            warn!(%err, "summary stream task failed");
            None
        }
    };

    if client_gone {
        return Served::ClientGone;
    }
    if send_frame(socket, &WsFrame::End { report_id }).await {
        Served::Done
    } else {
        Served::ClientGone
    }
}
