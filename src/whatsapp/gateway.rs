//! WebSocket transport to the WhatsApp sidecar gateway.
//!
//! The gateway process owns the actual WhatsApp protocol (pairing,
//! encryption, multi-device sync) and exposes it as a small JSON frame
//! protocol over a local WebSocket:
//!
//! - client -> gateway: `{"op":"init","credentials":...}` once after
//!   connecting, then `{"op":"send","jid":"...","text":"..."}` per message.
//! - gateway -> client: `{"op":"qr","code":"..."}`,
//!   `{"op":"creds","data":...}`, and
//!   `{"op":"state","state":"open"|"close","status_code":...}`.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use crate::common::error::{TransportError, TransportResult};
use crate::whatsapp::session::Credentials;
use crate::whatsapp::transport::{Transport, TransportEvent, TransportHandle};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// Frames sent to the gateway.
#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum ClientFrame<'a> {
    Init { credentials: &'a serde_json::Value },
    Send { jid: &'a str, text: &'a str },
}

/// Frames received from the gateway.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum GatewayFrame {
    Qr {
        code: String,
    },
    Creds {
        data: serde_json::Value,
    },
    State {
        state: SessionPhase,
        #[serde(default)]
        status_code: Option<u16>,
    },
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum SessionPhase {
    Open,
    Close,
}

/// Transport backed by the sidecar gateway.
pub struct GatewayTransport {
    url: String,
}

impl GatewayTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Write half of one gateway connection.
#[derive(Clone)]
pub struct GatewayHandle {
    sink: Arc<Mutex<WsSink>>,
}

#[async_trait]
impl Transport for GatewayTransport {
    type Handle = GatewayHandle;

    async fn connect(
        &self,
        credentials: Credentials,
    ) -> TransportResult<(Self::Handle, mpsc::UnboundedReceiver<TransportEvent>)> {
        let (ws, _response) =
            connect_async(self.url.as_str())
                .await
                .map_err(|e| TransportError::ConnectFailed {
                    url: self.url.clone(),
                    message: e.to_string(),
                })?;

        let (mut sink, stream) = ws.split();

        // Seed the session with the stored credentials before anything else.
        let init = serde_json::to_string(&ClientFrame::Init {
            credentials: &credentials.0,
        })
        .map_err(|e| TransportError::SendFailed {
            message: e.to_string(),
        })?;
        sink.send(Message::Text(init.into()))
            .await
            .map_err(|e| TransportError::ConnectFailed {
                url: self.url.clone(),
                message: e.to_string(),
            })?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        tokio::spawn(read_frames(stream, event_tx));

        let handle = GatewayHandle {
            sink: Arc::new(Mutex::new(sink)),
        };
        Ok((handle, event_rx))
    }
}

#[async_trait]
impl TransportHandle for GatewayHandle {
    async fn send_text(&self, conversation_id: &str, text: &str) -> TransportResult<()> {
        let frame = serde_json::to_string(&ClientFrame::Send {
            jid: conversation_id,
            text,
        })
        .map_err(|e| TransportError::SendFailed {
            message: e.to_string(),
        })?;

        let mut sink = self.sink.lock().await;
        sink.send(Message::Text(frame.into()))
            .await
            .map_err(|e| TransportError::SendFailed {
                message: e.to_string(),
            })
    }
}

/// Translate gateway frames into transport events until the socket dies.
async fn read_frames(
    mut stream: SplitStream<WsStream>,
    event_tx: mpsc::UnboundedSender<TransportEvent>,
) {
    while let Some(message) = stream.next().await {
        let raw = match message {
            Ok(Message::Text(raw)) => raw,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue, // ping/pong/binary
            Err(e) => {
                warn!("Gateway socket error: {}", e);
                break;
            }
        };

        let event = match parse_frame(raw.as_str()) {
            Ok(event) => event,
            Err(e) => {
                warn!("Dropping gateway connection: {}", e);
                break;
            }
        };

        let ended = matches!(event, TransportEvent::Disconnected { .. });
        if event_tx.send(event).is_err() {
            debug!("Transport event receiver dropped");
            return;
        }
        if ended {
            return;
        }
    }

    // Socket ended without an explicit close frame.
    let _ = event_tx.send(TransportEvent::Disconnected { status_code: None });
}

fn parse_frame(raw: &str) -> TransportResult<TransportEvent> {
    let frame: GatewayFrame =
        serde_json::from_str(raw).map_err(|e| TransportError::InvalidFrame {
            message: e.to_string(),
        })?;

    Ok(match frame {
        GatewayFrame::Qr { code } => TransportEvent::PairingCode(code),
        GatewayFrame::Creds { data } => TransportEvent::CredentialsUpdated(Credentials(data)),
        GatewayFrame::State { state, status_code } => match state {
            SessionPhase::Open => TransportEvent::Connected,
            SessionPhase::Close => TransportEvent::Disconnected { status_code },
        },
    })
}
