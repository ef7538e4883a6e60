//! Target transport seam.
//!
//! The WhatsApp protocol itself (pairing, encryption, multi-device sync)
//! lives behind these traits; the connection manager only consumes a
//! handle that can send text and a stream of state-change events.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::common::error::TransportResult;
use crate::whatsapp::session::Credentials;

/// Events emitted by an established transport connection.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// The provider rotated its credentials; persist before anything else.
    CredentialsUpdated(Credentials),
    /// A pairing challenge for the operator to approve.
    PairingCode(String),
    /// The session is open and ready to send.
    Connected,
    /// The session closed, with the provider's status code if it sent one.
    Disconnected { status_code: Option<u16> },
}

/// Factory for transport connections.
///
/// Each call to `connect` produces a brand-new connection; a dead handle
/// is never revived.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    type Handle: TransportHandle;

    /// Establish a connection seeded with the given credentials.
    ///
    /// The returned receiver delivers the connection's events in order;
    /// it closes when the connection is gone.
    async fn connect(
        &self,
        credentials: Credentials,
    ) -> TransportResult<(Self::Handle, mpsc::UnboundedReceiver<TransportEvent>)>;
}

/// Operations on a live transport connection.
#[async_trait]
pub trait TransportHandle: Clone + Send + Sync + 'static {
    /// Send a text message to the given conversation.
    async fn send_text(&self, conversation_id: &str, text: &str) -> TransportResult<()>;
}

/// Outcome of a bridge-level send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Message handed to the transport.
    Sent,
    /// Connection is not open; the caller decides to drop or buffer.
    NotReady,
    /// The transport reported a send failure; soft, already logged.
    Failed(String),
}

/// Controller-facing send seam, implemented by the connection manager.
#[async_trait]
pub trait TextSink: Send + Sync {
    async fn send_text(&self, conversation_id: &str, text: &str) -> SendOutcome;
}
