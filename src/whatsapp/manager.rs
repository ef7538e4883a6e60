//! WhatsApp connection lifecycle management.
//!
//! Owns the session's connection state machine: connects with the stored
//! credentials, persists credential updates, surfaces pairing codes,
//! classifies disconnects, and reconnects after transient failures. A
//! fatal disconnect (session invalidated) stops the machine and notifies
//! the host so it can exit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::whatsapp::session::SessionStore;
use crate::whatsapp::transport::{
    SendOutcome, TextSink, Transport, TransportEvent, TransportHandle,
};

/// Status code WhatsApp reports when the device was logged out remotely.
/// Reconnecting is pointless; the operator has to pair again.
const LOGGED_OUT_STATUS: u16 = 401;

/// Connection state, driven only by transport events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// Not started yet.
    Idle,
    /// A connection attempt is in flight.
    Connecting,
    /// Session is open; sends are accepted.
    Open,
    /// Connection lost; a reconnect is pending.
    Closed,
    /// Terminal: fatal disconnect or shutdown.
    Stopped,
}

/// Classification of a disconnect reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectKind {
    /// Session permanently invalid; do not reconnect.
    Fatal,
    /// Anything else; reconnect after a delay.
    Transient,
}

impl DisconnectKind {
    pub fn classify(status_code: Option<u16>) -> Self {
        match status_code {
            Some(LOGGED_OUT_STATUS) => Self::Fatal,
            _ => Self::Transient,
        }
    }
}

/// Callback that renders a pairing code for the operator.
pub type PairingDisplay = Box<dyn Fn(&str) + Send + Sync>;

/// How the event-drive loop ended.
enum DriveEnd {
    /// Provider reported the connection closed.
    Closed(Option<u16>),
    /// Event stream ended without an explicit close.
    StreamEnded,
    /// Host requested shutdown.
    Shutdown,
}

struct Inner<T: Transport> {
    transport: T,
    store: SessionStore,
    reconnect_delay: Duration,
    on_pairing: PairingDisplay,
    state: RwLock<ConnState>,
    handle: RwLock<Option<T::Handle>>,
    started: AtomicBool,
    ready_tx: watch::Sender<bool>,
    fatal_tx: watch::Sender<bool>,
}

/// Manages the single live WhatsApp connection for the process.
pub struct ConnectionManager<T: Transport> {
    inner: Arc<Inner<T>>,
}

impl<T: Transport> Clone for ConnectionManager<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> ConnectionManager<T> {
    pub fn new(
        transport: T,
        store: SessionStore,
        reconnect_delay: Duration,
        on_pairing: PairingDisplay,
    ) -> Self {
        let (ready_tx, _) = watch::channel(false);
        let (fatal_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                transport,
                store,
                reconnect_delay,
                on_pairing,
                state: RwLock::new(ConnState::Idle),
                handle: RwLock::new(None),
                started: AtomicBool::new(false),
                ready_tx,
                fatal_tx,
            }),
        }
    }

    /// Start the connection loop. Idempotent; returns the task handle on
    /// the first call, `None` afterwards.
    pub fn start(&self, shutdown_rx: watch::Receiver<bool>) -> Option<JoinHandle<()>> {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return None;
        }
        let inner = Arc::clone(&self.inner);
        Some(tokio::spawn(async move {
            Inner::run(inner, shutdown_rx).await;
        }))
    }

    /// Watch for the connection becoming (un)ready to send.
    pub fn subscribe_ready(&self) -> watch::Receiver<bool> {
        self.inner.ready_tx.subscribe()
    }

    /// Watch for a fatal session invalidation.
    pub fn subscribe_fatal(&self) -> watch::Receiver<bool> {
        self.inner.fatal_tx.subscribe()
    }

    /// Current connection state.
    #[allow(dead_code)]
    pub async fn state(&self) -> ConnState {
        *self.inner.state.read().await
    }
}

impl<T: Transport> Inner<T> {
    async fn set_state(&self, state: ConnState) {
        *self.state.write().await = state;
    }

    async fn run(inner: Arc<Self>, mut shutdown_rx: watch::Receiver<bool>) {
        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            inner.set_state(ConnState::Connecting).await;
            let credentials = inner.store.load();
            if credentials.is_fresh() {
                info!("No stored session - a pairing code will be displayed");
            }

            info!("Connecting to WhatsApp...");
            let end = match inner.transport.connect(credentials).await {
                Ok((handle, events)) => {
                    *inner.handle.write().await = Some(handle);
                    let end = inner.drive(events, &mut shutdown_rx).await;
                    // Dead connections are never reused
                    *inner.handle.write().await = None;
                    end
                }
                Err(e) => {
                    warn!("WhatsApp connection attempt failed: {}", e);
                    DriveEnd::StreamEnded
                }
            };

            let _ = inner.ready_tx.send(false);

            let status_code = match end {
                DriveEnd::Shutdown => break,
                DriveEnd::Closed(code) => code,
                DriveEnd::StreamEnded => None,
            };

            match DisconnectKind::classify(status_code) {
                DisconnectKind::Fatal => {
                    error!(
                        "WhatsApp session was invalidated (status {}). \
                         Delete the session directory and pair again.",
                        LOGGED_OUT_STATUS
                    );
                    inner.set_state(ConnState::Stopped).await;
                    // Returning before any timer is scheduled means no
                    // reconnect can race the shutdown path.
                    let _ = inner.fatal_tx.send(true);
                    return;
                }
                DisconnectKind::Transient => {
                    inner.set_state(ConnState::Closed).await;
                    info!(
                        "Reconnecting in {:.1} seconds...",
                        inner.reconnect_delay.as_secs_f64()
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(inner.reconnect_delay) => {}
                        changed = shutdown_rx.changed() => {
                            // A closed shutdown channel means the host is gone.
                            if changed.is_err() || *shutdown_rx.borrow() {
                                break;
                            }
                        }
                    }
                }
            }
        }

        inner.set_state(ConnState::Stopped).await;
    }

    /// Process one connection's events until it closes or shutdown.
    async fn drive(
        &self,
        mut events: tokio::sync::mpsc::UnboundedReceiver<TransportEvent>,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> DriveEnd {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(TransportEvent::CredentialsUpdated(credentials)) => {
                        // Persist before touching the next event so the
                        // store always holds the latest acknowledged state.
                        if let Err(e) = self.store.save(&credentials) {
                            warn!("Failed to persist session credentials: {}", e);
                        }
                    }
                    Some(TransportEvent::PairingCode(code)) => {
                        info!("Pairing required - scan the code with your phone");
                        (self.on_pairing)(&code);
                    }
                    Some(TransportEvent::Connected) => {
                        info!("WhatsApp connected");
                        self.set_state(ConnState::Open).await;
                        let _ = self.ready_tx.send(true);
                    }
                    Some(TransportEvent::Disconnected { status_code }) => {
                        warn!(
                            "WhatsApp connection closed (status: {})",
                            status_code.map_or_else(|| "unknown".to_string(), |c| c.to_string())
                        );
                        return DriveEnd::Closed(status_code);
                    }
                    None => return DriveEnd::StreamEnded,
                },
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        return DriveEnd::Shutdown;
                    }
                }
            }
        }
    }
}

#[async_trait]
impl<T: Transport> TextSink for ConnectionManager<T> {
    /// Send text to a conversation. Soft-fails: callers get an outcome,
    /// never a panic, and the state machine is untouched by send errors.
    async fn send_text(&self, conversation_id: &str, text: &str) -> SendOutcome {
        if *self.inner.state.read().await != ConnState::Open {
            return SendOutcome::NotReady;
        }

        let handle = self.inner.handle.read().await.clone();
        match handle {
            Some(handle) => match handle.send_text(conversation_id, text).await {
                Ok(()) => SendOutcome::Sent,
                Err(e) => {
                    warn!("WhatsApp send failed: {}", e);
                    SendOutcome::Failed(e.to_string())
                }
            },
            // Closed between the state check and the handle read.
            None => SendOutcome::NotReady,
        }
    }
}
