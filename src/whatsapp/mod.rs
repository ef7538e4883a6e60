//! WhatsApp side of the bridge: session persistence, the transport seam,
//! and the connection lifecycle state machine.

pub mod gateway;
pub mod manager;
pub mod session;
pub mod transport;

pub use gateway::GatewayTransport;
pub use manager::{ConnState, ConnectionManager, DisconnectKind};
pub use session::{Credentials, SessionStore};
pub use transport::{SendOutcome, TextSink, Transport, TransportEvent, TransportHandle};
