//! Common utilities and types shared across the application.

pub mod error;
pub mod types;

pub use error::{ConfigError, SessionError, TransportError};
pub use types::{DiscordId, EmbedRecord, InboundEvent, SourceEvent};
