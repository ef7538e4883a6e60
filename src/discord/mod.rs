//! Discord source side of the bridge.

pub mod handler;

pub use handler::{build_client, SourceHandler};
