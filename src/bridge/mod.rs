//! Bridge pipeline: filter -> normalize -> send.
//!
//! - `filter`: field-based relay eligibility predicate
//! - `normalize`: flattens a message into one text payload
//! - `controller`: the forwarding loop tying both to the send sink

pub mod controller;
pub mod filter;
pub mod normalize;

pub use controller::{BridgeConfig, BridgeController};
