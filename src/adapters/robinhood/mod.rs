//! Robinhood Adapter
//!
//! reqwest-backed implementation of the `BrokerageGateway` port plus the
//! session handshake. Wire shapes live in `types`.

mod client;
mod session;
mod types;

pub use client::{RobinhoodClient, RobinhoodConfig};
pub use session::{Credentials, Session};
