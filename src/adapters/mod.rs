//! Adapters Layer - implementations of the ports against the real world
//!
//! - `robinhood`: HTTP gateway plus the session handshake
//! - `sqlite`: transactional holdings store
//! - `cli`: clap command definitions

pub mod cli;
pub mod robinhood;
pub mod sqlite;
