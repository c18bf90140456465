//! Interactive CLI client for the Kairo event room server.
//!
//! Prints incoming events and turns typed lines into client frames.
//! Reconnects on connection loss (max 5 attempts with 5 second interval).

mod command;
mod domain;
mod error;
mod formatter;
mod runner;
mod session;
mod ui;

pub use error::ClientError;
pub use runner::run_client;
