//! Kairo event room server library.
//!
//! Connection registry, room fan-out and bidirectional event dispatch over
//! WebSocket, with a small HTTP API for inspection.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
