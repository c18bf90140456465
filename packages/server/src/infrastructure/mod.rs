//! Infrastructure layer: concrete implementations of the domain interfaces
//! and the wire-level DTOs.

pub mod dispatcher;
pub mod dto;
pub mod registry;
pub mod scheduler;
