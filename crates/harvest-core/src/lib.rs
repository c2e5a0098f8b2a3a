//! Shared service plumbing for the Harvest marketplace.
//!
//! Config loading, tracing init, health handlers, request-id middleware,
//! and serde helpers. No domain logic lives here.

pub mod config;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
