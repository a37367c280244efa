//! Shared infrastructure for Capstream.
//!
//! This crate carries the process-level concerns every other Capstream crate
//! leans on: the configuration schema, structured logging initialization,
//! and unix-time helpers. It holds no business logic.

pub mod config;
pub mod logging;
pub mod time;

pub use config::Config;
