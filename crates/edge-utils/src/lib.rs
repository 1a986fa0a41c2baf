//! Shared utilities for the edge-rs workspace
//!
//! Currently just tracing initialization, used by the server binary and
//! integration tests.

pub mod logging;

pub use logging::init_tracing;
