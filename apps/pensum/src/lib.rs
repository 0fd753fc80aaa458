//! # pensum
//!
//! Library half of the Pensum binary: the HTTP API and the runtime
//! configuration. Exposed as a library so integration tests can build the
//! router without starting a server.

pub mod api;
pub mod config;
