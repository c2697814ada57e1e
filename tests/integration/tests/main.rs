//! End-to-end integration tests.
//!
//! Each test starts the gateway on an ephemeral port with the in-memory
//! backend and drives it over HTTP.

mod common;
mod gateway_api;
