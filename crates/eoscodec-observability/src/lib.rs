//! # eoscodec-observability
//!
//! Structured logging for EOSCodec.
//!
//! Library crates only emit `tracing` events; binaries call [`init_tracing`]
//! once at startup. Output is human-readable text or JSON lines on stderr,
//! with levels configurable per component.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, LogConfig};
