//! Infrastructure layer for Palaver.
//!
//! Contains implementations of the port traits defined in `palaver-core`:
//! SQLite persistence, the AES-256-GCM history codec, configuration loading,
//! and tracing bootstrap.

pub mod config;
pub mod crypto;
pub mod sqlite;
pub mod telemetry;
