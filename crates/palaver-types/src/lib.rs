//! Shared domain types for Palaver.
//!
//! This crate contains the types used across the Palaver session store:
//! conversation turns, session records and their persisted snapshots, and
//! the associated error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod error;
pub mod history;
pub mod session;
pub mod turn;
