//! Session persistence and caching.
//!
//! This module defines the `SessionRepository` trait that the infrastructure
//! layer implements, and the `SessionCache` that owns the live per-user
//! records.

pub mod cache;
pub mod repository;
