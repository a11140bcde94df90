//! Session store logic and port trait definitions for Palaver.
//!
//! This crate defines the "ports" (repository, codec, and completion backend
//! traits) that the infrastructure layer implements, plus everything that is
//! pure computation: the history trimmer, the output chunker, the session
//! cache, and the conversation service. It depends only on `palaver-types` --
//! never on `palaver-infra` or any database/crypto/IO crate.

pub mod access;
pub mod backend;
pub mod chunk;
pub mod codec;
pub mod service;
pub mod session;
pub mod trim;
