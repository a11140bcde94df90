//! Decode results for persisted history payloads.
//!
//! Decoding never fails: unreadable payloads degrade to an empty (or
//! warning-only) history with a machine-readable warning attached. The
//! warning is also materialized as a synthetic system turn so the
//! degradation is visible in the conversation itself rather than silently
//! discarding the user's context.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::turn::Turn;

/// Why a persisted history payload could not be read back intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryWarning {
    /// Ciphertext is present but no encryption key is configured. The data
    /// is inaccessible, not lost: it becomes readable again if the key
    /// reappears.
    KeyMissing,
    /// Decryption failed: wrong key or corrupted ciphertext.
    DecryptionFailed,
    /// An untagged payload that is not valid conversation JSON.
    MalformedPayload,
    /// A previous save ran without an encryption key, so the history was
    /// replaced by a sentinel instead of being written out.
    EncryptionWasUnavailable,
}

impl fmt::Display for HistoryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryWarning::KeyMissing => {
                write!(f, "stored history is encrypted but no encryption key is configured")
            }
            HistoryWarning::DecryptionFailed => {
                write!(f, "stored history could not be decrypted (wrong key or corrupted data)")
            }
            HistoryWarning::MalformedPayload => {
                write!(f, "stored history is not valid conversation data")
            }
            HistoryWarning::EncryptionWasUnavailable => {
                write!(f, "a previous save ran without an encryption key, so that conversation was not retained")
            }
        }
    }
}

/// Result of decoding a persisted history payload.
///
/// `turns` is ready to install on a live session record. When decoding
/// degrades, `turns` contains a single synthetic system turn describing the
/// problem and `warnings` carries the machine-readable cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHistory {
    pub turns: Vec<Turn>,
    pub warnings: Vec<HistoryWarning>,
}

impl DecodedHistory {
    /// An empty history with nothing to report (fresh record, empty payload).
    pub fn empty() -> Self {
        Self {
            turns: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// A successfully decoded history.
    pub fn intact(turns: Vec<Turn>) -> Self {
        Self {
            turns,
            warnings: Vec::new(),
        }
    }

    /// A degraded decode: one synthetic system turn explaining the warning.
    pub fn degraded(warning: HistoryWarning) -> Self {
        Self {
            turns: vec![Turn::system(format!("Conversation history unavailable: {warning}."))],
            warnings: vec![warning],
        }
    }

    /// Whether the payload decoded without degradation.
    pub fn is_intact(&self) -> bool {
        self.warnings.is_empty()
    }
}
