//! HistoryCodec trait definition.
//!
//! The codec turns a history into its persisted payload and back. Encoding
//! may fail (serialization, cipher errors); decoding never does -- it
//! degrades to warning turns so a corrupted or unreadable history surfaces
//! as a visible, recoverable state instead of crashing the session.
//!
//! Implementations live in palaver-infra (e.g. `AesHistoryCodec`).

use palaver_types::error::CodecError;
use palaver_types::history::DecodedHistory;
use palaver_types::turn::Turn;

/// Marker prefix for self-describing encrypted payloads.
pub const ENC_MARKER: &str = "ENC:";

/// Sentinel written in place of the history when no encryption key is
/// configured at encode time. A deliberate confidentiality-over-availability
/// choice: the write loses the history rather than persisting plaintext.
pub const NO_KEY_SENTINEL: &str = "ENC:ERROR_NO_KEY";

/// Encodes and decodes the persisted history payload.
pub trait HistoryCodec: Send + Sync {
    /// Serialize and (when a key is configured) encrypt `history` into its
    /// persisted payload. Without a key this returns [`NO_KEY_SENTINEL`],
    /// never plaintext.
    fn encode(&self, history: &[Turn]) -> Result<String, CodecError>;

    /// Decode a persisted payload. Infallible: unreadable payloads come back
    /// as a warning-turn history (see `DecodedHistory::degraded`).
    fn decode(&self, payload: &str) -> DecodedHistory;
}
