use thiserror::Error;

/// Errors from the persistent store and the flush path.
///
/// This is the only error family surfaced to callers: the in-memory copy is
/// never lost on failure, so a caller may simply retry the flush.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("history encoding failed: {0}")]
    Encoding(#[from] CodecError),
}

/// Encode-side codec failures.
///
/// Decoding never fails -- unreadable payloads degrade to warning turns
/// instead (see `HistoryWarning`).
///
/// IMPORTANT: these errors never include plaintext, key material, or
/// ciphertext in their Display/Debug output.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("history serialization failed: {0}")]
    Serialize(String),

    #[error("encryption failed")]
    EncryptionFailed,
}

/// Errors from the completion backend collaborator.
///
/// The backend is external to this crate; its failures propagate as-is.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{0}")]
    Api(String),
}

/// Errors from a full conversation exchange.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
