//! AES-256-GCM history codec.
//!
//! Encodes a conversation history as `"ENC:" + base64(nonce || ciphertext)`
//! with a random 12-byte nonce per call, so encrypting the same history
//! twice produces different payloads. The marker makes payloads
//! self-describing: a tagged payload is never mistaken for plaintext, and a
//! plaintext payload (pre-encryption rows) is never fed to the cipher.
//!
//! With no key configured, `encode` writes the `ENC:ERROR_NO_KEY` sentinel
//! instead of plaintext. That write loses the history; refusing a silent
//! plaintext fallback is the point.
//!
//! SECURITY: error and warning values never contain plaintext, key material,
//! or ciphertext.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::warn;

use palaver_core::codec::{ENC_MARKER, HistoryCodec, NO_KEY_SENTINEL};
use palaver_types::error::CodecError;
use palaver_types::history::{DecodedHistory, HistoryWarning};
use palaver_types::turn::Turn;

/// Nonce size for AES-256-GCM (96 bits / 12 bytes).
const NONCE_SIZE: usize = 12;

/// An encryption key that could not be used as configured.
///
/// Surfaced at startup; an unusable key is a hard error rather than a
/// silent downgrade to keyless operation.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("encryption key is not valid base64")]
    InvalidEncoding,

    #[error("encryption key must be 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// AES-256-GCM codec for history payloads at rest.
///
/// Constructed with or without a key. Without one, encoding degrades to the
/// sentinel and tagged payloads decode to a key-missing warning turn.
pub struct AesHistoryCodec {
    cipher: Option<Aes256Gcm>,
}

impl AesHistoryCodec {
    /// Codec with an active 32-byte key.
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: Some(Aes256Gcm::new(key.into())),
        }
    }

    /// Codec with no key: fail-closed writes, degraded tagged reads.
    pub fn without_key() -> Self {
        Self { cipher: None }
    }

    /// Build from a base64-encoded 32-byte key, as carried in `config.toml`.
    pub fn from_base64_key(encoded: &str) -> Result<Self, KeyError> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|_| KeyError::InvalidEncoding)?;
        if bytes.len() != 32 {
            return Err(KeyError::InvalidLength(bytes.len()));
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(&bytes);
        Ok(Self::new(&key))
    }

    /// Build from the optional config secret. `None` yields the keyless
    /// codec; an unusable key value is an error rather than a silent
    /// downgrade to plaintext or keyless operation.
    pub fn from_config_key(key: Option<&SecretString>) -> Result<Self, KeyError> {
        match key {
            Some(secret) => Self::from_base64_key(secret.expose_secret()),
            None => Ok(Self::without_key()),
        }
    }

    pub fn has_key(&self) -> bool {
        self.cipher.is_some()
    }
}

impl HistoryCodec for AesHistoryCodec {
    fn encode(&self, history: &[Turn]) -> Result<String, CodecError> {
        let Some(cipher) = &self.cipher else {
            warn!("no encryption key configured, writing sentinel instead of history");
            return Ok(NO_KEY_SENTINEL.to_string());
        };

        let json =
            serde_json::to_string(history).map_err(|e| CodecError::Serialize(e.to_string()))?;

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, json.as_bytes())
            .map_err(|_| CodecError::EncryptionFailed)?;

        let mut payload = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&ciphertext);
        Ok(format!("{ENC_MARKER}{}", BASE64.encode(payload)))
    }

    fn decode(&self, payload: &str) -> DecodedHistory {
        if payload.is_empty() {
            return DecodedHistory::empty();
        }

        if payload == NO_KEY_SENTINEL {
            return DecodedHistory::degraded(HistoryWarning::EncryptionWasUnavailable);
        }

        if let Some(encoded) = payload.strip_prefix(ENC_MARKER) {
            let Some(cipher) = &self.cipher else {
                return DecodedHistory::degraded(HistoryWarning::KeyMissing);
            };

            let Ok(data) = BASE64.decode(encoded) else {
                return DecodedHistory::degraded(HistoryWarning::DecryptionFailed);
            };
            if data.len() < NONCE_SIZE {
                return DecodedHistory::degraded(HistoryWarning::DecryptionFailed);
            }

            let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);
            let nonce = Nonce::from_slice(nonce_bytes);
            let Ok(plaintext) = cipher.decrypt(nonce, ciphertext) else {
                return DecodedHistory::degraded(HistoryWarning::DecryptionFailed);
            };

            return match serde_json::from_slice::<Vec<Turn>>(&plaintext) {
                Ok(turns) => DecodedHistory::intact(turns),
                Err(_) => DecodedHistory::degraded(HistoryWarning::DecryptionFailed),
            };
        }

        // Untagged: a row written before encryption existed.
        match serde_json::from_str::<Vec<Turn>>(payload) {
            Ok(turns) => DecodedHistory::intact(turns),
            Err(_) => DecodedHistory::degraded(HistoryWarning::MalformedPayload),
        }
    }
}
