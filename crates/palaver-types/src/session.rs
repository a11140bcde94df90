//! Session record types.
//!
//! A `SessionRecord` is the live, mutable state bundle for one user:
//! conversation history, model selection, and reply settings. Its persisted
//! projection is `SessionSnapshot`, which carries the encoded history payload
//! instead of decoded turns (the store never sees plaintext turns).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::turn::Turn;

/// Default character budget applied to outbound history projections.
pub const DEFAULT_OUTPUT_BUDGET_CHARS: u32 = 128_000;

/// Completion model selection: backend id plus the two presentation strings
/// derived from it. The three fields are mutually consistent and only ever
/// replaced together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelProfile {
    /// Backend model identifier (e.g. "gpt-4o-mini").
    pub id: String,
    /// Short label shown in status listings (e.g. "4o mini").
    pub label: String,
    /// Prefix prepended to replies by the transport layer.
    pub chat_prefix: String,
}

impl ModelProfile {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        chat_prefix: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            chat_prefix: chat_prefix.into(),
        }
    }
}

impl Default for ModelProfile {
    fn default() -> Self {
        Self::new("gpt-4o-mini", "4o mini", "4o mini:\n\n")
    }
}

/// Rendering quality for image-generation requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageQuality {
    Standard,
    Hd,
}

impl fmt::Display for ImageQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageQuality::Standard => write!(f, "standard"),
            ImageQuality::Hd => write!(f, "hd"),
        }
    }
}

impl FromStr for ImageQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(ImageQuality::Standard),
            "hd" => Ok(ImageQuality::Hd),
            other => Err(format!("invalid image quality: '{other}'")),
        }
    }
}

impl Default for ImageQuality {
    fn default() -> Self {
        ImageQuality::Standard
    }
}

/// Canvas size for image-generation requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSize {
    #[serde(rename = "1024x1024")]
    Square1024,
    #[serde(rename = "1792x1024")]
    Landscape1792,
    #[serde(rename = "1024x1792")]
    Portrait1792,
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSize::Square1024 => write!(f, "1024x1024"),
            ImageSize::Landscape1792 => write!(f, "1792x1024"),
            ImageSize::Portrait1792 => write!(f, "1024x1792"),
        }
    }
}

impl FromStr for ImageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1024x1024" => Ok(ImageSize::Square1024),
            "1792x1024" => Ok(ImageSize::Landscape1792),
            "1024x1792" => Ok(ImageSize::Portrait1792),
            other => Err(format!("invalid image size: '{other}'")),
        }
    }
}

impl Default for ImageSize {
    fn default() -> Self {
        ImageSize::Square1024
    }
}

/// Live per-user session state.
///
/// Exactly one instance exists per user id per process; the session cache is
/// the single installation gate. All mutation happens on the live instance,
/// and durability only through an explicit flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub user_id: i64,
    /// Advisory display name; may be stale. Empty means unknown.
    pub display_name: String,
    pub model: ModelProfile,
    pub history: Vec<Turn>,
    /// Lifetime count of completed exchanges. Independent of
    /// `history.len()`: history can be cleared without resetting it.
    pub turn_count: u32,
    pub output_budget_chars: u32,
    pub voice_reply_enabled: bool,
    /// Empty string means unset.
    pub system_prompt: String,
    pub image_quality: ImageQuality,
    pub image_size: ImageSize,
}

impl SessionRecord {
    /// A fresh record with default settings for a user seen for the first
    /// time.
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            display_name: String::new(),
            model: ModelProfile::default(),
            history: Vec::new(),
            turn_count: 0,
            output_budget_chars: DEFAULT_OUTPUT_BUDGET_CHARS,
            voice_reply_enabled: false,
            system_prompt: String::new(),
            image_quality: ImageQuality::default(),
            image_size: ImageSize::default(),
        }
    }

    /// Rebuild a live record from its persisted snapshot and the decoded
    /// history turns.
    pub fn from_snapshot(snapshot: SessionSnapshot, history: Vec<Turn>) -> Self {
        Self {
            user_id: snapshot.user_id,
            display_name: snapshot.display_name,
            model: snapshot.model,
            history,
            turn_count: snapshot.turn_count,
            output_budget_chars: snapshot.output_budget_chars,
            voice_reply_enabled: snapshot.voice_reply_enabled,
            system_prompt: snapshot.system_prompt,
            image_quality: snapshot.image_quality,
            image_size: snapshot.image_size,
        }
    }

    /// Build the persisted projection of this record around an
    /// already-encoded history payload.
    pub fn to_snapshot(&self, history_payload: String, updated_at: DateTime<Utc>) -> SessionSnapshot {
        SessionSnapshot {
            user_id: self.user_id,
            display_name: self.display_name.clone(),
            model: self.model.clone(),
            history_payload,
            turn_count: self.turn_count,
            output_budget_chars: self.output_budget_chars,
            voice_reply_enabled: self.voice_reply_enabled,
            system_prompt: self.system_prompt.clone(),
            image_quality: self.image_quality,
            image_size: self.image_size,
            updated_at,
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.history.push(Turn::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.history.push(Turn::assistant(content));
    }

    /// Record one completed exchange.
    pub fn record_exchange(&mut self) {
        self.turn_count += 1;
    }

    /// Drop the conversation history. The turn counter survives: it is a
    /// lifetime metric, not a history length.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Reinitialize settings and history to defaults. The record itself is
    /// never deleted; `user_id` and `display_name` survive a reset.
    pub fn reset(&mut self) {
        let user_id = self.user_id;
        let display_name = std::mem::take(&mut self.display_name);
        *self = Self::new(user_id);
        self.display_name = display_name;
    }
}

/// Persisted projection of a `SessionRecord`.
///
/// Identical scalar fields, but the history rides as the codec's encoded
/// payload: legacy plaintext JSON, `"ENC:" + ciphertext`, or the no-key
/// sentinel. Only the history column is ever encrypted; the remaining fields
/// stay directly legible for operational queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub user_id: i64,
    pub display_name: String,
    pub model: ModelProfile,
    pub history_payload: String,
    pub turn_count: u32,
    pub output_budget_chars: u32,
    pub voice_reply_enabled: bool,
    pub system_prompt: String,
    pub image_quality: ImageQuality,
    pub image_size: ImageSize,
    pub updated_at: DateTime<Utc>,
}

/// One row of a user listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id: i64,
    pub display_name: String,
}
