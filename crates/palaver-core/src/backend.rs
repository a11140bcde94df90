//! CompletionBackend trait definition.
//!
//! The completion/image API is an external collaborator: this crate only
//! consumes it and treats its replies as plain text. Errors propagate as-is.
//! Uses native async fn in traits (RPITIT, Rust 2024 edition).

use palaver_types::error::BackendError;
use palaver_types::session::{ImageQuality, ImageSize};
use palaver_types::turn::Turn;

/// Trait for the completion/image backend the conversation service talks to.
pub trait CompletionBackend: Send + Sync {
    /// Request a chat completion for the (already trimmed) outbound history.
    ///
    /// `system_prompt` is `None` when the session has none set; whether a
    /// given model honors it is the backend's business.
    fn complete(
        &self,
        model_id: &str,
        messages: &[Turn],
        system_prompt: Option<&str>,
    ) -> impl std::future::Future<Output = Result<String, BackendError>> + Send;

    /// Request an image generation; returns a URL or an opaque reference.
    fn generate_image(
        &self,
        prompt: &str,
        size: ImageSize,
        quality: ImageQuality,
    ) -> impl std::future::Future<Output = Result<String, BackendError>> + Send;
}
