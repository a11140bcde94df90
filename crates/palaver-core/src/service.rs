//! Conversation service orchestrating one exchange end to end.
//!
//! Glue between the session cache and the completion backend: append the
//! user's turn, project the trimmed history outward, forward it, record the
//! reply, flush. The transport layer above handles formatting and delivery
//! (chunking replies with [`crate::chunk::chunk_text`] as needed).

use std::sync::Arc;

use tracing::{info, instrument};

use palaver_types::error::ExchangeError;
use palaver_types::turn::Turn;

use crate::backend::CompletionBackend;
use crate::codec::HistoryCodec;
use crate::session::cache::SessionCache;
use crate::session::repository::SessionRepository;
use crate::trim::trim_history;

/// Runs complete exchanges against the completion backend.
///
/// Generic over the repository, codec, and backend ports so the core never
/// depends on the infrastructure layer.
pub struct ConversationService<R, C, B> {
    cache: Arc<SessionCache<R, C>>,
    backend: B,
}

impl<R, C, B> ConversationService<R, C, B>
where
    R: SessionRepository,
    C: HistoryCodec,
    B: CompletionBackend,
{
    pub fn new(cache: Arc<SessionCache<R, C>>, backend: B) -> Self {
        Self { cache, backend }
    }

    pub fn cache(&self) -> &Arc<SessionCache<R, C>> {
        &self.cache
    }

    /// Run one text exchange: append the user turn, send the trimmed
    /// projection (the stored history is not mutated by trimming), append
    /// the reply, bump the exchange counter, flush.
    ///
    /// The record lock is not held across the backend call; a concurrent
    /// exchange for the same user interleaves last-write-wins (see the
    /// session cache docs).
    #[instrument(skip(self, prompt))]
    pub async fn text_exchange(
        &self,
        user_id: i64,
        prompt: &str,
    ) -> Result<String, ExchangeError> {
        let live = self.cache.get_or_create(user_id).await?;

        let (model_id, outbound, system_prompt) = {
            let mut record = live.lock().await;
            record.push_user(prompt);
            let outbound: Vec<Turn> =
                trim_history(&record.history, record.output_budget_chars as usize);
            let system_prompt = (!record.system_prompt.is_empty())
                .then(|| record.system_prompt.clone());
            (record.model.id.clone(), outbound, system_prompt)
        };

        let reply = self
            .backend
            .complete(&model_id, &outbound, system_prompt.as_deref())
            .await?;

        {
            let mut record = live.lock().await;
            record.push_assistant(reply.clone());
            record.record_exchange();
        }
        self.cache.flush(user_id).await?;

        info!(user_id, reply_chars = reply.chars().count(), "text exchange completed");
        Ok(reply)
    }

    /// Run one image exchange with the session's size/quality settings.
    /// Counts as an exchange; the prompt and result are not added to the
    /// chat history.
    #[instrument(skip(self, prompt))]
    pub async fn image_exchange(
        &self,
        user_id: i64,
        prompt: &str,
    ) -> Result<String, ExchangeError> {
        let live = self.cache.get_or_create(user_id).await?;

        let (size, quality) = {
            let record = live.lock().await;
            (record.image_size, record.image_quality)
        };

        let image = self.backend.generate_image(prompt, size, quality).await?;

        live.lock().await.record_exchange();
        self.cache.flush(user_id).await?;

        info!(user_id, "image exchange completed");
        Ok(image)
    }
}
