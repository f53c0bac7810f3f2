//! The boundary to whatever produces character replies.

use crate::graph::CrochetThread;
use async_trait::async_trait;
use thiserror::Error;

/// Errors a responder can report.
#[derive(Debug, Error)]
pub enum ResponderError {
    #[error("Character '{character_id}' failed to respond: {reason}")]
    Failed { character_id: String, reason: String },

    #[error("Responder unavailable: {0}")]
    Unavailable(String),
}

/// Produces the reply of one character to a prompt.
///
/// Implementations typically wrap a hosted assistant. The thread is passed
/// read-only so a responder can build context from earlier turns.
#[async_trait]
pub trait CharacterResponder: Send + Sync {
    async fn respond(
        &self,
        character_id: &str,
        thread: &CrochetThread,
        prompt: &str,
    ) -> Result<String, ResponderError>;
}
