//! Crate-level error type.

use crate::persist::PersistError;
use crate::responder::ResponderError;

/// Any failure surfaced by a [`CrochetSession`](crate::CrochetSession).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Storage failed or held a malformed document.
    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    /// A character could not produce a reply.
    #[error("Responder error: {0}")]
    Responder(#[from] ResponderError),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
