//! Nonlinear conversation memory and character personality evolution.
//!
//! This crate provides:
//! - A graph-structured conversation thread with character-aware branching
//! - Personality profiles whose traits drift toward what a character expresses
//! - JSON persistence for threads and profiles
//! - A session that runs a full turn against any [`CharacterResponder`]
//!
//! # Quick Start
//!
//! ```ignore
//! use crochet_core::{CrochetConfig, CrochetSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = CrochetSession::open(CrochetConfig::new()).await?;
//!     let mut thread = session.open_thread("physics", "Physics chat").await?;
//!
//!     let question = session.record_user_message(&mut thread, "What is entropy?");
//!     let reply = session
//!         .record_response(&mut thread, "theorist", "A measure of uncertainty.")
//!         .await?;
//!
//!     assert_eq!(
//!         thread.get_conversation_path(question, reply.node_id),
//!         vec![question, reply.node_id]
//!     );
//!     session.save_thread(&thread).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod id;
pub mod persist;
pub mod personality;
pub mod responder;
pub mod session;
pub mod testing;

// Primary public API
pub use config::CrochetConfig;
pub use error::{Error, Result};
pub use graph::{CrochetThread, EdgeType, LinearMessage, MemoryEdge, MemoryNode, NodeKind, Role};
pub use id::NodeId;
pub use persist::{PersistError, ProfileStore, ThreadStore};
pub use personality::{
    KeywordAnalyzer, PersonalityManager, PersonalityProfile, PersonalityTrait, TraitAnalyzer,
    TraitObservations, TraitSignal,
};
pub use responder::{CharacterResponder, ResponderError};
pub use session::{CharacterReply, CrochetSession, TurnOutcome};
pub use testing::MockResponder;
