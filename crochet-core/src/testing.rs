//! Testing utilities for crochet conversations.
//!
//! - `MockResponder` for deterministic turns without a hosted assistant
//! - Assertion helpers for thread structure and trait movement

use crate::graph::CrochetThread;
use crate::id::NodeId;
use crate::personality::PersonalityProfile;
use crate::responder::{CharacterResponder, ResponderError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// A scripted reply from the mock responder.
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// Reply with this text.
    Text(String),
    /// Fail as if the character could not answer.
    Failure(String),
}

/// A responder that returns scripted replies per character.
///
/// Each character's replies are consumed in order. Once a script runs out the
/// character answers with a fixed fallback text.
#[derive(Debug, Default)]
pub struct MockResponder {
    scripts: Mutex<HashMap<String, VecDeque<MockReply>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockResponder {
    /// Fallback text for characters without a scripted reply.
    pub const FALLBACK: &'static str = "I have nothing more to add.";

    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for a character.
    pub fn with_reply(self, character_id: &str, text: impl Into<String>) -> Self {
        self.push(character_id, MockReply::Text(text.into()));
        self
    }

    /// Queue a failure for a character.
    pub fn with_failure(self, character_id: &str) -> Self {
        self.push(character_id, MockReply::Failure("scripted failure".to_string()));
        self
    }

    /// Queue any reply after construction.
    pub fn push(&self, character_id: &str, reply: MockReply) {
        self.scripts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(character_id.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Every `(character_id, prompt)` the responder was asked, in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl CharacterResponder for MockResponder {
    async fn respond(
        &self,
        character_id: &str,
        _thread: &CrochetThread,
        prompt: &str,
    ) -> Result<String, ResponderError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((character_id.to_string(), prompt.to_string()));

        let next = self
            .scripts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(character_id)
            .and_then(VecDeque::pop_front);

        match next {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Failure(reason)) => Err(ResponderError::Failed {
                character_id: character_id.to_string(),
                reason,
            }),
            None => Ok(Self::FALLBACK.to_string()),
        }
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert that `source` has a direct edge to `target`.
pub fn assert_connected(thread: &CrochetThread, source: NodeId, target: NodeId) {
    assert!(
        thread
            .edges()
            .iter()
            .any(|e| e.source_id == source && e.target_id == target),
        "Expected an edge {source} -> {target}"
    );
}

/// Assert that every edge endpoint is a node of the thread.
pub fn assert_no_dangling_edges(thread: &CrochetThread) {
    for edge in thread.edges() {
        assert!(
            thread.contains(edge.source_id) && thread.contains(edge.target_id),
            "Dangling edge {} -> {}",
            edge.source_id,
            edge.target_id
        );
    }
}

/// Assert that a trait moved from the seed value toward `target`.
pub fn assert_trait_moved_toward(profile: &PersonalityProfile, name: &str, target: f64) {
    let value = profile.get_trait(name);
    let seed = crate::personality::SEED_VALUE;
    assert!(
        (value - target).abs() < (seed - target).abs(),
        "Expected {name} of {} to move from {seed} toward {target}, got {value}",
        profile.character_id()
    );
}
