//! CrochetSession - the primary public API for multi-character conversations.
//!
//! A session ties together the thread store, the personality registry and the
//! trait analyzer. Callers either record turns step by step or hand a
//! [`CharacterResponder`] to [`CrochetSession::run_turn`].

use crate::config::CrochetConfig;
use crate::error::Result;
use crate::graph::CrochetThread;
use crate::id::NodeId;
use crate::persist::{ProfileStore, ThreadStore};
use crate::personality::{KeywordAnalyzer, PersonalityManager, TraitAnalyzer, TraitObservations};
use crate::responder::CharacterResponder;
use futures::future::try_join_all;
use tokio::fs;
use tracing::info;

/// One character's contribution to a turn.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterReply {
    /// Who replied.
    pub character_id: String,

    /// Node holding the reply.
    pub node_id: NodeId,

    /// Reply text.
    pub content: String,

    /// Traits the reply expressed.
    pub observations: TraitObservations,
}

/// Result of [`CrochetSession::run_turn`].
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Node holding the prompt.
    pub user_node: NodeId,

    /// Replies in the order the characters were given.
    pub replies: Vec<CharacterReply>,
}

/// A conversation session.
///
/// Owns the live personality profiles, so there should be one session per
/// storage directory.
pub struct CrochetSession {
    config: CrochetConfig,
    threads: ThreadStore,
    personalities: PersonalityManager,
    analyzer: Box<dyn TraitAnalyzer>,
}

impl CrochetSession {
    /// Open a session, creating the storage directories and loading every
    /// stored personality.
    pub async fn open(config: CrochetConfig) -> Result<Self> {
        fs::create_dir_all(&config.thread_dir)
            .await
            .map_err(crate::persist::PersistError::from)?;
        fs::create_dir_all(&config.personality_dir)
            .await
            .map_err(crate::persist::PersistError::from)?;

        let threads = ThreadStore::new(&config.thread_dir);
        let personalities = PersonalityManager::open(ProfileStore::new(&config.personality_dir)).await?;
        let analyzer = KeywordAnalyzer::new().with_confidence(config.default_confidence);
        info!(threads = %config.thread_dir.display(), "opened session");

        Ok(Self {
            config,
            threads,
            personalities,
            analyzer: Box::new(analyzer),
        })
    }

    /// Replace the trait analyzer.
    pub fn with_analyzer(mut self, analyzer: impl TraitAnalyzer + 'static) -> Self {
        self.analyzer = Box::new(analyzer);
        self
    }

    pub fn config(&self) -> &CrochetConfig {
        &self.config
    }

    pub fn threads(&self) -> &ThreadStore {
        &self.threads
    }

    pub fn personalities(&self) -> &PersonalityManager {
        &self.personalities
    }

    pub fn personalities_mut(&mut self) -> &mut PersonalityManager {
        &mut self.personalities
    }

    /// Load a thread, or start it when nothing is stored.
    pub async fn open_thread(&self, thread_id: &str, name: &str) -> Result<CrochetThread> {
        Ok(self.threads.load_or_create(thread_id, name).await?)
    }

    pub async fn save_thread(&self, thread: &CrochetThread) -> Result<()> {
        Ok(self.threads.save(thread).await?)
    }

    /// Record a user message. It becomes the context of the next replies.
    pub fn record_user_message(&self, thread: &mut CrochetThread, content: &str) -> NodeId {
        thread.add_message("user", content, None)
    }

    /// Record a character's reply to the current context and evolve its
    /// personality from what it said.
    pub async fn record_response(
        &mut self,
        thread: &mut CrochetThread,
        character_id: &str,
        content: &str,
    ) -> Result<CharacterReply> {
        let node_id = thread.add_character_response(character_id, content, None);
        let observations = self
            .personalities
            .update_personality(character_id, content, self.analyzer.as_ref())
            .await?;

        Ok(CharacterReply {
            character_id: character_id.to_string(),
            node_id,
            content: content.to_string(),
            observations,
        })
    }

    /// Run one full turn: the prompt, then a reply from every character.
    ///
    /// Replies are requested concurrently and recorded in `characters` order.
    /// If any character fails, no reply is recorded and nothing is saved; the
    /// prompt node stays in `thread`. Personalities evolve in memory first;
    /// the thread is saved before any profile, so a failed profile save leaves
    /// the stored thread complete and the live profiles ahead of their files.
    pub async fn run_turn<R, S>(
        &mut self,
        thread: &mut CrochetThread,
        prompt: &str,
        characters: &[S],
        responder: &R,
    ) -> Result<TurnOutcome>
    where
        R: CharacterResponder + ?Sized,
        S: AsRef<str>,
    {
        let user_node = self.record_user_message(thread, prompt);

        let snapshot: &CrochetThread = thread;
        let contents = try_join_all(
            characters
                .iter()
                .map(|character| responder.respond(character.as_ref(), snapshot, prompt)),
        )
        .await?;

        let mut replies = Vec::with_capacity(contents.len());
        for (character, content) in characters.iter().zip(contents) {
            let character_id = character.as_ref();
            let node_id = thread.add_character_response(character_id, &content, None);
            let observations = self
                .personalities
                .evolve(character_id, &content, self.analyzer.as_ref())
                .await?;
            replies.push(CharacterReply {
                character_id: character_id.to_string(),
                node_id,
                content,
                observations,
            });
        }

        self.save_thread(thread).await?;
        for reply in &replies {
            self.personalities.save_profile(&reply.character_id).await?;
        }

        info!(
            thread = thread.thread_id(),
            replies = replies.len(),
            "completed turn"
        );
        Ok(TurnOutcome { user_node, replies })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockResponder;
    use tempfile::TempDir;

    async fn session(dir: &TempDir) -> CrochetSession {
        CrochetSession::open(CrochetConfig::new().with_root(dir.path()))
            .await
            .expect("Session should open")
    }

    #[tokio::test]
    async fn test_open_creates_directories() {
        let dir = TempDir::new().unwrap();
        let session = session(&dir).await;
        assert!(session.config().thread_dir.is_dir());
        assert!(session.config().personality_dir.is_dir());
    }

    #[tokio::test]
    async fn test_manual_turn() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir).await;
        let mut thread = session.open_thread("t1", "Manual").await.unwrap();

        let question = session.record_user_message(&mut thread, "What is entropy?");
        let reply = session
            .record_response(&mut thread, "theorist", "Entropy is a precise measure?")
            .await
            .unwrap();

        assert_eq!(thread.get_conversation_path(question, reply.node_id), vec![question, reply.node_id]);
        assert!(reply.observations.contains_key("openness"));
        assert!(reply.observations.contains_key("conscientiousness"));

        let profile = session.personalities().profile("theorist").unwrap();
        assert!((profile.get_trait("openness") - 0.52).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_run_turn() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir).await;
        let mut thread = session.open_thread("t2", "Turn").await.unwrap();
        let responder = MockResponder::new()
            .with_reply("theorist", "It measures uncertainty.")
            .with_reply("tutor", "Think of how surprised you feel.");

        let outcome = session
            .run_turn(&mut thread, "What is entropy?", &["theorist", "tutor"], &responder)
            .await
            .unwrap();

        let order: Vec<_> = outcome.replies.iter().map(|r| r.character_id.as_str()).collect();
        assert_eq!(order, vec!["theorist", "tutor"]);
        assert_eq!(thread.edge_count(), 2);
        assert!(session.threads().exists("t2").await.unwrap());
    }

    #[tokio::test]
    async fn test_thread_saved_before_profiles() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir).await;
        let mut thread = session.open_thread("t4", "Order").await.unwrap();
        let responder = MockResponder::new();
        session
            .run_turn(&mut thread, "First?", &["theorist", "tutor"], &responder)
            .await
            .unwrap();

        // Profiles are live now; make their directory unwritable by replacing it with a file.
        let personality_dir = session.config().personality_dir.clone();
        std::fs::remove_dir_all(&personality_dir).unwrap();
        std::fs::write(&personality_dir, "not a directory").unwrap();

        let result = session
            .run_turn(&mut thread, "Second?", &["theorist", "tutor"], &responder)
            .await;
        assert!(result.is_err());

        let stored = session.threads().load("t4").await.unwrap();
        assert_eq!(stored.node_count(), 6);
        assert_eq!(stored.get_character_responses("tutor").len(), 2);
    }

    #[tokio::test]
    async fn test_custom_analyzer() {
        struct Humorless;
        impl TraitAnalyzer for Humorless {
            fn analyze(&self, _content: &str) -> TraitObservations {
                let mut observations = TraitObservations::new();
                observations.insert(
                    "humor".to_string(),
                    crate::personality::TraitSignal {
                        value: 0.0,
                        confidence: 1.0,
                    },
                );
                observations
            }
        }

        let dir = TempDir::new().unwrap();
        let mut session = session(&dir).await.with_analyzer(Humorless);
        let mut thread = CrochetThread::new("t3", "Custom");
        session.record_user_message(&mut thread, "hello");
        session.record_response(&mut thread, "engineer", "hi").await.unwrap();

        let profile = session.personalities().profile("engineer").unwrap();
        assert_eq!(profile.get_trait("humor"), 0.0);
    }
}
