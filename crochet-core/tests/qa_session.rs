//! QA tests for full turns through a session.
//!
//! Replies come from `MockResponder`, so no assistant is contacted.

use crochet_core::testing::{assert_connected, assert_trait_moved_toward};
use crochet_core::{CrochetConfig, CrochetSession, Error, MockResponder, ResponderError};
use tempfile::TempDir;

async fn open_session(temp_dir: &TempDir) -> CrochetSession {
    let config = CrochetConfig::new().with_root(temp_dir.path());
    CrochetSession::open(config).await.expect("Session should open")
}

#[tokio::test]
async fn test_turn_with_three_characters() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let mut session = open_session(&temp_dir).await;
    let mut thread = session.open_thread("panel", "Panel").await.unwrap();

    let responder = MockResponder::new()
        .with_reply("theorist", "Shall we analyze it with logic?")
        .with_reply("tutor", "Imagine a deck of cards.")
        .with_reply("engineer", "Thank you, a great question.");
    let characters = ["theorist", "tutor", "engineer"];

    let outcome = session
        .run_turn(&mut thread, "What is entropy?", &characters, &responder)
        .await
        .expect("Turn should succeed");

    assert_eq!(outcome.replies.len(), 3);
    assert_eq!(thread.node_count(), 4);
    assert_eq!(thread.edge_count(), 3);
    for reply in &outcome.replies {
        assert_connected(&thread, outcome.user_node, reply.node_id);
    }
    assert_eq!(thread.current_context(), &[outcome.user_node]);

    let asked: Vec<_> = responder.calls().into_iter().map(|(c, _)| c).collect();
    assert_eq!(asked.len(), 3);

    // Thread and profiles were written.
    let stored = session.threads().load("panel").await.unwrap();
    assert_eq!(stored.nodes(), thread.nodes());

    let manager = session.personalities();
    assert_trait_moved_toward(manager.profile("theorist").unwrap(), "analytical", 0.7);
    assert_trait_moved_toward(manager.profile("tutor").unwrap(), "creativity", 0.7);
    assert_trait_moved_toward(manager.profile("engineer").unwrap(), "agreeableness", 0.7);
    assert_trait_moved_toward(manager.profile("engineer").unwrap(), "extraversion", 0.7);
}

#[tokio::test]
async fn test_failed_turn_records_nothing() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let mut session = open_session(&temp_dir).await;
    let mut thread = session.open_thread("failing", "Failing").await.unwrap();

    let responder = MockResponder::new()
        .with_reply("theorist", "Fine.")
        .with_failure("tutor");

    let err = session
        .run_turn(&mut thread, "Anyone?", &["theorist", "tutor"], &responder)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Responder(ResponderError::Failed { .. })));
    assert_eq!(thread.node_count(), 1);
    assert_eq!(thread.edge_count(), 0);
    assert!(!session.threads().exists("failing").await.unwrap());
    assert!(session.personalities().profile("theorist").is_none());
}

#[tokio::test]
async fn test_session_resumes_from_disk() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let responder = MockResponder::new().with_reply("tutor", "Why do you think so?");

    {
        let mut session = open_session(&temp_dir).await;
        let mut thread = session.open_thread("resume", "Resume").await.unwrap();
        session
            .run_turn(&mut thread, "Heat flows downhill", &["tutor"], &responder)
            .await
            .unwrap();
    }

    let mut session = open_session(&temp_dir).await;
    let mut thread = session.open_thread("resume", "ignored").await.unwrap();
    assert_eq!(thread.name(), "Resume");
    assert_eq!(thread.node_count(), 2);
    assert!((session.personalities().profile("tutor").unwrap().get_trait("openness") - 0.52).abs() < 1e-9);

    // A second turn branches from the new prompt only.
    let outcome = session
        .run_turn(&mut thread, "Go on", &["tutor"], &responder)
        .await
        .unwrap();
    assert_eq!(outcome.replies[0].content, MockResponder::FALLBACK);
    assert_eq!(thread.edge_count(), 2);
    assert_connected(&thread, outcome.user_node, outcome.replies[0].node_id);
}

#[tokio::test]
async fn test_turn_without_characters_still_saves_prompt() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let mut session = open_session(&temp_dir).await;
    let mut thread = session.open_thread("quiet", "Quiet").await.unwrap();

    let outcome = session
        .run_turn(&mut thread, "Hello?", &[] as &[&str], &MockResponder::new())
        .await
        .unwrap();

    assert!(outcome.replies.is_empty());
    assert_eq!(session.threads().load("quiet").await.unwrap().node_count(), 1);
}
