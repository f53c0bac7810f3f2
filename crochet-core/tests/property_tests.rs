//! Property-based tests for crochet-core
//!
//! These tests verify invariants that must hold for any sequence of inputs:
//! - Edges never point at missing nodes
//! - User messages own the context pointer set
//! - Trait values stay within [0, 1]
//! - Stored profiles reload bit for bit
//!
//! Run with: cargo test --test property_tests

use proptest::prelude::*;

// ============================================================================
// THREAD GRAPH TESTS
// ============================================================================

mod graph_tests {
    use super::*;
    use crochet_core::{CrochetThread, EdgeType, NodeId, Role};

    const CHARACTERS: [&str; 3] = ["theorist", "tutor", "engineer"];

    #[derive(Debug, Clone)]
    enum Op {
        User,
        Assistant(Option<usize>),
        Response(usize, Vec<usize>),
        Event,
        Other,
        Connect(usize, usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::User),
            proptest::option::of(0..CHARACTERS.len()).prop_map(Op::Assistant),
            (0..CHARACTERS.len(), proptest::collection::vec(0..20usize, 0..3))
                .prop_map(|(c, ctx)| Op::Response(c, ctx)),
            Just(Op::Event),
            Just(Op::Other),
            (0..20usize, 0..20usize).prop_map(|(a, b)| Op::Connect(a, b)),
        ]
    }

    /// Pick an existing node, or an unknown id for large indices.
    fn pick(ids: &[NodeId], i: usize) -> NodeId {
        if ids.is_empty() || i >= 15 {
            NodeId::new()
        } else {
            ids[i % ids.len()]
        }
    }

    fn apply(thread: &mut CrochetThread, ids: &[NodeId], op: &Op) -> Option<NodeId> {
        match op {
            Op::User => Some(thread.add_message("user", "question", None)),
            Op::Assistant(c) => Some(thread.add_message(
                "assistant",
                "answer",
                c.map(|c| CHARACTERS[c]),
            )),
            Op::Response(c, ctx) => {
                let context: Vec<NodeId> = ctx.iter().map(|&i| pick(ids, i)).collect();
                Some(thread.add_character_response(CHARACTERS[*c], "reply", Some(context.as_slice())))
            }
            Op::Event => Some(thread.add_event("note", "aside")),
            Op::Other => Some(thread.add_message("system", "setup", None)),
            Op::Connect(a, b) => {
                thread.connect(pick(ids, *a), pick(ids, *b), EdgeType::Reply);
                None
            }
        }
    }

    proptest! {
        /// Invariant: every edge endpoint exists, whatever was inserted
        #[test]
        fn no_dangling_edges(ops in proptest::collection::vec(op(), 0..40)) {
            let mut thread = CrochetThread::new("prop", "Prop");
            let mut ids = Vec::new();
            for op in &ops {
                ids.extend(apply(&mut thread, &ids, op));
                for edge in thread.edges() {
                    prop_assert!(thread.contains(edge.source_id));
                    prop_assert!(thread.contains(edge.target_id));
                }
            }
            prop_assert_eq!(thread.node_count(), ids.len());
        }

        /// Invariant: only user messages touch the context, replacing it with themselves
        #[test]
        fn context_follows_user_messages(ops in proptest::collection::vec(op(), 0..40)) {
            let mut thread = CrochetThread::new("prop", "Prop");
            let mut ids = Vec::new();
            for op in &ops {
                let before = thread.current_context().to_vec();
                let added = apply(&mut thread, &ids, op);
                match op {
                    Op::User => prop_assert_eq!(thread.current_context(), &[added.unwrap()][..]),
                    _ => prop_assert_eq!(thread.current_context(), &before[..]),
                }
                ids.extend(added);
            }
        }

        /// Invariant: the character set only grows
        #[test]
        fn characters_grow_monotonically(ops in proptest::collection::vec(op(), 0..40)) {
            let mut thread = CrochetThread::new("prop", "Prop");
            let mut ids = Vec::new();
            for op in &ops {
                let before = thread.characters().clone();
                ids.extend(apply(&mut thread, &ids, op));
                prop_assert!(before.is_subset(thread.characters()));
            }
        }

        /// Invariant: the linear view is sorted and holds only user/assistant messages
        #[test]
        fn linear_view_sorted_and_filtered(ops in proptest::collection::vec(op(), 0..40)) {
            let mut thread = CrochetThread::new("prop", "Prop");
            let mut ids = Vec::new();
            for op in &ops {
                ids.extend(apply(&mut thread, &ids, op));
            }

            let linear = thread.get_linear_conversation();
            prop_assert!(linear.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
            prop_assert!(linear.iter().all(|m| matches!(m.role, Role::User | Role::Assistant)));

            let conversational = thread.nodes().iter().filter(|n| n.is_conversational()).count();
            prop_assert_eq!(linear.len(), conversational);
        }

        /// Invariant: a node's path to itself is just the node
        #[test]
        fn path_to_self(ops in proptest::collection::vec(op(), 1..20), pick_at in 0..20usize) {
            let mut thread = CrochetThread::new("prop", "Prop");
            let mut ids = Vec::new();
            for op in &ops {
                ids.extend(apply(&mut thread, &ids, op));
            }

            if !ids.is_empty() {
                let id = ids[pick_at % ids.len()];
                prop_assert_eq!(thread.get_conversation_path(id, id), vec![id]);
            }
            let stranger = NodeId::new();
            prop_assert!(thread.get_conversation_path(stranger, stranger).is_empty());
        }
    }
}

// ============================================================================
// PERSONALITY TRAIT TESTS
// ============================================================================

mod trait_tests {
    use super::*;
    use crochet_core::personality::DEFAULT_TRAITS;
    use crochet_core::{PersonalityProfile, PersonalityTrait};

    proptest! {
        /// Invariant: an update lands on the clamped blend, inside [0, 1]
        #[test]
        fn update_is_clamped_blend(
            start in 0.0..=1.0f64,
            value in -2.0..3.0f64,
            confidence in -1.0..2.0f64,
        ) {
            let mut t = PersonalityTrait::new("x", start);
            t.update(value, confidence);

            let c = confidence.clamp(0.0, 1.0);
            let expected = (start * (1.0 - c) + value * c).clamp(0.0, 1.0);
            prop_assert!((0.0..=1.0).contains(&t.value()));
            prop_assert!((t.value() - expected).abs() < 1e-12);
        }

        /// Invariant: zero confidence keeps the value but still records history
        #[test]
        fn zero_confidence_keeps_value(start in 0.0..=1.0f64, value in -2.0..3.0f64) {
            let mut t = PersonalityTrait::new("x", start);
            t.update(value, 0.0);
            prop_assert_eq!(t.value(), start);
            prop_assert_eq!(t.history().len(), 2);
        }

        /// Invariant: the trait vector always has one entry per default trait
        #[test]
        fn vector_length_fixed(
            updates in proptest::collection::vec(
                (prop_oneof![Just("openness"), Just("humor"), Just("stubbornness")], 0.0..=1.0f64, 0.0..=1.0f64),
                0..20,
            )
        ) {
            let mut profile = PersonalityProfile::new("prop");
            for (name, value, confidence) in updates {
                profile.update_trait(name, value, confidence);
            }
            let vector = profile.get_trait_vector();
            prop_assert_eq!(vector.len(), DEFAULT_TRAITS.len());
            prop_assert!(vector.iter().all(|v| (0.0..=1.0).contains(v)));
        }

        /// Invariant: the trait vector ignores the order distinct traits were updated in
        #[test]
        fn vector_ignores_update_order(
            (signals, order) in proptest::collection::vec((0.0..=1.0f64, 0.0..=1.0f64), DEFAULT_TRAITS.len())
                .prop_flat_map(|signals| {
                    let order = Just((0..signals.len()).collect::<Vec<_>>()).prop_shuffle();
                    (Just(signals), order)
                })
        ) {
            let mut forward = PersonalityProfile::new("prop");
            for (name, (value, confidence)) in DEFAULT_TRAITS.iter().zip(&signals) {
                forward.update_trait(name, *value, *confidence);
            }

            let mut shuffled = PersonalityProfile::new("prop");
            for &i in &order {
                let (value, confidence) = signals[i];
                shuffled.update_trait(DEFAULT_TRAITS[i], value, confidence);
            }

            prop_assert_eq!(forward.get_trait_vector(), shuffled.get_trait_vector());
        }
    }
}

// ============================================================================
// PERSISTENCE TESTS
// ============================================================================

mod persistence_tests {
    use super::*;
    use crochet_core::{PersonalityProfile, ProfileStore};
    use tempfile::TempDir;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        /// Invariant: every stored float reloads with the same bits
        #[test]
        fn profile_floats_reload_exactly(
            updates in proptest::collection::vec(
                (prop_oneof![Just("openness"), Just("humor"), Just("curiosity")], any::<f64>(), any::<f64>()),
                1..12,
            )
        ) {
            let mut profile = PersonalityProfile::new("prop");
            for (name, value, confidence) in updates {
                profile.update_trait(name, value, confidence);
            }

            let temp_dir = TempDir::new().expect("Failed to create temp dir");
            let store = ProfileStore::new(temp_dir.path());
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .expect("Failed to build runtime");
            let loaded = runtime.block_on(async {
                store.save(&profile).await.expect("Save should succeed");
                store.load("prop").await.expect("Load should succeed")
            });
            let loaded = loaded.expect("Profile should exist");

            for original in profile.traits() {
                let reloaded = loaded.get(original.name()).expect("Trait should survive");
                prop_assert_eq!(reloaded.value().to_bits(), original.value().to_bits());
                prop_assert_eq!(reloaded.history(), original.history());
            }
            prop_assert_eq!(loaded, profile);
        }
    }
}
