//! Turning message text into trait observations.

use super::traits::DEFAULT_CONFIDENCE;
use std::collections::BTreeMap;

/// A single observed pull on a trait.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraitSignal {
    /// Value the trait is pulled toward.
    pub value: f64,
    /// How strongly to blend toward it.
    pub confidence: f64,
}

/// Observations produced from one message, keyed by trait name.
pub type TraitObservations = BTreeMap<String, TraitSignal>;

/// Maps message content to trait observations.
pub trait TraitAnalyzer: Send + Sync {
    /// Inspect `content` and report which traits it expresses.
    fn analyze(&self, content: &str) -> TraitObservations;
}

/// Value every keyword match pulls its trait toward.
const KEYWORD_VALUE: f64 = 0.7;

/// Keyword checks, one per default trait. A literal `?` counts as a keyword.
const KEYWORD_RULES: [(&str, &[&str]); 10] = [
    ("openness", &["?"]),
    ("conscientiousness", &["precise", "exact", "detail", "carefully"]),
    ("extraversion", &["excited", "amazing", "fantastic", "great"]),
    ("agreeableness", &["agree", "please", "thank", "appreciate"]),
    ("neuroticism", &["worried", "concerned", "anxious", "stress"]),
    ("creativity", &["create", "imagine", "design", "novel"]),
    ("analytical", &["analyze", "examine", "investigate", "logic"]),
    ("expertise", &["expert", "specialized", "advanced", "technical"]),
    ("humor", &["funny", "joke", "laugh", "humorous"]),
    ("empathy", &["feel", "understand", "perspective", "emotion"]),
];

/// Substring keyword matcher.
///
/// Each trait is checked independently against the lower-cased content, so a
/// message can trigger any subset of traits, including none.
#[derive(Debug, Clone, Copy)]
pub struct KeywordAnalyzer {
    signal: TraitSignal,
}

impl KeywordAnalyzer {
    /// Create an analyzer emitting `(0.7, 0.1)` per match.
    pub fn new() -> Self {
        Self {
            signal: TraitSignal {
                value: KEYWORD_VALUE,
                confidence: DEFAULT_CONFIDENCE,
            },
        }
    }

    /// Use a different blending weight for matches.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.signal.confidence = confidence;
        self
    }
}

impl Default for KeywordAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl TraitAnalyzer for KeywordAnalyzer {
    fn analyze(&self, content: &str) -> TraitObservations {
        let content = content.to_lowercase();
        KEYWORD_RULES
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|k| content.contains(k)))
            .map(|(name, _)| (name.to_string(), self.signal))
            .collect()
    }
}
