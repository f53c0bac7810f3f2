//! Bounded personality traits with update history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Value every trait starts from.
pub const SEED_VALUE: f64 = 0.5;

/// Blending weight used when none is given.
pub const DEFAULT_CONFIDENCE: f64 = 0.1;

/// Traits every new profile is seeded with.
pub const DEFAULT_TRAITS: [&str; 10] = [
    "openness",
    "conscientiousness",
    "extraversion",
    "agreeableness",
    "neuroticism",
    "creativity",
    "analytical",
    "expertise",
    "humor",
    "empathy",
];

/// One entry of a trait's audit history.
///
/// The seed entry has no `change` or `confidence`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitSample {
    /// When the value was recorded.
    pub timestamp: DateTime<Utc>,
    /// Value after the update.
    pub value: f64,
    /// Difference from the previous value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    /// Blending weight that was applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// A personality dimension in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalityTrait {
    name: String,
    value: f64,
    history: Vec<TraitSample>,
}

impl PersonalityTrait {
    /// Create a trait at `value` (clamped), recording the seed sample.
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        let value = clamp_unit(value, SEED_VALUE);
        Self {
            name: name.into(),
            value,
            history: vec![TraitSample {
                timestamp: Utc::now(),
                value,
                change: None,
                confidence: None,
            }],
        }
    }

    /// Create a trait at the seed value.
    pub fn seeded(name: impl Into<String>) -> Self {
        Self::new(name, SEED_VALUE)
    }

    /// Trait name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Every recorded value, oldest first.
    pub fn history(&self) -> &[TraitSample] {
        &self.history
    }

    /// Blend toward `value` with weight `confidence`.
    ///
    /// `new = old * (1 - c) + value * c` with `c` clamped to `[0, 1]`, and the
    /// result clamped to `[0, 1]`. A non-finite confidence counts as 0 and a
    /// non-finite value leaves the trait where it is. Every call is recorded.
    pub fn update(&mut self, value: f64, confidence: f64) {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let old = self.value;
        let blended = if value.is_finite() {
            old * (1.0 - confidence) + value * confidence
        } else {
            old
        };
        self.value = clamp_unit(blended, old);

        self.history.push(TraitSample {
            timestamp: Utc::now(),
            value: self.value,
            change: Some(self.value - old),
            confidence: Some(confidence),
        });
    }
}

/// Clamp into `[0, 1]`, substituting `fallback` for NaN.
fn clamp_unit(value: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(0.0, 1.0)
    }
}
