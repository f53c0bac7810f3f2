//! Per-character personality profiles.

use super::analyzer::TraitObservations;
use super::traits::{PersonalityTrait, DEFAULT_CONFIDENCE, DEFAULT_TRAITS, SEED_VALUE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The personality of one character.
///
/// Stored as `{character_id, created_at, last_updated, traits: [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalityProfile {
    character_id: String,
    created_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
    #[serde(with = "trait_list")]
    traits: BTreeMap<String, PersonalityTrait>,
}

impl PersonalityProfile {
    /// Create a profile seeded with the default traits.
    pub fn new(character_id: impl Into<String>) -> Self {
        Self::with_initial_traits(
            character_id,
            DEFAULT_TRAITS.iter().map(|name| (*name, SEED_VALUE)),
        )
    }

    /// Create a profile seeded with explicit trait values instead of the defaults.
    pub fn with_initial_traits<I, S>(character_id: impl Into<String>, initial: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let now = Utc::now();
        let traits = initial
            .into_iter()
            .map(|(name, value)| {
                let name = name.into();
                (name.clone(), PersonalityTrait::new(name, value))
            })
            .collect();

        Self {
            character_id: character_id.into(),
            created_at: now,
            last_updated: now,
            traits,
        }
    }

    /// The character this profile belongs to.
    pub fn character_id(&self) -> &str {
        &self.character_id
    }

    /// When the profile was first created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When a trait last changed.
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Get a trait by name.
    pub fn get(&self, name: &str) -> Option<&PersonalityTrait> {
        self.traits.get(name)
    }

    /// All traits, ordered by name.
    pub fn traits(&self) -> impl Iterator<Item = &PersonalityTrait> {
        self.traits.values()
    }

    /// Value of a trait, or the seed value if the profile has never seen it.
    pub fn get_trait(&self, name: &str) -> f64 {
        self.traits.get(name).map_or(SEED_VALUE, PersonalityTrait::value)
    }

    /// Update a trait, creating it at the seed value first if needed.
    pub fn update_trait(&mut self, name: &str, value: f64, confidence: f64) {
        self.traits
            .entry(name.to_string())
            .or_insert_with(|| PersonalityTrait::seeded(name))
            .update(value, confidence);
        self.last_updated = Utc::now();
    }

    /// Update a trait with the default confidence.
    pub fn nudge_trait(&mut self, name: &str, value: f64) {
        self.update_trait(name, value, DEFAULT_CONFIDENCE);
    }

    /// Apply every observation from an analyzer.
    pub fn apply_observations(&mut self, observations: &TraitObservations) {
        for (name, signal) in observations {
            self.update_trait(name, signal.value, signal.confidence);
        }
    }

    /// Values of the default traits in lexicographic name order.
    ///
    /// Always the same length, whatever traits the profile actually holds,
    /// so vectors of different characters can be compared directly.
    pub fn get_trait_vector(&self) -> Vec<f64> {
        let mut names = DEFAULT_TRAITS;
        names.sort_unstable();
        names.iter().map(|name| self.get_trait(name)).collect()
    }
}

/// Serialize the trait map as a list of traits.
mod trait_list {
    use super::PersonalityTrait;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        traits: &BTreeMap<String, PersonalityTrait>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(traits.values())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, PersonalityTrait>, D::Error> {
        let list = Vec::<PersonalityTrait>::deserialize(deserializer)?;
        Ok(list
            .into_iter()
            .map(|t| (t.name().to_string(), t))
            .collect())
    }
}
