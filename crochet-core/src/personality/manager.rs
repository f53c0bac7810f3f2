//! Registry of personality profiles for every character.

use super::analyzer::{TraitAnalyzer, TraitObservations};
use super::profile::PersonalityProfile;
use crate::persist::{PersistError, ProfileStore};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::{debug, info};

/// Holds at most one live profile per character, backed by a [`ProfileStore`].
///
/// Every stored profile is loaded when the manager is opened; characters seen
/// for the first time get a fresh default profile.
#[derive(Debug)]
pub struct PersonalityManager {
    store: ProfileStore,
    profiles: HashMap<String, PersonalityProfile>,
}

impl PersonalityManager {
    /// Open the manager and load every profile in the store.
    pub async fn open(store: ProfileStore) -> Result<Self, PersistError> {
        let profiles: HashMap<_, _> = store
            .load_all()
            .await?
            .into_iter()
            .map(|p| (p.character_id().to_string(), p))
            .collect();
        info!(count = profiles.len(), dir = %store.dir().display(), "loaded personality profiles");

        Ok(Self { store, profiles })
    }

    /// The backing store.
    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    /// Get a loaded profile without creating one.
    pub fn profile(&self, character_id: &str) -> Option<&PersonalityProfile> {
        self.profiles.get(character_id)
    }

    /// Characters with a live profile, sorted.
    pub fn character_ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.profiles.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Get a character's profile, loading or creating it on first access.
    pub async fn get_profile(
        &mut self,
        character_id: &str,
    ) -> Result<&mut PersonalityProfile, PersistError> {
        match self.profiles.entry(character_id.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let profile = match self.store.load(character_id).await? {
                    Some(profile) => profile,
                    None => {
                        info!(character = character_id, "creating personality profile");
                        PersonalityProfile::new(character_id)
                    }
                };
                Ok(entry.insert(profile))
            }
        }
    }

    /// Analyze a message and apply the observations to its character without
    /// saving.
    pub async fn evolve(
        &mut self,
        character_id: &str,
        content: &str,
        analyzer: &dyn TraitAnalyzer,
    ) -> Result<TraitObservations, PersistError> {
        let observations = analyzer.analyze(content);
        debug!(character = character_id, traits = observations.len(), "analyzed message");

        self.get_profile(character_id)
            .await?
            .apply_observations(&observations);
        Ok(observations)
    }

    /// Analyze a message, apply the observations to its character, and save.
    pub async fn update_personality(
        &mut self,
        character_id: &str,
        content: &str,
        analyzer: &dyn TraitAnalyzer,
    ) -> Result<TraitObservations, PersistError> {
        let observations = self.evolve(character_id, content, analyzer).await?;
        self.save_profile(character_id).await?;
        Ok(observations)
    }

    /// Save one profile, if it is loaded.
    pub async fn save_profile(&self, character_id: &str) -> Result<bool, PersistError> {
        match self.profiles.get(character_id) {
            Some(profile) => {
                self.store.save(profile).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Save every loaded profile.
    pub async fn save_profiles(&self) -> Result<(), PersistError> {
        for profile in self.profiles.values() {
            self.store.save(profile).await?;
        }
        Ok(())
    }
}
