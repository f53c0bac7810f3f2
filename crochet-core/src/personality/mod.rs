//! Character personality evolution.
//!
//! Each character owns a [`PersonalityProfile`] of named traits in `[0, 1]`.
//! A [`TraitAnalyzer`] turns what the character says into observations, and
//! every observation blends the matching trait toward an observed value:
//!
//! ```text
//! new = old * (1 - confidence) + observed * confidence
//! ```
//!
//! Every update is kept in the trait's history. The [`PersonalityManager`]
//! owns the live profiles and writes them through a
//! [`ProfileStore`](crate::persist::ProfileStore).

mod analyzer;
mod manager;
mod profile;
mod traits;

pub use analyzer::{KeywordAnalyzer, TraitAnalyzer, TraitObservations, TraitSignal};
pub use manager::PersonalityManager;
pub use profile::PersonalityProfile;
pub use traits::{PersonalityTrait, TraitSample, DEFAULT_CONFIDENCE, DEFAULT_TRAITS, SEED_VALUE};
