//! Session configuration.

use crate::error::{Error, Result};
use crate::personality::DEFAULT_CONFIDENCE;
use std::path::PathBuf;

/// Environment variable overriding [`CrochetConfig::thread_dir`].
pub const THREAD_DIR_VAR: &str = "CROCHET_THREAD_DIR";
/// Environment variable overriding [`CrochetConfig::personality_dir`].
pub const PERSONALITY_DIR_VAR: &str = "CROCHET_PERSONALITY_DIR";
/// Environment variable overriding [`CrochetConfig::default_confidence`].
pub const DEFAULT_CONFIDENCE_VAR: &str = "CROCHET_DEFAULT_CONFIDENCE";

/// Where a session keeps its documents and how strongly it learns.
#[derive(Debug, Clone, PartialEq)]
pub struct CrochetConfig {
    /// Directory of thread documents.
    pub thread_dir: PathBuf,

    /// Directory of personality documents.
    pub personality_dir: PathBuf,

    /// Confidence applied to every keyword observation.
    pub default_confidence: f64,
}

impl CrochetConfig {
    /// Defaults: `threads/`, `personalities/`, confidence 0.1.
    pub fn new() -> Self {
        Self {
            thread_dir: PathBuf::from("threads"),
            personality_dir: PathBuf::from("personalities"),
            default_confidence: DEFAULT_CONFIDENCE,
        }
    }

    /// Defaults overridden by whichever `CROCHET_*` variables are set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::new();
        if let Some(dir) = lookup(THREAD_DIR_VAR) {
            config.thread_dir = dir.into();
        }
        if let Some(dir) = lookup(PERSONALITY_DIR_VAR) {
            config.personality_dir = dir.into();
        }
        if let Some(raw) = lookup(DEFAULT_CONFIDENCE_VAR) {
            let confidence: f64 = raw
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("{DEFAULT_CONFIDENCE_VAR} is not a number: '{raw}'")))?;
            if !(0.0..=1.0).contains(&confidence) {
                return Err(Error::Config(format!(
                    "{DEFAULT_CONFIDENCE_VAR} must be within [0, 1], got {confidence}"
                )));
            }
            config.default_confidence = confidence;
        }
        Ok(config)
    }

    /// Set the thread directory.
    pub fn with_thread_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.thread_dir = dir.into();
        self
    }

    /// Set the personality directory.
    pub fn with_personality_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.personality_dir = dir.into();
        self
    }

    /// Set the observation confidence.
    pub fn with_default_confidence(mut self, confidence: f64) -> Self {
        self.default_confidence = confidence;
        self
    }

    /// Put both directories under one root.
    pub fn with_root(self, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        self.with_thread_dir(root.join("threads"))
            .with_personality_dir(root.join("personalities"))
    }
}

impl Default for CrochetConfig {
    fn default() -> Self {
        Self::new()
    }
}
