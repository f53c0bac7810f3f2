//! JSON document storage for threads and personality profiles.
//!
//! Each thread and each profile is one pretty-printed JSON file named after
//! its key. Saves overwrite the whole file; loads replace the whole object.

use crate::graph::{CrochetThread, ThreadDocument};
use crate::personality::PersonalityProfile;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed document '{key}': {reason}")]
    Malformed { key: String, reason: String },

    #[error("No stored document for '{0}'")]
    NotFound(String),
}

/// File path for a stored key.
///
/// Bytes outside `[A-Za-z0-9_-]` are written as `%XX`, so distinct keys never
/// share a file.
pub fn document_path(dir: impl AsRef<Path>, key: &str) -> PathBuf {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    dir.as_ref().join(format!("{encoded}.json"))
}

/// Inverse of the file name encoding in [`document_path`].
fn decode_key(stem: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(stem.len());
    let mut rest = stem.as_bytes();
    while let Some((&byte, tail)) = rest.split_first() {
        if byte == b'%' {
            let hex = tail.get(..2)?;
            let hex = std::str::from_utf8(hex).ok()?;
            bytes.push(u8::from_str_radix(hex, 16).ok()?);
            rest = &tail[2..];
        } else {
            bytes.push(byte);
            rest = tail;
        }
    }
    String::from_utf8(bytes).ok()
}

fn check_key(key: &str, stored: &str) -> Result<(), PersistError> {
    if key == stored {
        Ok(())
    } else {
        Err(PersistError::Malformed {
            key: key.to_string(),
            reason: format!("document belongs to '{stored}'"),
        })
    }
}

async fn write_document<T: Serialize>(dir: &Path, key: &str, value: &T) -> Result<PathBuf, PersistError> {
    fs::create_dir_all(dir).await?;
    let path = document_path(dir, key);
    let content = serde_json::to_string_pretty(value)?;
    fs::write(&path, content).await?;
    Ok(path)
}

/// Read and parse a document, or `None` when no file exists.
async fn read_document<T: DeserializeOwned>(dir: &Path, key: &str) -> Result<Option<T>, PersistError> {
    let path = document_path(dir, key);
    let content = match fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| PersistError::Malformed {
            key: key.to_string(),
            reason: e.to_string(),
        })
}

/// Keys of every `.json` document in `dir`, sorted. A missing directory is empty.
async fn list_keys(dir: &Path) -> Result<Vec<String>, PersistError> {
    let mut keys = Vec::new();
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(keys),
        Err(e) => return Err(e.into()),
    };

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_json = path.extension().map(|e| e == "json").unwrap_or(false);
        match path.file_stem().and_then(|s| s.to_str()).and_then(decode_key) {
            Some(key) if is_json => keys.push(key),
            _ => warn!(path = %path.display(), "ignoring non-document entry"),
        }
    }

    keys.sort();
    Ok(keys)
}

// ============================================================================
// Threads
// ============================================================================

/// Directory of thread documents, one file per thread id.
#[derive(Debug, Clone)]
pub struct ThreadStore {
    dir: PathBuf,
}

impl ThreadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the whole thread, replacing any previous document.
    pub async fn save(&self, thread: &CrochetThread) -> Result<(), PersistError> {
        let path = write_document(&self.dir, thread.thread_id(), &thread.to_document()).await?;
        info!(
            thread = thread.thread_id(),
            nodes = thread.node_count(),
            edges = thread.edge_count(),
            path = %path.display(),
            "saved thread"
        );
        Ok(())
    }

    /// Load a thread. Fails with [`PersistError::NotFound`] when nothing is stored.
    pub async fn load(&self, thread_id: &str) -> Result<CrochetThread, PersistError> {
        let doc: ThreadDocument = read_document(&self.dir, thread_id)
            .await?
            .ok_or_else(|| PersistError::NotFound(thread_id.to_string()))?;
        check_key(thread_id, &doc.thread_id)?;
        let thread = CrochetThread::from_document(doc)?;
        info!(thread = thread_id, nodes = thread.node_count(), "loaded thread");
        Ok(thread)
    }

    /// Load a thread, or start an empty one when nothing is stored yet.
    pub async fn load_or_create(&self, thread_id: &str, name: &str) -> Result<CrochetThread, PersistError> {
        match self.load(thread_id).await {
            Err(PersistError::NotFound(_)) => {
                debug!(thread = thread_id, "starting new thread");
                Ok(CrochetThread::new(thread_id, name))
            }
            other => other,
        }
    }

    pub async fn exists(&self, thread_id: &str) -> Result<bool, PersistError> {
        Ok(fs::try_exists(document_path(&self.dir, thread_id)).await?)
    }

    /// Stored document keys, sorted.
    pub async fn list(&self) -> Result<Vec<String>, PersistError> {
        list_keys(&self.dir).await
    }
}

// ============================================================================
// Profiles
// ============================================================================

/// Directory of personality documents, one file per character id.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn save(&self, profile: &PersonalityProfile) -> Result<(), PersistError> {
        let path = write_document(&self.dir, profile.character_id(), profile).await?;
        info!(character = profile.character_id(), path = %path.display(), "saved personality");
        Ok(())
    }

    /// Load one profile, or `None` when the character has never been saved.
    pub async fn load(&self, character_id: &str) -> Result<Option<PersonalityProfile>, PersistError> {
        let profile: Option<PersonalityProfile> = read_document(&self.dir, character_id).await?;
        if let Some(profile) = &profile {
            check_key(character_id, profile.character_id())?;
        }
        Ok(profile)
    }

    /// Load every stored profile, ordered by file key.
    pub async fn load_all(&self) -> Result<Vec<PersonalityProfile>, PersistError> {
        let mut profiles = Vec::new();
        for key in list_keys(&self.dir).await? {
            if let Some(profile) = self.load(&key).await? {
                profiles.push(profile);
            }
        }
        Ok(profiles)
    }
}
