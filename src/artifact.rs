// Artifact Store - lifecycle of persisted map artifacts
//
// The filesystem is the only index: an artifact exists iff a file named
// `{key}_map.html` exists in the artifact directory. Keys are validated
// before they ever touch a path, so removal can never escape the
// directory.

use crate::error::{MapError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Filename suffix every map artifact carries
pub const MAP_SUFFIX: &str = "_map.html";

/// A stored artifact as seen in a directory listing
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactEntry {
    /// Full filename, e.g. `alice_map.html`
    pub name: String,

    /// Last modification time, when the filesystem reports one
    pub modified: Option<DateTime<Utc>>,
}

/// Validate a caller-supplied artifact key. Conservative allow-list:
/// anything else (separators, `..`, empty) is rejected before path
/// construction.
pub fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(MapError::InvalidArtifactName(key.to_string()))
    }
}

/// Validate a full artifact filename: the `_map.html` suffix plus a
/// valid key in front of it.
pub fn validate_name(name: &str) -> Result<()> {
    match name.strip_suffix(MAP_SUFFIX) {
        Some(key) => validate_key(key),
        None => Err(MapError::InvalidArtifactName(name.to_string())),
    }
}

pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ArtifactStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path an artifact for `key` lives at (whether or not it exists)
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}{}", key, MAP_SUFFIX)))
    }

    /// Artifact filenames in the directory, sorted. A missing directory
    /// is an empty store, not an error.
    pub fn list(&self) -> Vec<String> {
        self.entries().into_iter().map(|entry| entry.name).collect()
    }

    /// Like `list`, with modification times for display
    pub fn entries(&self) -> Vec<ArtifactEntry> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(_) => return Vec::new(),
        };

        let mut entries: Vec<ArtifactEntry> = read_dir
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?.to_string();
                if !name.ends_with(MAP_SUFFIX) {
                    return None;
                }
                let modified = entry
                    .metadata()
                    .ok()
                    .and_then(|meta| meta.modified().ok())
                    .map(DateTime::<Utc>::from);
                Some(ArtifactEntry { name, modified })
            })
            .collect();

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    /// Delete the named artifact. `ArtifactNotFound` if it does not
    /// exist; the directory is left unchanged on any failure.
    pub fn remove(&self, name: &str) -> Result<()> {
        validate_name(name)?;

        let path = self.dir.join(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(MapError::ArtifactNotFound(name.to_string()))
            }
            Err(e) => Err(MapError::Io(e)),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
