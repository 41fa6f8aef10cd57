// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local-disk document store: one pretty-printed JSON file per user.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::models::{CorruptionError, UserDocument};
use crate::store::StoreError;

/// Stores each user's document at `{data_dir}/tracker_{key}.json`.
///
/// There is no locking; a key must have a single writer.
#[derive(Debug, Clone)]
pub struct LocalStore {
    data_dir: PathBuf,
}

impl LocalStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path_for(&self, user_key: &str) -> PathBuf {
        self.data_dir.join(format!("tracker_{}.json", user_key))
    }

    /// Load a user's document.
    ///
    /// `Ok(None)` when no file exists; `Err` when one exists but cannot be
    /// read or decoded. Callers decide whether to fall back to defaults.
    pub async fn load(&self, user_key: &str) -> Result<Option<UserDocument>, CorruptionError> {
        let path = self.path_for(user_key);

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CorruptionError::Unreadable(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let value = serde_json::from_str(&raw)
            .map_err(|e| CorruptionError::Malformed(format!("{}: {}", path.display(), e)))?;
        UserDocument::from_json(value).map(Some)
    }

    /// Overwrite a user's document.
    pub async fn save(&self, user_key: &str, doc: &UserDocument) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {}", self.data_dir.display(), e)))?;

        let path = self.path_for(user_key);
        let body = serde_json::to_string_pretty(doc)
            .map_err(|e| StoreError::Encode(e.to_string()))?;

        tokio::fs::write(&path, body)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(path = %path.display(), "Saved document");
        Ok(())
    }
}
