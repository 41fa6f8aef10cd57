// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Document storage: one JSON document per user key.
//!
//! Two backends share the same contract. Loading never fails from the
//! caller's point of view (missing or unusable documents become defaults);
//! saving reports remote failures as a status instead of an error.

pub mod github;
pub mod local;

pub use github::GithubStore;
pub use local::LocalStore;

use crate::config::StoreConfig;
use crate::models::UserDocument;

/// Storage backend.
#[derive(Debug, Clone)]
pub enum Store {
    Local(LocalStore),
    Github(GithubStore),
}

/// Outcome of persisting a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    /// The remote store gave up; `status` is the last HTTP code seen
    Failed { status: Option<u16> },
}

impl SaveStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveStatus::Saved)
    }

    /// User-facing warning for a failed save.
    pub fn warning(&self) -> Option<String> {
        match self {
            SaveStatus::Saved => None,
            SaveStatus::Failed { status: Some(code) } => {
                Some(format!("Failed to save to remote store (HTTP {})", code))
            }
            SaveStatus::Failed { status: None } => {
                Some("Failed to save to remote store (HTTP status unknown)".to_string())
            }
        }
    }
}

/// Storage errors that abort the current command.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Failed to encode document: {0}")]
    Encode(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl Store {
    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        match config {
            StoreConfig::Local { data_dir } => Ok(Store::Local(LocalStore::new(data_dir.clone()))),
            StoreConfig::Github(github) => Ok(Store::Github(GithubStore::new(github)?)),
        }
    }

    /// Load a user's document, substituting defaults when it is absent or
    /// unusable.
    pub async fn load_or_default(&self, user_key: &str) -> UserDocument {
        match self {
            Store::Local(local) => match local.load(user_key).await {
                Ok(Some(doc)) => doc,
                Ok(None) => {
                    tracing::info!(user_key, "No stored document, starting from defaults");
                    UserDocument::default()
                }
                Err(e) => {
                    tracing::warn!(user_key, error = %e, "Stored document unusable, resetting to defaults");
                    UserDocument::default()
                }
            },
            Store::Github(github) => {
                let path = github.path_for(user_key);
                let Some(value) = github.read_json(&path).await else {
                    tracing::info!(user_key, path = %path, "No remote document, starting from defaults");
                    return UserDocument::default();
                };
                UserDocument::from_json(value).unwrap_or_else(|e| {
                    tracing::warn!(user_key, error = %e, "Remote document unusable, resetting to defaults");
                    UserDocument::default()
                })
            }
        }
    }

    /// Persist a user's whole document.
    ///
    /// Local write failures are errors; remote failures come back as
    /// [`SaveStatus::Failed`] after the remote store's retries.
    pub async fn save(&self, user_key: &str, doc: &UserDocument) -> Result<SaveStatus, StoreError> {
        match self {
            Store::Local(local) => {
                local.save(user_key, doc).await?;
                Ok(SaveStatus::Saved)
            }
            Store::Github(github) => {
                let path = github.path_for(user_key);
                let message = format!("update tracker data for {}", user_key);
                Ok(github.write_json(&path, doc, &message).await)
            }
        }
    }
}
