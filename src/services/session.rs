// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user session state and its lifecycle.
//!
//! A [`Session`] owns one user's document plus a handle to the store. Each
//! command mutates the document in memory and then writes the whole
//! document back. Commands that turn out to be no-ops skip the write.
//!
//! Sessions are opened on login (or on the first request with a valid
//! token) and evicted on logout or after sitting idle, through the
//! [`SessionRegistry`]. Every mutation is persisted before it returns, so an
//! evicted session is simply reloaded from the store on the next request.
//! Each session sits behind its own async mutex, so one user's commands run
//! one at a time while different users never contend.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::Result;
use crate::models::{
    DeckClass, ExportDocument, MatchRecord, MatchResult, StatsDashboard, UserDocument,
};
use crate::store::Store;

/// Result of a mutating command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CommandOutcome {
    /// Whether the document changed
    pub changed: bool,
    /// Whether the change reached the store
    pub saved: bool,
    /// User-facing message when a remote save gave up
    pub warning: Option<String>,
}

impl CommandOutcome {
    fn unchanged() -> Self {
        Self {
            changed: false,
            saved: false,
            warning: None,
        }
    }
}

/// One user's live state.
pub struct Session {
    user_key: String,
    doc: UserDocument,
    store: Store,
}

impl Session {
    /// Load the user's document (or defaults) and start a session.
    pub async fn open(user_key: &str, store: Store) -> Self {
        let doc = store.load_or_default(user_key).await;
        Self::with_document(user_key, doc, store)
    }

    pub fn with_document(user_key: &str, doc: UserDocument, store: Store) -> Self {
        Self {
            user_key: user_key.to_string(),
            doc,
            store,
        }
    }

    pub fn user_key(&self) -> &str {
        &self.user_key
    }

    pub fn document(&self) -> &UserDocument {
        &self.doc
    }

    pub fn dashboard(&self) -> StatsDashboard {
        StatsDashboard::build(&self.doc)
    }

    pub fn export(&self) -> ExportDocument {
        ExportDocument::new(&self.user_key, &self.doc)
    }

    async fn persist(&self) -> Result<CommandOutcome> {
        let status = self.store.save(&self.user_key, &self.doc).await?;
        if let Some(warning) = status.warning() {
            tracing::warn!(user_key = %self.user_key, %warning, "Document not persisted");
        }

        Ok(CommandOutcome {
            changed: true,
            saved: status.is_saved(),
            warning: status.warning(),
        })
    }

    async fn persist_if(&self, changed: bool) -> Result<CommandOutcome> {
        if changed {
            self.persist().await
        } else {
            Ok(CommandOutcome::unchanged())
        }
    }

    // ─── Selection ───────────────────────────────────────────────

    pub async fn select_my_deck(&mut self, name: &str) -> Result<CommandOutcome> {
        self.doc.select_my_deck(name);
        self.persist().await
    }

    pub async fn select_opponent(&mut self, name: &str) -> Result<CommandOutcome> {
        self.doc.select_opponent(name);
        self.persist().await
    }

    // ─── Matches ─────────────────────────────────────────────────

    pub async fn record_match(&mut self, result: MatchResult) -> Result<CommandOutcome> {
        self.record_match_at(result, Utc::now()).await
    }

    /// Record a match as of `now`. Does nothing unless both decks are
    /// selected.
    pub async fn record_match_at(
        &mut self,
        result: MatchResult,
        now: DateTime<Utc>,
    ) -> Result<CommandOutcome> {
        let Some(record) = self.doc.record_match(result, now) else {
            tracing::debug!(user_key = %self.user_key, "Record ignored, selection incomplete");
            return Ok(CommandOutcome::unchanged());
        };
        tracing::info!(
            user_key = %self.user_key,
            id = record.id,
            my_deck = %record.my_deck,
            opponent_deck = %record.opponent_deck,
            "Match recorded"
        );
        self.persist().await
    }

    pub async fn edit_match(
        &mut self,
        id: i64,
        my_deck: &str,
        opponent_deck: &str,
        result: MatchResult,
    ) -> Result<CommandOutcome> {
        let changed = self.doc.edit_match(id, my_deck, opponent_deck, result);
        self.persist_if(changed).await
    }

    pub async fn delete_match(&mut self, id: i64) -> Result<CommandOutcome> {
        let changed = self.doc.delete_match(id);
        self.persist_if(changed).await
    }

    pub fn recent_matches(&self, limit: usize) -> &[MatchRecord] {
        self.doc.recent_matches(limit)
    }

    // ─── Catalog ─────────────────────────────────────────────────

    /// Add a deck; validation failures leave the document untouched.
    pub async fn add_deck(&mut self, name: &str, class_code: &str) -> Result<CommandOutcome> {
        self.doc.add_deck(name, class_code)?;
        self.persist().await
    }

    pub async fn delete_deck(&mut self, name: &str) -> Result<CommandOutcome> {
        let changed = self.doc.delete_deck(name);
        self.persist_if(changed).await
    }

    // ─── Stats scope ─────────────────────────────────────────────

    pub async fn set_stats_filter(&mut self, deck: &str) -> Result<CommandOutcome> {
        self.doc.set_stats_filter(deck);
        self.persist().await
    }

    pub async fn set_opponent_class_filter(
        &mut self,
        classes: BTreeSet<DeckClass>,
    ) -> Result<CommandOutcome> {
        self.doc.set_opponent_class_filter(classes);
        self.persist().await
    }
}

/// Shared handle to one user's session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// How often idle sessions are looked for.
pub const IDLE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

struct OpenSession {
    handle: SessionHandle,
    last_used: Instant,
}

/// Live sessions keyed by sanitized user key.
pub struct SessionRegistry {
    store: Store,
    sessions: DashMap<String, OpenSession>,
}

impl SessionRegistry {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            sessions: DashMap::new(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Open a session, loading the user's document. An already-open session
    /// for the same key is returned as is.
    pub async fn open(&self, user_key: &str) -> SessionHandle {
        if let Some(existing) = self.get(user_key) {
            return existing;
        }

        // Load outside the map so no shard lock is held across the await
        let session = Session::open(user_key, self.store.clone()).await;
        let handle = {
            let mut entry = self
                .sessions
                .entry(user_key.to_string())
                .or_insert_with(|| OpenSession {
                    handle: Arc::new(Mutex::new(session)),
                    last_used: Instant::now(),
                });
            entry.last_used = Instant::now();
            entry.handle.clone()
        };

        tracing::info!(user_key, open_sessions = self.sessions.len(), "Session opened");
        handle
    }

    /// Look up an open session, marking it as used.
    pub fn get(&self, user_key: &str) -> Option<SessionHandle> {
        self.sessions.get_mut(user_key).map(|mut entry| {
            entry.last_used = Instant::now();
            entry.handle.clone()
        })
    }

    /// Evict a session. Returns `false` if none was open.
    pub fn close(&self, user_key: &str) -> bool {
        let removed = self.sessions.remove(user_key).is_some();
        if removed {
            tracing::info!(user_key, "Session closed");
        }
        removed
    }

    /// Evict sessions unused for at least `max_idle`. Sessions a request
    /// is still holding are kept. Returns how many were evicted.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut evicted = 0;
        self.sessions.retain(|user_key, open| {
            let keep =
                open.last_used.elapsed() < max_idle || Arc::strong_count(&open.handle) > 1;
            if !keep {
                tracing::info!(user_key = %user_key, "Idle session evicted");
                evicted += 1;
            }
            keep
        });
        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
