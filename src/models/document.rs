// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Per-user tracker document and the commands that mutate it.
//!
//! The document is the unit of persistence: every command rewrites the
//! whole thing. Commands here are pure state transitions; persisting the
//! result is the session's job.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::deck::{default_catalog, group_by_class, ClassGroup, DeckValidationError};
use crate::models::{DeckClass, DeckType, MatchRecord, MatchResult};
use crate::time_utils::{format_utc_rfc3339, next_match_id};

/// Number of matches shown in the editable history list.
pub const RECENT_HISTORY_LEN: usize = 10;

/// Everything stored for one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserDocument {
    pub deck_types: Vec<DeckType>,
    /// Selected "my deck" (empty = none)
    pub my_deck: String,
    /// Selected opponent deck (empty = none)
    pub current_opponent: String,
    /// Match log, newest first
    pub matches: Vec<MatchRecord>,
    /// Deck name the stats view is scoped to (empty = all matches)
    #[serde(rename = "stats_mydeck_filter")]
    pub stats_filter: String,
    /// Opponent classes included in scoped stats
    #[serde(rename = "opp_class_filter")]
    pub opponent_class_filter: BTreeSet<DeckClass>,
}

impl Default for UserDocument {
    fn default() -> Self {
        Self {
            deck_types: default_catalog(),
            my_deck: String::new(),
            current_opponent: String::new(),
            matches: Vec::new(),
            stats_filter: String::new(),
            opponent_class_filter: DeckClass::ALL.into_iter().collect(),
        }
    }
}

/// A stored document that exists but cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum CorruptionError {
    #[error("Failed to read stored document: {0}")]
    Unreadable(String),

    #[error("Malformed stored document: {0}")]
    Malformed(String),
}

impl UserDocument {
    /// Build a document from stored JSON, merging key by key over defaults.
    ///
    /// Missing keys and scalar keys of the wrong type take their default, as
    /// do `deck_types`/`matches` values that are not arrays. Entries inside
    /// those arrays are decoded one at a time: class codes that are missing
    /// or unknown are repaired, and only entries that still cannot be read
    /// are dropped. A top-level value that is not an object is corruption.
    pub fn from_json(value: Value) -> Result<Self, CorruptionError> {
        let Value::Object(mut map) = value else {
            return Err(CorruptionError::Malformed(
                "top-level value is not an object".to_string(),
            ));
        };

        let mut doc = Self::default();

        if let Some(Value::Array(entries)) = map.remove("deck_types") {
            doc.deck_types = decode_entries("deck_types", entries, repair_deck_entry);
        }
        if let Some(Value::Array(entries)) = map.remove("matches") {
            let matches = decode_entries("matches", entries, |fields| {
                repair_match_entry(&doc, fields)
            });
            doc.matches = matches;
        }
        if let Some(Value::String(s)) = map.remove("my_deck") {
            doc.my_deck = s;
        }
        if let Some(Value::String(s)) = map.remove("current_opponent") {
            doc.current_opponent = s;
        }
        if let Some(Value::String(s)) = map.remove("stats_mydeck_filter") {
            doc.stats_filter = s;
        }
        if let Some(Value::Array(codes)) = map.remove("opp_class_filter") {
            // Unknown codes are dropped rather than failing the whole load
            doc.opponent_class_filter = codes
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|code| code.parse().ok())
                .collect();
        }

        Ok(doc)
    }

    // ─── Lookups ─────────────────────────────────────────────────

    pub fn deck(&self, name: &str) -> Option<&DeckType> {
        self.deck_types.iter().find(|d| d.name == name)
    }

    /// Current class of a catalog deck; decks not in the catalog count as `E`.
    pub fn deck_class(&self, name: &str) -> DeckClass {
        self.deck(name).map(|d| d.class).unwrap_or(DeckClass::Elf)
    }

    pub fn grouped_decks(&self) -> Vec<ClassGroup> {
        group_by_class(&self.deck_types)
    }

    pub fn recent_matches(&self, limit: usize) -> &[MatchRecord] {
        &self.matches[..limit.min(self.matches.len())]
    }

    // ─── Selection ───────────────────────────────────────────────

    /// Select "my deck". Any opponent selection is cleared.
    pub fn select_my_deck(&mut self, name: &str) {
        self.my_deck = name.to_string();
        self.current_opponent.clear();
    }

    pub fn select_opponent(&mut self, name: &str) {
        self.current_opponent = name.to_string();
    }

    // ─── Matches ─────────────────────────────────────────────────

    /// Record a result for the current selections.
    ///
    /// Returns `None` without touching anything unless both decks are
    /// selected. The new record goes to the front of the log and the
    /// opponent selection is cleared; "my deck" stays selected.
    pub fn record_match(&mut self, result: MatchResult, now: DateTime<Utc>) -> Option<&MatchRecord> {
        if self.my_deck.is_empty() || self.current_opponent.is_empty() {
            return None;
        }

        let newest_id = self.matches.first().map(|m| m.id);
        let record = MatchRecord {
            id: next_match_id(now, newest_id),
            my_deck: self.my_deck.clone(),
            my_deck_class: self.deck_class(&self.my_deck),
            opponent_deck: self.current_opponent.clone(),
            opponent_deck_class: self.deck_class(&self.current_opponent),
            result,
            timestamp: format_utc_rfc3339(now),
        };

        self.matches.insert(0, record);
        self.current_opponent.clear();
        self.matches.first()
    }

    /// Rewrite a match's decks and result, re-snapshotting both classes.
    ///
    /// Id, timestamp and position are kept. Returns `false` if no match has
    /// that id.
    pub fn edit_match(
        &mut self,
        id: i64,
        my_deck: &str,
        opponent_deck: &str,
        result: MatchResult,
    ) -> bool {
        let my_deck_class = self.deck_class(my_deck);
        let opponent_deck_class = self.deck_class(opponent_deck);

        let Some(record) = self.matches.iter_mut().find(|m| m.id == id) else {
            return false;
        };

        record.my_deck = my_deck.to_string();
        record.my_deck_class = my_deck_class;
        record.opponent_deck = opponent_deck.to_string();
        record.opponent_deck_class = opponent_deck_class;
        record.result = result;
        true
    }

    /// Remove a match. Returns `false` if no match has that id.
    pub fn delete_match(&mut self, id: i64) -> bool {
        let before = self.matches.len();
        self.matches.retain(|m| m.id != id);
        self.matches.len() != before
    }

    // ─── Catalog ─────────────────────────────────────────────────

    /// Add a deck to the catalog. The name is trimmed first.
    pub fn add_deck(&mut self, name: &str, class_code: &str) -> Result<(), DeckValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DeckValidationError::EmptyName);
        }
        if self.deck(name).is_some() {
            return Err(DeckValidationError::DuplicateName(name.to_string()));
        }
        let class: DeckClass = class_code.parse()?;

        self.deck_types.push(DeckType::new(name, class));
        Ok(())
    }

    /// Remove a deck from the catalog and from the current selections.
    ///
    /// Matches that reference the deck are left alone. Returns `true` if
    /// anything changed.
    pub fn delete_deck(&mut self, name: &str) -> bool {
        let before = self.deck_types.len();
        self.deck_types.retain(|d| d.name != name);
        let mut changed = self.deck_types.len() != before;

        if self.my_deck == name {
            self.my_deck.clear();
            changed = true;
        }
        if self.current_opponent == name {
            self.current_opponent.clear();
            changed = true;
        }
        changed
    }

    // ─── Stats scope ─────────────────────────────────────────────

    pub fn set_stats_filter(&mut self, deck: &str) {
        self.stats_filter = deck.to_string();
    }

    pub fn set_opponent_class_filter(&mut self, classes: BTreeSet<DeckClass>) {
        self.opponent_class_filter = classes;
    }
}

/// Decode each array entry on its own, fixing it up first with `repair`.
fn decode_entries<T, F>(key: &str, entries: Vec<Value>, mut repair: F) -> Vec<T>
where
    T: DeserializeOwned,
    F: FnMut(&mut Map<String, Value>),
{
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let Value::Object(mut fields) = entry else {
                tracing::warn!(key, index, "Dropping stored entry that is not an object");
                return None;
            };
            repair(&mut fields);
            serde_json::from_value(Value::Object(fields))
                .map_err(|e| {
                    tracing::warn!(key, index, error = %e, "Dropping unreadable stored entry");
                })
                .ok()
        })
        .collect()
}

fn is_class_code(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|code| code.parse::<DeckClass>().is_ok())
}

fn set_class(fields: &mut Map<String, Value>, key: &str, class: DeckClass) {
    fields.insert(key.to_string(), Value::String(class.code().to_string()));
}

/// Catalog entries with a missing or unknown class become `E`.
fn repair_deck_entry(fields: &mut Map<String, Value>) {
    if !is_class_code(fields.get("class")) {
        set_class(fields, "class", DeckClass::Elf);
    }
}

/// Fill in what older match records may lack.
///
/// Missing deck names become empty, a missing timestamp becomes empty, and
/// a missing or unknown class snapshot is taken from `doc`'s catalog.
fn repair_match_entry(doc: &UserDocument, fields: &mut Map<String, Value>) {
    for key in ["my_deck", "opponent_deck", "timestamp"] {
        if !fields.get(key).is_some_and(Value::is_string) {
            fields.insert(key.to_string(), Value::String(String::new()));
        }
    }

    for (deck_key, class_key) in [
        ("my_deck", "my_deck_class"),
        ("opponent_deck", "opponent_deck_class"),
    ] {
        if !is_class_code(fields.get(class_key)) {
            let deck = fields.get(deck_key).and_then(Value::as_str).unwrap_or("");
            let class = doc.deck_class(deck);
            set_class(fields, class_key, class);
        }
    }
}

/// Downloadable export: catalog and match log only.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportDocument {
    pub user_id: String,
    pub deck_types: Vec<DeckType>,
    pub matches: Vec<MatchRecord>,
}

impl ExportDocument {
    pub fn new(user_key: &str, doc: &UserDocument) -> Self {
        Self {
            user_id: user_key.to_string(),
            deck_types: doc.deck_types.clone(),
            matches: doc.matches.clone(),
        }
    }

    /// File name offered for the download.
    pub fn file_name(user_key: &str) -> String {
        format!("match_tracker_{}.json", user_key)
    }
}
