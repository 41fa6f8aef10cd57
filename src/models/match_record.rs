// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Recorded match model.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::DeckClass;

/// Outcome of a single match, from "my deck"'s point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum MatchResult {
    Win,
    Loss,
}

/// A single recorded game.
///
/// The class fields are a snapshot of the catalog when the record was
/// created or last edited. They are not updated if the catalog changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MatchRecord {
    /// Creation time in milliseconds since the epoch; never changes
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    pub my_deck: String,
    pub my_deck_class: DeckClass,
    pub opponent_deck: String,
    pub opponent_deck_class: DeckClass,
    pub result: MatchResult,
    /// Creation time (ISO 8601, second precision)
    pub timestamp: String,
}

impl MatchRecord {
    pub fn is_win(&self) -> bool {
        self.result == MatchResult::Win
    }
}
