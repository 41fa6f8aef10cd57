// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod deck;
pub mod document;
pub mod match_record;
pub mod stats;
pub mod user;

pub use deck::{DeckClass, DeckType, DeckValidationError};
pub use document::{CorruptionError, ExportDocument, UserDocument};
pub use match_record::{MatchRecord, MatchResult};
pub use stats::{MatchStats, StatsDashboard};
pub use user::sanitize_user_key;
