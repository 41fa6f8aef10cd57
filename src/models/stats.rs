//! Win/loss aggregation over match records.
//!
//! Everything here is a pure function of the match sequence it is given;
//! callers pick the scope (deck, opponent class) beforehand.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::deck::{group_by_class, ClassGroup};
use crate::models::{DeckClass, MatchRecord, UserDocument};

/// Decks need this many matches to be preferred in the win-rate ranking.
pub const MIN_RANKED_MATCHES: u32 = 3;

/// Number of decks in the dashboard ranking.
pub const DEFAULT_TOP_K: usize = 3;

/// Label shown when the stats scope is every match.
pub const ALL_SCOPE_LABEL: &str = "all";

/// Totals for a set of matches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MatchStats {
    pub total: u32,
    pub wins: u32,
    pub losses: u32,
    /// Percentage rounded to one decimal (ties to even); 0.0 when empty
    pub win_rate_percent: f64,
}

impl Default for MatchStats {
    fn default() -> Self {
        Self {
            total: 0,
            wins: 0,
            losses: 0,
            win_rate_percent: 0.0,
        }
    }
}

/// One row of a per-deck table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeckStatsRow {
    pub deck: String,
    #[serde(flatten)]
    #[cfg_attr(feature = "binding-generation", ts(flatten))]
    pub stats: MatchStats,
}

/// Count wins and losses and derive the win rate.
pub fn compute_stats<'a, I>(matches: I) -> MatchStats
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    let (total, wins) = matches.into_iter().fold((0u32, 0u32), |(total, wins), m| {
        (total + 1, wins + u32::from(m.is_win()))
    });

    let win_rate_percent = if total > 0 {
        round_one_decimal(f64::from(wins) / f64::from(total) * 100.0)
    } else {
        0.0
    };

    MatchStats {
        total,
        wins,
        losses: total - wins,
        win_rate_percent,
    }
}

/// Round a non-negative value to one decimal place.
///
/// Rounding is decided on the exact binary value of `x`, ties to even, so
/// 28.749999999999996 (23/80 of 100) gives 28.7 and 6.25 gives 6.2.
fn round_one_decimal(x: f64) -> f64 {
    if !x.is_finite() || x <= 0.0 {
        return x.max(0.0);
    }

    // x = mantissa * 2^exp exactly
    let bits = x.to_bits();
    let biased_exp = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exp) = if biased_exp == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased_exp - 1075)
    };
    if exp >= 0 {
        return x;
    }

    let shift = exp.unsigned_abs();
    // mantissa * 10 < 2^57, so below this the tenths round to zero
    if shift > 57 {
        return 0.0;
    }

    let scaled = mantissa * 10;
    let mut tenths = scaled >> shift;
    let remainder = scaled & ((1u64 << shift) - 1);
    let half = 1u64 << (shift - 1);
    if remainder > half || (remainder == half && tenths % 2 == 1) {
        tenths += 1;
    }
    tenths as f64 / 10.0
}

/// Current winning streak: consecutive wins from the front (newest) of the
/// sequence.
pub fn compute_win_streak<'a, I>(matches: I) -> u32
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    matches.into_iter().take_while(|m| m.is_win()).count() as u32
}

/// Group matches by a deck-name key into rows ordered by name.
fn rows_by<'a, I, F>(matches: I, key: F) -> Vec<DeckStatsRow>
where
    I: IntoIterator<Item = &'a MatchRecord>,
    F: Fn(&'a MatchRecord) -> &'a str,
{
    let mut groups: BTreeMap<&str, Vec<&MatchRecord>> = BTreeMap::new();
    for m in matches {
        groups.entry(key(m)).or_default().push(m);
    }

    groups
        .into_iter()
        .map(|(deck, ms)| DeckStatsRow {
            deck: deck.to_string(),
            stats: compute_stats(ms),
        })
        .collect()
}

fn by_total_then_rate(a: &DeckStatsRow, b: &DeckStatsRow) -> std::cmp::Ordering {
    b.stats.total.cmp(&a.stats.total).then_with(|| {
        b.stats
            .win_rate_percent
            .total_cmp(&a.stats.win_rate_percent)
    })
}

fn by_rate_then_total(a: &DeckStatsRow, b: &DeckStatsRow) -> std::cmp::Ordering {
    b.stats
        .win_rate_percent
        .total_cmp(&a.stats.win_rate_percent)
        .then_with(|| b.stats.total.cmp(&a.stats.total))
}

/// Per "my deck" totals, most-played first (ties: higher win rate first).
///
/// Decks come from the match log itself, so deleted decks with history
/// still show up. Full ties stay in name order.
pub fn build_deck_summary_table<'a, I>(matches: I) -> Vec<DeckStatsRow>
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    let mut rows = rows_by(matches, |m| m.my_deck.as_str());
    rows.sort_by(by_total_then_rate);
    rows
}

/// Per opponent deck totals, best matchup first (ties: more games first).
pub fn build_opponent_table<'a, I>(matches: I) -> Vec<DeckStatsRow>
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    let mut rows = rows_by(matches, |m| m.opponent_deck.as_str());
    rows.sort_by(by_rate_then_total);
    rows
}

/// Top `k` decks by win rate.
///
/// Only decks with at least [`MIN_RANKED_MATCHES`] games are ranked, unless
/// no deck has that many, in which case every deck is.
pub fn top_k_by_win_rate<'a, I>(matches: I, k: usize) -> Vec<DeckStatsRow>
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    let all = build_deck_summary_table(matches);
    let (mut pool, small): (Vec<_>, Vec<_>) = all
        .into_iter()
        .partition(|row| row.stats.total >= MIN_RANKED_MATCHES);
    if pool.is_empty() {
        pool = small;
    }

    pool.sort_by(by_rate_then_total);
    pool.truncate(k);
    pool
}

/// Which matches the stats view looks at.
#[derive(Debug, Clone, Copy)]
pub struct StatsScope<'a> {
    /// Restrict to this "my deck" (empty = every deck)
    pub deck: &'a str,
    pub opponent_classes: &'a BTreeSet<DeckClass>,
}

impl<'a> StatsScope<'a> {
    pub fn from_document(doc: &'a UserDocument) -> Self {
        Self {
            deck: &doc.stats_filter,
            opponent_classes: &doc.opponent_class_filter,
        }
    }

    pub fn includes(&self, m: &MatchRecord) -> bool {
        (self.deck.is_empty() || m.my_deck == self.deck)
            && self.opponent_classes.contains(&m.opponent_deck_class)
    }

    /// Matching records, order preserved.
    pub fn apply<'m>(&self, matches: &'m [MatchRecord]) -> Vec<&'m MatchRecord> {
        matches.iter().filter(|m| self.includes(m)).collect()
    }
}

/// Everything the stats view shows, in one response.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StatsDashboard {
    /// Selected deck name, or "all"
    pub scope_label: String,
    pub scope_class: Option<DeckClass>,
    pub stats: MatchStats,
    pub win_streak: u32,
    /// Matchup table; only built when a deck scope is selected
    pub opponent_table: Option<Vec<DeckStatsRow>>,
    /// Ranking over every match, regardless of scope
    pub top_decks: Vec<DeckStatsRow>,
    pub deck_table: Vec<DeckStatsRow>,
    /// Catalog decks that appear in the log, offered as scope choices
    pub scope_choices: Vec<ClassGroup>,
}

impl StatsDashboard {
    pub fn build(doc: &UserDocument) -> Self {
        let scope = StatsScope::from_document(doc);
        let scoped = scope.apply(&doc.matches);

        let (scope_label, scope_class, opponent_table) = if doc.stats_filter.is_empty() {
            (ALL_SCOPE_LABEL.to_string(), None, None)
        } else {
            (
                doc.stats_filter.clone(),
                Some(doc.deck_class(&doc.stats_filter)),
                Some(build_opponent_table(scoped.iter().copied())),
            )
        };

        let played: BTreeSet<&str> = doc.matches.iter().map(|m| m.my_deck.as_str()).collect();
        let scope_choices =
            group_by_class(doc.deck_types.iter().filter(|d| played.contains(d.name.as_str())));

        Self {
            scope_label,
            scope_class,
            stats: compute_stats(scoped.iter().copied()),
            win_streak: compute_win_streak(scoped.iter().copied()),
            opponent_table,
            top_decks: top_k_by_win_rate(&doc.matches, DEFAULT_TOP_K),
            deck_table: build_deck_summary_table(&doc.matches),
            scope_choices,
        }
    }
}
