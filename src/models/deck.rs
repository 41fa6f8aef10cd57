// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Deck classes and the deck catalog.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One of the seven fixed deck classes.
///
/// Variant order is the display order used everywhere decks are grouped,
/// so `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum DeckClass {
    #[serde(rename = "E")]
    Elf,
    #[serde(rename = "R")]
    Royal,
    #[serde(rename = "D")]
    Dragon,
    #[serde(rename = "W")]
    Witch,
    #[serde(rename = "Ni")]
    Nightmare,
    #[serde(rename = "B")]
    Bishop,
    #[serde(rename = "Nm")]
    Nemesis,
}

impl DeckClass {
    /// All classes in display order.
    pub const ALL: [DeckClass; 7] = [
        DeckClass::Elf,
        DeckClass::Royal,
        DeckClass::Dragon,
        DeckClass::Witch,
        DeckClass::Nightmare,
        DeckClass::Bishop,
        DeckClass::Nemesis,
    ];

    /// Short code used in stored documents ("E", "Ni", ...).
    pub fn code(self) -> &'static str {
        match self {
            DeckClass::Elf => "E",
            DeckClass::Royal => "R",
            DeckClass::Dragon => "D",
            DeckClass::Witch => "W",
            DeckClass::Nightmare => "Ni",
            DeckClass::Bishop => "B",
            DeckClass::Nemesis => "Nm",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            DeckClass::Elf => "Elf",
            DeckClass::Royal => "Royal",
            DeckClass::Dragon => "Dragon",
            DeckClass::Witch => "Witch",
            DeckClass::Nightmare => "Nightmare",
            DeckClass::Bishop => "Bishop",
            DeckClass::Nemesis => "Nemesis",
        }
    }

    /// Accent color (CSS hex) for this class.
    pub fn color(self) -> &'static str {
        match self {
            DeckClass::Elf => "#10b981",
            DeckClass::Royal => "#eab308",
            DeckClass::Dragon => "#f97316",
            DeckClass::Witch => "#a855f7",
            DeckClass::Nightmare => "#ef4444",
            DeckClass::Bishop => "#d1d5db",
            DeckClass::Nemesis => "#06b6d4",
        }
    }
}

impl fmt::Display for DeckClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for DeckClass {
    type Err = DeckValidationError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        DeckClass::ALL
            .into_iter()
            .find(|class| class.code() == code)
            .ok_or_else(|| DeckValidationError::UnknownClass(code.to_string()))
    }
}

/// A named deck in the user's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeckType {
    /// Deck name (unique within a catalog)
    pub name: String,
    pub class: DeckClass,
}

impl DeckType {
    pub fn new(name: impl Into<String>, class: DeckClass) -> Self {
        Self {
            name: name.into(),
            class,
        }
    }
}

/// Decks grouped under one class, for catalog listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ClassGroup {
    pub class: DeckClass,
    pub decks: Vec<String>,
}

/// Group deck names by class, in class display order.
///
/// Every class gets a group, even when it has no decks.
pub fn group_by_class<'a, I>(decks: I) -> Vec<ClassGroup>
where
    I: IntoIterator<Item = &'a DeckType>,
{
    let mut groups: Vec<ClassGroup> = DeckClass::ALL
        .into_iter()
        .map(|class| ClassGroup {
            class,
            decks: Vec::new(),
        })
        .collect();

    for deck in decks {
        // ALL is in discriminant order
        groups[deck.class as usize].decks.push(deck.name.clone());
    }

    groups
}

/// Deck catalog errors reported back to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeckValidationError {
    #[error("Deck name is empty")]
    EmptyName,

    #[error("A deck named '{0}' already exists")]
    DuplicateName(String),

    #[error("Unknown deck class: {0}")]
    UnknownClass(String),
}

/// Built-in catalog for newly created documents.
const DEFAULT_DECKS: &[(&str, DeckClass)] = &[
    ("リノE", DeckClass::Elf),
    ("テンポE", DeckClass::Elf),
    ("進化E", DeckClass::Elf),
    ("不殺E", DeckClass::Elf),
    ("財宝R", DeckClass::Royal),
    ("進化R", DeckClass::Royal),
    ("オルオーンR", DeckClass::Royal),
    ("ほーちゃんD", DeckClass::Dragon),
    ("進化D", DeckClass::Dragon),
    ("ランプD", DeckClass::Dragon),
    ("海洋D", DeckClass::Dragon),
    ("スペル秘術W", DeckClass::Witch),
    ("秘術W", DeckClass::Witch),
    ("スペルW", DeckClass::Witch),
    ("リンクルW", DeckClass::Witch),
    ("リアニメイトNi", DeckClass::Nightmare),
    ("モードNi", DeckClass::Nightmare),
    ("ミルティオNi", DeckClass::Nightmare),
    ("進化Ni", DeckClass::Nightmare),
    ("ミッドレンジNi", DeckClass::Nightmare),
    ("シャクドウNi", DeckClass::Nightmare),
    ("アグロNi", DeckClass::Nightmare),
    ("奇数B", DeckClass::Bishop),
    ("クレストB", DeckClass::Bishop),
    ("守護B", DeckClass::Bishop),
    ("破壊Nm", DeckClass::Nemesis),
    ("人形Nm", DeckClass::Nemesis),
    ("アーティファクトNm", DeckClass::Nemesis),
];

/// The default deck catalog (28 decks across all 7 classes).
pub fn default_catalog() -> Vec<DeckType> {
    DEFAULT_DECKS
        .iter()
        .map(|(name, class)| DeckType::new(*name, *class))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_codes_round_trip_through_from_str() {
        for class in DeckClass::ALL {
            assert_eq!(class.code().parse::<DeckClass>(), Ok(class));
        }
    }

    #[test]
    fn test_unknown_class_code_rejected() {
        assert_eq!(
            "X".parse::<DeckClass>(),
            Err(DeckValidationError::UnknownClass("X".to_string()))
        );
        // Codes are case-sensitive
        assert!("ni".parse::<DeckClass>().is_err());
    }

    #[test]
    fn test_class_serializes_as_code() {
        let json = serde_json::to_string(&DeckType::new("Foo", DeckClass::Nightmare)).unwrap();
        assert_eq!(json, r#"{"name":"Foo","class":"Ni"}"#);
    }

    #[test]
    fn test_default_catalog_covers_all_classes() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), 28);

        let groups = group_by_class(&catalog);
        assert_eq!(groups.len(), 7);
        assert!(groups.iter().all(|g| !g.decks.is_empty()));
        assert_eq!(groups[4].class, DeckClass::Nightmare);
        assert_eq!(groups[4].decks.len(), 7);
    }

    #[test]
    fn test_group_by_class_keeps_catalog_order_and_empty_groups() {
        let decks = vec![
            DeckType::new("b", DeckClass::Royal),
            DeckType::new("a", DeckClass::Royal),
            DeckType::new("z", DeckClass::Elf),
        ];
        let groups = group_by_class(&decks);

        assert_eq!(groups[0].decks, vec!["z"]);
        assert_eq!(groups[1].decks, vec!["b", "a"]);
        assert!(groups[2].decks.is_empty());
    }
}
