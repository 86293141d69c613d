// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Lyric catalog.
//!
//! Lyric entries are supplied from outside the battle engine and never
//! mutated by it. A built-in catalog is bundled; custom catalogs can be
//! loaded from YAML.

pub mod selection;

pub use selection::{LyricSelection, PlayerLyricPool, SelectionChange, PLAYER_POOL_SIZE};

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const BUILTIN_CATALOG: &str = include_str!("../../assets/lyrics.yaml");

/// Lowest and highest allowed rhyme score
pub const RHYME_SCORE_RANGE: std::ops::RangeInclusive<u32> = 10..=30;

/// Problems with lyric data or a lyric selection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LyricError {
    #[error("lyric entry has an empty id")]
    EmptyId,

    #[error("duplicate lyric id '{0}'")]
    DuplicateId(String),

    #[error("lyric '{id}' has rhyme score {score}, expected 10-30")]
    RhymeScoreOutOfRange { id: String, score: u32 },

    #[error("unknown lyric id '{0}'")]
    UnknownId(String),

    #[error("expected {expected} selected lyrics, got {got}")]
    SelectionSize { expected: usize, got: usize },

    #[error("lyric '{0}' selected more than once")]
    DuplicateSelection(String),
}

/// Tactical category of a lyric
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LyricType {
    Attack,
    Technical,
    Counter,
    Closing,
}

impl LyricType {
    pub const ALL: [LyricType; 4] = [
        LyricType::Attack,
        LyricType::Technical,
        LyricType::Counter,
        LyricType::Closing,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LyricType::Attack => "attack",
            LyricType::Technical => "technical",
            LyricType::Counter => "counter",
            LyricType::Closing => "closing",
        }
    }
}

impl fmt::Display for LyricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricEntry {
    /// Unique identifier
    pub id: String,
    /// Highlighted word shown on the perform button
    #[serde(default)]
    pub keyword: Option<String>,
    /// Performable line; may contain an internal line break
    pub text: String,
    /// Tactical category
    #[serde(rename = "type")]
    pub kind: LyricType,
    /// Fixed intrinsic quality
    pub rhyme_score: u32,
    /// Opponent lyric types this entry scores a bonus against
    #[serde(default)]
    pub counters_to: BTreeSet<LyricType>,
}

impl LyricEntry {
    /// Create an entry with no keyword
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        kind: LyricType,
        rhyme_score: u32,
        counters_to: &[LyricType],
    ) -> Self {
        Self {
            id: id.into(),
            keyword: None,
            text: text.into(),
            kind,
            rhyme_score,
            counters_to: counters_to.iter().copied().collect(),
        }
    }

    /// Whether playing this entry answers a lyric of type `kind`
    pub fn counters(&self, kind: LyricType) -> bool {
        self.counters_to.contains(&kind)
    }

    /// Button label: the keyword when present, the id otherwise
    pub fn label(&self) -> &str {
        self.keyword.as_deref().unwrap_or(&self.id)
    }

    /// Text with line breaks flattened for single-line display
    pub fn one_line(&self) -> String {
        self.text.replace('\n', " / ")
    }
}

/// Immutable collection of lyric entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricCatalog {
    lyrics: Vec<LyricEntry>,
}

impl LyricCatalog {
    /// Build a catalog from entries, validating them
    pub fn new(lyrics: Vec<LyricEntry>) -> Result<Self, LyricError> {
        let catalog = Self { lyrics };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The catalog bundled with the game
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_CATALOG).context("Built-in lyric catalog is invalid")
    }

    /// Load a catalog from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read lyric catalog: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate a catalog from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let catalog: Self =
            serde_yaml::from_str(yaml).context("Failed to parse lyric catalog YAML")?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check id uniqueness and rhyme score bounds
    pub fn validate(&self) -> Result<(), LyricError> {
        let mut seen = HashSet::new();
        for entry in &self.lyrics {
            if entry.id.is_empty() {
                return Err(LyricError::EmptyId);
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(LyricError::DuplicateId(entry.id.clone()));
            }
            if !RHYME_SCORE_RANGE.contains(&entry.rhyme_score) {
                return Err(LyricError::RhymeScoreOutOfRange {
                    id: entry.id.clone(),
                    score: entry.rhyme_score,
                });
            }
        }
        Ok(())
    }

    pub fn entries(&self) -> &[LyricEntry] {
        &self.lyrics
    }

    pub fn len(&self) -> usize {
        self.lyrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lyrics.is_empty()
    }

    /// Look up an entry by id
    pub fn get(&self, id: &str) -> Option<&LyricEntry> {
        self.lyrics.iter().find(|entry| entry.id == id)
    }

    /// Entries whose type is one of `kinds`
    pub fn of_types<'a>(&'a self, kinds: &'a [LyricType]) -> impl Iterator<Item = &'a LyricEntry> {
        self.lyrics.iter().filter(move |entry| kinds.contains(&entry.kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = LyricCatalog::builtin().unwrap();
        assert_eq!(catalog.len(), 12);

        for kind in LyricType::ALL {
            assert_eq!(catalog.of_types(&[kind]).count(), 3, "type {}", kind);
        }

        let a1 = catalog.get("A1").unwrap();
        assert_eq!(a1.kind, LyricType::Attack);
        assert_eq!(a1.rhyme_score, 20);
        assert!(a1.counters(LyricType::Technical));
        assert!(!a1.counters(LyricType::Counter));
        assert!(a1.text.contains('\n'));

        let d1 = catalog.get("D1").unwrap();
        assert!(d1.counters_to.is_empty());
    }

    #[test]
    fn test_parse_catalog() {
        let yaml = r#"
lyrics:
  - id: X1
    text: "line one\nline two"
    type: counter
    rhyme_score: 15
    counters_to: [attack]
  - id: X2
    keyword: big
    text: "closing line"
    type: closing
    rhyme_score: 10
"#;

        let catalog = LyricCatalog::from_yaml(yaml).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("X1").unwrap().label(), "X1");
        assert_eq!(catalog.get("X2").unwrap().label(), "big");
        assert_eq!(catalog.get("X1").unwrap().one_line(), "line one / line two");
        assert!(catalog.get("X3").is_none());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let entries = vec![
            LyricEntry::new("A", "a", LyricType::Attack, 20, &[]),
            LyricEntry::new("A", "b", LyricType::Counter, 20, &[]),
        ];
        assert_eq!(
            LyricCatalog::new(entries),
            Err(LyricError::DuplicateId("A".to_string()))
        );
    }

    #[test]
    fn test_rhyme_score_bounds() {
        let entries = vec![LyricEntry::new("A", "a", LyricType::Attack, 31, &[])];
        assert!(matches!(
            LyricCatalog::new(entries),
            Err(LyricError::RhymeScoreOutOfRange { score: 31, .. })
        ));

        let entries = vec![LyricEntry::new("", "a", LyricType::Attack, 20, &[])];
        assert_eq!(LyricCatalog::new(entries), Err(LyricError::EmptyId));
    }

    #[test]
    fn test_invalid_yaml_type() {
        let yaml = r#"
lyrics:
  - id: X1
    text: "x"
    type: freestyle
    rhyme_score: 15
"#;
        assert!(LyricCatalog::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lyrics.yaml");
        fs::write(&path, BUILTIN_CATALOG).unwrap();
        assert_eq!(LyricCatalog::load(&path).unwrap().len(), 12);
    }
}
