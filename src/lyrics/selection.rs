// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pre-battle lyric selection.
//!
//! Before a battle the player picks exactly four distinct catalog entries.
//! `LyricSelection` tracks the picks with toggle semantics and
//! `PlayerLyricPool` is the validated, fixed result handed to the battle.

use std::collections::HashSet;

use super::{LyricCatalog, LyricEntry, LyricError};

/// Number of lyrics a player brings into a battle
pub const PLAYER_POOL_SIZE: usize = 4;

/// Result of toggling an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Added,
    Removed,
    /// Selection already full, nothing changed
    Full,
}

/// In-progress selection of catalog ids
#[derive(Debug, Clone, Default)]
pub struct LyricSelection {
    selected: Vec<String>,
}

impl LyricSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the id if absent, deselect it if present
    pub fn toggle(&mut self, id: &str) -> SelectionChange {
        if let Some(index) = self.selected.iter().position(|s| s == id) {
            self.selected.remove(index);
            SelectionChange::Removed
        } else if self.selected.len() < PLAYER_POOL_SIZE {
            self.selected.push(id.to_string());
            SelectionChange::Added
        } else {
            SelectionChange::Full
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Whether the battle can start
    pub fn is_complete(&self) -> bool {
        self.selected.len() == PLAYER_POOL_SIZE
    }

    /// Selected ids in pick order
    pub fn ids(&self) -> &[String] {
        &self.selected
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Resolve the selection against the catalog
    pub fn to_pool(&self, catalog: &LyricCatalog) -> Result<PlayerLyricPool, LyricError> {
        PlayerLyricPool::from_ids(catalog, &self.selected)
    }
}

/// The player's fixed set of lyrics for one battle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerLyricPool {
    entries: Vec<LyricEntry>,
}

impl PlayerLyricPool {
    /// Build a pool from exactly four distinct entries
    pub fn new(entries: Vec<LyricEntry>) -> Result<Self, LyricError> {
        if entries.len() != PLAYER_POOL_SIZE {
            return Err(LyricError::SelectionSize {
                expected: PLAYER_POOL_SIZE,
                got: entries.len(),
            });
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.id.as_str()) {
                return Err(LyricError::DuplicateSelection(entry.id.clone()));
            }
        }

        Ok(Self { entries })
    }

    /// Build a pool by looking ids up in the catalog
    pub fn from_ids<S: AsRef<str>>(catalog: &LyricCatalog, ids: &[S]) -> Result<Self, LyricError> {
        let entries = ids
            .iter()
            .map(|id| {
                catalog
                    .get(id.as_ref())
                    .cloned()
                    .ok_or_else(|| LyricError::UnknownId(id.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(entries)
    }

    pub fn entries(&self) -> &[LyricEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&LyricEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LyricEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> LyricCatalog {
        LyricCatalog::builtin().unwrap()
    }

    #[test]
    fn test_toggle_selection() {
        let mut selection = LyricSelection::new();
        assert_eq!(selection.toggle("A1"), SelectionChange::Added);
        assert!(selection.is_selected("A1"));

        assert_eq!(selection.toggle("A1"), SelectionChange::Removed);
        assert!(!selection.is_selected("A1"));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_selection_capped_at_four() {
        let mut selection = LyricSelection::new();
        for id in ["A1", "A2", "B1", "C1"] {
            assert_eq!(selection.toggle(id), SelectionChange::Added);
        }
        assert!(selection.is_complete());
        assert_eq!(selection.toggle("D1"), SelectionChange::Full);
        assert_eq!(selection.len(), 4);
        assert!(!selection.is_selected("D1"));

        // Freeing a slot allows another pick
        selection.toggle("A2");
        assert_eq!(selection.toggle("D1"), SelectionChange::Added);
        assert_eq!(selection.ids(), &["A1", "B1", "C1", "D1"]);
    }

    #[test]
    fn test_selection_to_pool() {
        let catalog = catalog();
        let mut selection = LyricSelection::new();
        for id in ["A1", "B2", "C3", "D1"] {
            selection.toggle(id);
        }

        let pool = selection.to_pool(&catalog).unwrap();
        assert_eq!(pool.entries().len(), 4);
        assert_eq!(pool.get("B2").unwrap().rhyme_score, 30);
        assert!(pool.get("A2").is_none());
    }

    #[test]
    fn test_incomplete_selection_rejected() {
        let catalog = catalog();
        let mut selection = LyricSelection::new();
        selection.toggle("A1");

        assert_eq!(
            selection.to_pool(&catalog),
            Err(LyricError::SelectionSize { expected: 4, got: 1 })
        );
    }

    #[test]
    fn test_unknown_and_duplicate_ids() {
        let catalog = catalog();
        assert_eq!(
            PlayerLyricPool::from_ids(&catalog, &["A1", "B1", "C1", "Z9"]),
            Err(LyricError::UnknownId("Z9".to_string()))
        );
        assert_eq!(
            PlayerLyricPool::from_ids(&catalog, &["A1", "B1", "C1", "A1"]),
            Err(LyricError::DuplicateSelection("A1".to_string()))
        );
    }
}
