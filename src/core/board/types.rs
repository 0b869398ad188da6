//! Quiz board schema types.
//!
//! A board is a fixed grid: six categories of five clues each, on the
//! 200–1000 value ladder. Generated and bundled boards share this schema
//! so downstream consumers never branch on the source.

use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Schema Constants
// ============================================================================

pub const CATEGORY_COUNT: usize = 6;
pub const CLUES_PER_CATEGORY: usize = 5;
pub const VALUE_LADDER: [u32; CLUES_PER_CATEGORY] = [200, 400, 600, 800, 1000];

/// Hex characters kept from the fingerprint digest. Deliberately weaker
/// than the asset-key scheme; it only guards against serving the same
/// board twice to one player.
const FINGERPRINT_HEX_LEN: usize = 12;

// ============================================================================
// Board Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a delivered board came from. Offline boards are schema-identical;
/// the tag exists for logging and analytics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoardSource {
    #[default]
    Generated,
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clue {
    /// Stable id, assigned at finalization.
    #[serde(default)]
    pub id: String,
    pub prompt: String,
    pub answer: String,
    pub value: u32,
    /// Flagged for special wagering rules, assigned at finalization.
    #[serde(default)]
    pub bonus_wager: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub title: String,
    pub clues: Vec<Clue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardDataset {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub topic: Option<String>,
    pub categories: Vec<Category>,
    #[serde(default)]
    pub source: BoardSource,
}

// ============================================================================
// Validation
// ============================================================================

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("expected {expected} categories, got {got}")]
    CategoryCount { expected: usize, got: usize },

    #[error("category '{category}' has {got} clues, expected {expected}")]
    ClueCount { category: String, expected: usize, got: usize },

    #[error("category '{category}' clue {index} has value {got}, expected {expected}")]
    ValueLadder { category: String, index: usize, expected: u32, got: u32 },

    #[error("category '{category}' clue {index} has empty {field}")]
    EmptyField { category: String, index: usize, field: &'static str },
}

impl BoardDataset {
    /// Check the fixed grid shape: category count, clue count, value
    /// ladder, and non-empty text. Model output failing this check is
    /// treated like any other provider failure.
    pub fn validate(&self) -> Result<(), BoardError> {
        if self.categories.len() != CATEGORY_COUNT {
            return Err(BoardError::CategoryCount {
                expected: CATEGORY_COUNT,
                got: self.categories.len(),
            });
        }

        for category in &self.categories {
            if category.clues.len() != CLUES_PER_CATEGORY {
                return Err(BoardError::ClueCount {
                    category: category.title.clone(),
                    expected: CLUES_PER_CATEGORY,
                    got: category.clues.len(),
                });
            }

            for (index, clue) in category.clues.iter().enumerate() {
                if clue.value != VALUE_LADDER[index] {
                    return Err(BoardError::ValueLadder {
                        category: category.title.clone(),
                        index,
                        expected: VALUE_LADDER[index],
                        got: clue.value,
                    });
                }
                if clue.prompt.trim().is_empty() {
                    return Err(BoardError::EmptyField {
                        category: category.title.clone(),
                        index,
                        field: "prompt",
                    });
                }
                if clue.answer.trim().is_empty() {
                    return Err(BoardError::EmptyField {
                        category: category.title.clone(),
                        index,
                        field: "answer",
                    });
                }
            }
        }

        Ok(())
    }

    /// Assign stable ids and mark 1–2 bonus-wager clues. Runs on every
    /// delivered board, generated or offline.
    pub fn finalize(&mut self) {
        let mut rng = rand::thread_rng();
        self.finalize_with_rng(&mut rng);
    }

    pub fn finalize_with_rng<R: Rng>(&mut self, rng: &mut R) {
        if self.id.is_empty() {
            self.id = Uuid::new_v4().to_string();
        }
        for category in &mut self.categories {
            for clue in &mut category.clues {
                if clue.id.is_empty() {
                    clue.id = Uuid::new_v4().to_string();
                }
                clue.bonus_wager = false;
            }
        }

        let total: usize = self.categories.iter().map(|c| c.clues.len()).sum();
        if total == 0 {
            return;
        }

        let wager_count = rng.gen_range(1..=2usize).min(total);
        let chosen = rand::seq::index::sample(rng, total, wager_count);

        let mut flat: Vec<&mut Clue> = self
            .categories
            .iter_mut()
            .flat_map(|c| c.clues.iter_mut())
            .collect();
        for slot in chosen.iter() {
            flat[slot].bonus_wager = true;
        }
    }

    /// Content fingerprint for deduplication: a truncated digest over each
    /// category's leading clue prompt.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for category in &self.categories {
            if let Some(first) = category.clues.first() {
                hasher.update(first.prompt.trim().to_lowercase().as_bytes());
                hasher.update(b"|");
            }
        }
        let digest = hasher.finalize();
        hex::encode(&digest[..FINGERPRINT_HEX_LEN / 2])
    }

    /// Count of clues flagged as bonus wagers.
    pub fn bonus_wager_count(&self) -> usize {
        self.categories
            .iter()
            .flat_map(|c| &c.clues)
            .filter(|c| c.bonus_wager)
            .count()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::board::testutil::sample_board;

    #[test]
    fn test_valid_board_passes() {
        assert!(sample_board().validate().is_ok());
    }

    #[test]
    fn test_wrong_category_count_fails() {
        let mut board = sample_board();
        board.categories.pop();
        assert!(matches!(
            board.validate(),
            Err(BoardError::CategoryCount { got: 5, .. })
        ));
    }

    #[test]
    fn test_wrong_clue_count_fails() {
        let mut board = sample_board();
        board.categories[2].clues.pop();
        assert!(matches!(board.validate(), Err(BoardError::ClueCount { .. })));
    }

    #[test]
    fn test_broken_value_ladder_fails() {
        let mut board = sample_board();
        board.categories[0].clues[3].value = 50;
        assert!(matches!(board.validate(), Err(BoardError::ValueLadder { .. })));
    }

    #[test]
    fn test_empty_prompt_fails() {
        let mut board = sample_board();
        board.categories[1].clues[0].prompt = "  ".to_string();
        assert!(matches!(board.validate(), Err(BoardError::EmptyField { field: "prompt", .. })));
    }

    #[test]
    fn test_finalize_assigns_unique_ids() {
        let mut board = sample_board();
        board.finalize();

        assert!(!board.id.is_empty());
        let mut seen = std::collections::HashSet::new();
        for clue in board.categories.iter().flat_map(|c| &c.clues) {
            assert!(!clue.id.is_empty());
            assert!(seen.insert(clue.id.clone()), "duplicate clue id {}", clue.id);
        }
    }

    #[test]
    fn test_finalize_marks_one_or_two_unique_wagers() {
        // The wager count is random; exercise it across many draws.
        for _ in 0..100 {
            let mut board = sample_board();
            board.finalize();
            let count = board.bonus_wager_count();
            assert!(count == 1 || count == 2, "wager count {count} out of range");
        }
    }

    #[test]
    fn test_finalize_resets_previous_wagers() {
        let mut board = sample_board();
        for clue in board.categories.iter_mut().flat_map(|c| c.clues.iter_mut()) {
            clue.bonus_wager = true;
        }
        board.finalize();
        assert!(board.bonus_wager_count() <= 2);
    }

    #[test]
    fn test_fingerprint_stable_and_content_sensitive() {
        let board = sample_board();
        assert_eq!(board.fingerprint(), sample_board().fingerprint());
        assert_eq!(board.fingerprint().len(), 12);

        let mut changed = sample_board();
        changed.categories[0].clues[0].prompt = "Entirely different".to_string();
        assert_ne!(board.fingerprint(), changed.fingerprint());
    }

    #[test]
    fn test_fingerprint_ignores_case_and_padding() {
        let board = sample_board();
        let mut shouty = sample_board();
        for category in &mut shouty.categories {
            category.clues[0].prompt = format!("  {}  ", category.clues[0].prompt.to_uppercase());
        }
        assert_eq!(board.fingerprint(), shouty.fingerprint());
    }
}
