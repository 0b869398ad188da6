//! Quiz board generation: schema types, offline corpus, dedup history,
//! and the model-backed generator.

pub mod generator;
pub mod offline;
pub mod seen;
pub mod types;

pub use generator::{board_schema, BoardGenerator, BoardGeneratorConfig};
pub use offline::{offline_board, offline_boards};
pub use seen::SeenSet;
pub use types::{
    BoardDataset, BoardError, BoardSource, Category, Clue, Difficulty, CATEGORY_COUNT,
    CLUES_PER_CATEGORY, VALUE_LADDER,
};

#[cfg(test)]
pub(crate) mod testutil {
    use super::types::{BoardDataset, BoardSource, Category, Clue, Difficulty, CATEGORY_COUNT, VALUE_LADDER};

    /// A well-formed board with deterministic content, pre-finalization.
    pub(crate) fn sample_board() -> BoardDataset {
        let categories = (0..CATEGORY_COUNT)
            .map(|c| Category {
                title: format!("Category {c}"),
                clues: VALUE_LADDER
                    .iter()
                    .enumerate()
                    .map(|(i, &value)| Clue {
                        id: String::new(),
                        prompt: format!("Prompt {c}-{i}"),
                        answer: format!("Answer {c}-{i}"),
                        value,
                        bonus_wager: false,
                    })
                    .collect(),
            })
            .collect();

        BoardDataset {
            id: String::new(),
            difficulty: Difficulty::Medium,
            topic: None,
            categories,
            source: BoardSource::Generated,
        }
    }
}
