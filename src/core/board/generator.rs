//! Board Generator
//!
//! Requests a schema-constrained board from a generative model under a
//! hard timeout, validates the grid, deduplicates against the player's
//! history, and falls back to the bundled offline corpus on total
//! failure. The `generate` contract never fails.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::time::timeout;

use crate::core::board::offline::offline_board;
use crate::core::board::seen::SeenSet;
use crate::core::board::types::{
    BoardDataset, BoardSource, Difficulty, CATEGORY_COUNT, CLUES_PER_CATEGORY, VALUE_LADDER,
};
use crate::core::model::{ModelClient, ModelError};

/// Alternate topic hints rotated through on dedup collisions.
const TOPIC_HINTS: &[&str] = &[
    "science and nature",
    "world history",
    "arts and literature",
    "geography",
    "sports and games",
    "music and film",
    "technology and inventions",
    "food and cooking",
];

#[derive(Debug, Clone)]
pub struct BoardGeneratorConfig {
    /// Hard ceiling on one model call; on expiry the in-flight call is
    /// abandoned and its eventual result discarded.
    pub request_timeout: Duration,
    /// Generation attempts before accepting a duplicate or falling back.
    pub max_attempts: u32,
}

impl Default for BoardGeneratorConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_attempts: 3,
        }
    }
}

pub struct BoardGenerator {
    model: Arc<dyn ModelClient>,
    seen: Arc<SeenSet>,
    config: BoardGeneratorConfig,
}

impl BoardGenerator {
    pub fn new(model: Arc<dyn ModelClient>, seen: Arc<SeenSet>) -> Self {
        Self::with_config(model, seen, BoardGeneratorConfig::default())
    }

    pub fn with_config(
        model: Arc<dyn ModelClient>,
        seen: Arc<SeenSet>,
        config: BoardGeneratorConfig,
    ) -> Self {
        Self { model, seen, config }
    }

    /// Produce a finalized board. Never fails: exhausted generation falls
    /// back to the bundled offline corpus, and every delivered board —
    /// whatever its source — is finalized and recorded as seen.
    pub async fn generate(&self, difficulty: Difficulty, topic: Option<&str>) -> BoardDataset {
        match self.try_generate(difficulty, topic).await {
            Ok(mut board) => {
                board.finalize();
                board
            }
            Err(e) => {
                log::warn!("Board generation failed ({e}) — serving a bundled offline board");
                let mut board = offline_board(difficulty);
                board.finalize();
                self.seen.record(&board.fingerprint()).await;
                board
            }
        }
    }

    /// Generation without the offline fallback, recording the accepted
    /// board as seen. Used by the prefetch scheduler, which prefers an
    /// under-target pool over pooling canned boards.
    pub async fn try_generate(
        &self,
        difficulty: Difficulty,
        topic: Option<&str>,
    ) -> Result<BoardDataset, ModelError> {
        let hint_offset = rand::thread_rng().gen_range(0..TOPIC_HINTS.len());
        let mut duplicate: Option<BoardDataset> = None;
        let mut last_error: Option<ModelError> = None;

        for attempt in 0..self.config.max_attempts {
            // First attempt honors the caller's topic; dedup retries
            // rotate through alternate hints.
            let hint = if attempt == 0 {
                topic.map(str::to_string)
            } else {
                Some(TOPIC_HINTS[(hint_offset + attempt as usize) % TOPIC_HINTS.len()].to_string())
            };

            match self.attempt(difficulty, hint.as_deref()).await {
                Ok(board) => {
                    let fingerprint = board.fingerprint();
                    if self.seen.contains(&fingerprint).await {
                        log::info!(
                            "Generated board repeats fingerprint {fingerprint} (attempt {}) — retrying with a different topic",
                            attempt + 1
                        );
                        duplicate = Some(board);
                        continue;
                    }
                    self.seen.record(&fingerprint).await;
                    return Ok(board);
                }
                Err(e) => {
                    log::warn!("Board generation attempt {} failed: {e}", attempt + 1);
                    last_error = Some(e);
                }
            }
        }

        if let Some(board) = duplicate {
            log::info!("Accepting a possibly-duplicate board after exhausting retries");
            self.seen.record(&board.fingerprint()).await;
            return Ok(board);
        }

        Err(last_error
            .unwrap_or_else(|| ModelError::InvalidResponse("no generation attempts made".to_string())))
    }

    async fn attempt(
        &self,
        difficulty: Difficulty,
        topic: Option<&str>,
    ) -> Result<BoardDataset, ModelError> {
        let prompt = build_prompt(difficulty, topic);
        let schema = board_schema();

        let value = match timeout(
            self.config.request_timeout,
            self.model.generate_structured(&prompt, &schema),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => return Err(ModelError::Timeout),
        };

        let mut board: BoardDataset = serde_json::from_value(value)
            .map_err(|e| ModelError::InvalidResponse(format!("board did not match schema: {e}")))?;
        board.difficulty = difficulty;
        board.topic = topic.map(str::to_string);
        board.source = BoardSource::Generated;
        board
            .validate()
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        Ok(board)
    }
}

fn build_prompt(difficulty: Difficulty, topic: Option<&str>) -> String {
    let topic_line = match topic {
        Some(topic) => format!("Lean the categories toward: {topic}."),
        None => "Pick a varied spread of categories.".to_string(),
    };
    format!(
        "Create a {difficulty}-difficulty quiz board: {CATEGORY_COUNT} categories, \
         {CLUES_PER_CATEGORY} clues each. Clue values per category must be exactly \
         {VALUE_LADDER:?}, ordered easiest to hardest. Phrase answers as questions. \
         {topic_line}"
    )
}

/// JSON schema the model's output must satisfy.
pub fn board_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "required": ["categories"],
        "properties": {
            "categories": {
                "type": "array",
                "minItems": CATEGORY_COUNT,
                "maxItems": CATEGORY_COUNT,
                "items": {
                    "type": "object",
                    "required": ["title", "clues"],
                    "properties": {
                        "title": {"type": "string"},
                        "clues": {
                            "type": "array",
                            "minItems": CLUES_PER_CATEGORY,
                            "maxItems": CLUES_PER_CATEGORY,
                            "items": {
                                "type": "object",
                                "required": ["prompt", "answer", "value"],
                                "properties": {
                                    "prompt": {"type": "string"},
                                    "answer": {"type": "string"},
                                    "value": {"enum": VALUE_LADDER}
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}

// ============================================================================
// Tests
// ============================================================================
