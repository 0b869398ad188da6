//! Bundled offline board corpus.
//!
//! A small set of pre-written boards compiled into the binary, used as
//! the generation-of-last-resort. Schema-identical to generated boards.
//! Parse failures log warnings and skip the invalid file rather than
//! panicking.

use rand::seq::SliceRandom;

use super::types::{BoardDataset, BoardSource, Category, Clue, Difficulty, VALUE_LADDER};

const BOARD_EASY: &str = include_str!("../../../assets/boards/easy.json");
const BOARD_MEDIUM: &str = include_str!("../../../assets/boards/medium.json");
const BOARD_HARD: &str = include_str!("../../../assets/boards/hard.json");

/// All bundled board sources with labels for error reporting.
const BOARD_SOURCES: &[(&str, Difficulty, &str)] = &[
    ("easy", Difficulty::Easy, BOARD_EASY),
    ("medium", Difficulty::Medium, BOARD_MEDIUM),
    ("hard", Difficulty::Hard, BOARD_HARD),
];

fn parse_board(label: &str, raw: &str) -> Option<BoardDataset> {
    match serde_json::from_str::<BoardDataset>(raw) {
        Ok(mut board) => {
            board.source = BoardSource::Offline;
            Some(board)
        }
        Err(e) => {
            log::warn!("Bundled board '{label}' failed to parse: {e} — skipping");
            None
        }
    }
}

/// Load every parsable bundled board.
pub fn offline_boards() -> Vec<BoardDataset> {
    BOARD_SOURCES
        .iter()
        .filter_map(|(label, _, raw)| parse_board(label, raw))
        .collect()
}

/// Pick an offline board for a difficulty, preferring an exact match and
/// degrading to any bundled board, then to a built-in minimal board.
pub fn offline_board(difficulty: Difficulty) -> BoardDataset {
    let matching: Vec<BoardDataset> = BOARD_SOURCES
        .iter()
        .filter(|(_, d, _)| *d == difficulty)
        .filter_map(|(label, _, raw)| parse_board(label, raw))
        .collect();

    let mut rng = rand::thread_rng();
    if let Some(board) = matching.choose(&mut rng) {
        let mut board = board.clone();
        board.difficulty = difficulty;
        return board;
    }

    let any = offline_boards();
    if let Some(board) = any.choose(&mut rng) {
        log::warn!("No bundled board for difficulty {difficulty} — serving a substitute");
        let mut board = board.clone();
        board.difficulty = difficulty;
        return board;
    }

    log::error!("No bundled boards parsed — serving the built-in minimal board");
    builtin_minimal_board(difficulty)
}

/// Constructed-in-code last resort so the generator contract holds even
/// if every bundled file is unreadable.
fn builtin_minimal_board(difficulty: Difficulty) -> BoardDataset {
    const CATEGORIES: &[(&str, [(&str, &str); 5])] = &[
        ("Numbers", [
            ("Days in a week", "What is seven?"),
            ("Legs on a spider", "What is eight?"),
            ("A dozen", "What is twelve?"),
            ("Minutes in an hour", "What is sixty?"),
            ("Half of one hundred", "What is fifty?"),
        ]),
        ("Colors", [
            ("Blue plus yellow", "What is green?"),
            ("Red plus white", "What is pink?"),
            ("Color of the sun in drawings", "What is yellow?"),
            ("Color of an emerald", "What is green?"),
            ("Color of a ruby", "What is red?"),
        ]),
        ("Animals", [
            ("Bamboo-eating bear", "What is a panda?"),
            ("Tallest land animal", "What is a giraffe?"),
            ("King of the jungle", "What is a lion?"),
            ("Only flying mammal", "What is a bat?"),
            ("Fastest land animal", "What is a cheetah?"),
        ]),
        ("Earth", [
            ("Star at the solar system's center", "What is the Sun?"),
            ("Largest ocean", "What is the Pacific?"),
            ("Frozen rain", "What is snow?"),
            ("Earth's natural satellite", "What is the Moon?"),
            ("Mountain that erupts", "What is a volcano?"),
        ]),
        ("Food", [
            ("Sweet food made by bees", "What is honey?"),
            ("Monkey's favorite yellow fruit", "What is a banana?"),
            ("Round pie with cheese", "What is pizza?"),
            ("Breakfast food in a shell", "What is an egg?"),
            ("Treat made from cacao", "What is chocolate?"),
        ]),
        ("Stories", [
            ("Girl in the three bears' house", "Who is Goldilocks?"),
            ("Boy with the beanstalk", "Who is Jack?"),
            ("Puppet whose nose grew", "Who is Pinocchio?"),
            ("Owner of the glass slipper", "Who is Cinderella?"),
            ("Number of little pigs", "What is three?"),
        ]),
    ];

    BoardDataset {
        id: String::new(),
        difficulty,
        topic: None,
        categories: CATEGORIES
            .iter()
            .map(|(title, clues)| Category {
                title: title.to_string(),
                clues: clues
                    .iter()
                    .zip(VALUE_LADDER)
                    .map(|((prompt, answer), value)| Clue {
                        id: String::new(),
                        prompt: prompt.to_string(),
                        answer: answer.to_string(),
                        value,
                        bonus_wager: false,
                    })
                    .collect(),
            })
            .collect(),
        source: BoardSource::Offline,
    }
}

// ============================================================================
// Tests
// ============================================================================
