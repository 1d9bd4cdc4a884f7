use chrono::NaiveDate;

use crate::{EngineError, GameRecord, GameResult, MoveEngine, MoveKey, Ply};

mod merge_tests;
mod prune_tests;
mod snapshot_tests;

/// Engine for tests: moves are coordinate keys, the label is the destination
/// square and the position key is the move path itself.
pub(crate) struct PathEngine;

impl MoveEngine for PathEngine {
    fn replay(&self, notation: &str, limit: usize) -> Result<Vec<Ply>, EngineError> {
        let mut position = String::from("start");
        let mut plies = Vec::new();

        for (ply_index, token) in notation.split_whitespace().take(limit).enumerate() {
            let move_key: MoveKey = token.parse().map_err(|err| EngineError {
                ply_index,
                reason: format!("{err}"),
            })?;
            position.push(' ');
            position.push_str(token);
            plies.push(Ply {
                move_key,
                san: move_key.dest().to_string(),
                position_key: position.clone(),
            });
        }

        Ok(plies)
    }
}

pub(crate) fn game(id: &str, moves: &str) -> GameRecord {
    GameRecord {
        id: id.to_string(),
        moves: moves.to_string(),
        white: "white".to_string(),
        black: "black".to_string(),
        result: GameResult::Draw,
        date: NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date"),
        url: format!("https://example.org/{id}"),
        white_elo: Some(1800),
        black_elo: None,
    }
}

pub(crate) fn key(text: &str) -> MoveKey {
    text.parse().expect("valid move key")
}
