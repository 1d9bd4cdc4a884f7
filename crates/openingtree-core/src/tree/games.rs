use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::tree::ids::GameRef;

/// Outcome of a game from the repertoire owner's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameResult {
    Win,
    Loss,
    Draw,
}

/// The part of a game that is attached to every node it passes through.
/// Immutable once interned into a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub id: String,
    pub white: String,
    pub black: String,
    pub result: GameResult,
    pub date: NaiveDate,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub white_elo: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub black_elo: Option<u32>,
}

/// A finished game as handed over by the game store.
/// `moves` is the raw notation blob; only the move engine interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub id: String,
    pub moves: String,
    pub white: String,
    pub black: String,
    pub result: GameResult,
    pub date: NaiveDate,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub white_elo: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub black_elo: Option<u32>,
}

impl GameRecord {
    /// Strip the notation blob to get the summary stored on nodes.
    pub fn summary(&self) -> GameSummary {
        GameSummary {
            id: self.id.clone(),
            white: self.white.clone(),
            black: self.black.clone(),
            result: self.result,
            date: self.date,
            url: self.url.clone(),
            white_elo: self.white_elo,
            black_elo: self.black_elo,
        }
    }
}

/// Stable game interner: every summary is stored once per tree and nodes refer to it by `GameRef`.
#[derive(Debug, Clone, Default)]
pub(crate) struct GameTable {
    games: Vec<GameSummary>,
    id_to_ref: HashMap<String, GameRef>,
}

impl GameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the summary if its id is unknown and return its ref.
    /// An already known id keeps the first summary seen.
    pub fn intern(&mut self, summary: GameSummary) -> GameRef {
        if let Some(game_ref) = self.id_to_ref.get(&summary.id) {
            return *game_ref;
        }

        let game_ref = GameRef::from(self.games.len());
        self.id_to_ref.insert(summary.id.clone(), game_ref);
        self.games.push(summary);
        game_ref
    }

    pub fn get(&self, game_ref: GameRef) -> Option<&GameSummary> {
        self.games.get(game_ref.index())
    }

    pub fn ref_of(&self, id: &str) -> Option<GameRef> {
        self.id_to_ref.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameSummary> {
        self.games.iter()
    }
}

/// De-duplicated, append-only list of the games passing through one node.
#[derive(Debug, Clone, Default)]
pub(crate) struct GameList {
    order: Vec<GameRef>,
    members: HashSet<GameRef>,
}

impl GameList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a game. Returns `false` when it was already present.
    pub fn insert(&mut self, game_ref: GameRef) -> bool {
        if !self.members.insert(game_ref) {
            return false;
        }
        self.order.push(game_ref);
        true
    }

    pub fn contains(&self, game_ref: GameRef) -> bool {
        self.members.contains(&game_ref)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = GameRef> + '_ {
        self.order.iter().copied()
    }
}
