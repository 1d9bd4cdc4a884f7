use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// A wraper for an integer index used to index nodes
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Get the value of the actual node without having to access and risk overiding the internal value
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for NodeId {
    /// Allow for explicit conversion from usize to NodeId
    fn from(value: usize) -> Self {
        NodeId(value)
    }
}

/// Index into the game table of a tree.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameRef(usize);

impl GameRef {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for GameRef {
    fn from(value: usize) -> Self {
        GameRef(value)
    }
}

/// One board square, `0 = a1` up to `63 = h8`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    /// Build a square from zero based file and rank, `None` when off the board.
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        if file < 8 && rank < 8 {
            Some(Square(rank * 8 + file))
        } else {
            None
        }
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn file(&self) -> u8 {
        self.0 % 8
    }

    pub fn rank(&self) -> u8 {
        self.0 / 8
    }
}

impl TryFrom<usize> for Square {
    type Error = MoveKeyParseError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        if value < 64 {
            Ok(Square(value as u8))
        } else {
            Err(MoveKeyParseError(format!("square index {value} is off the board")))
        }
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file()) as char, (b'1' + self.rank()) as char)
    }
}

impl FromStr for Square {
    type Err = MoveKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(MoveKeyParseError(format!("invalid square '{s}'")));
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        Square::new(file, rank).ok_or_else(|| MoveKeyParseError(format!("invalid square '{s}'")))
    }
}

/// Piece a pawn promotes to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Promotion {
    Knight,
    Bishop,
    Rook,
    Queen,
}

impl Promotion {
    /// Lowercase coordinate-notation suffix.
    pub fn as_char(&self) -> char {
        match self {
            Promotion::Knight => 'n',
            Promotion::Bishop => 'b',
            Promotion::Rook => 'r',
            Promotion::Queen => 'q',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'n' => Some(Promotion::Knight),
            'b' => Some(Promotion::Bishop),
            'r' => Some(Promotion::Rook),
            'q' => Some(Promotion::Queen),
            _ => None,
        }
    }
}

/// Canonical identity of one ply: origin, destination and optional promotion.
///
/// Two notations of the same move always resolve to the same key, which is why
/// sibling edges are keyed by `MoveKey` and never by display labels.
/// Serialized as coordinate text such as `e2e4` or `e7e8q`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MoveKey {
    origin: Square,
    dest: Square,
    promotion: Option<Promotion>,
}

impl MoveKey {
    pub fn new(origin: Square, dest: Square, promotion: Option<Promotion>) -> Self {
        MoveKey {
            origin,
            dest,
            promotion,
        }
    }

    pub fn origin(&self) -> Square {
        self.origin
    }

    pub fn dest(&self) -> Square {
        self.dest
    }

    pub fn promotion(&self) -> Option<Promotion> {
        self.promotion
    }
}

impl fmt::Display for MoveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.origin, self.dest)?;
        if let Some(promotion) = self.promotion {
            write!(f, "{}", promotion.as_char())?;
        }
        Ok(())
    }
}

impl FromStr for MoveKey {
    type Err = MoveKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_ascii() || !(4..=5).contains(&s.len()) {
            return Err(MoveKeyParseError(format!("invalid move key '{s}'")));
        }
        let origin: Square = s[0..2].parse()?;
        let dest: Square = s[2..4].parse()?;
        let promotion = match s[4..].chars().next() {
            None => None,
            Some(c) => Some(
                Promotion::from_char(c)
                    .ok_or_else(|| MoveKeyParseError(format!("invalid promotion in '{s}'")))?,
            ),
        };
        Ok(MoveKey::new(origin, dest, promotion))
    }
}

impl TryFrom<String> for MoveKey {
    type Error = MoveKeyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MoveKey> for String {
    fn from(value: MoveKey) -> Self {
        value.to_string()
    }
}

/// Error returned when coordinate text does not describe a move key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveKeyParseError(String);

impl fmt::Display for MoveKeyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for MoveKeyParseError {}

/// Path derived identifier of a variation: the dot joined move keys from the root.
/// Unique tree-wide and stable across rebuilds, prunes and merges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct VariationId(String);

impl VariationId {
    /// Identifier of the root variation.
    pub fn root() -> Self {
        VariationId(String::new())
    }

    /// Identifier of the variation reached by playing `key` after `self`.
    pub fn child(&self, key: MoveKey) -> Self {
        if self.0.is_empty() {
            VariationId(key.to_string())
        } else {
            VariationId(format!("{}.{}", self.0, key))
        }
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("root")
        } else {
            f.write_str(&self.0)
        }
    }
}
