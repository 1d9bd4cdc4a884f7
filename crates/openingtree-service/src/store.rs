use std::{
    fs, io,
    path::{Path, PathBuf},
};

use openingtree_core::GameRecord;

use crate::StoreError;

/// Source of finished games.
pub trait GameStore {
    /// Every game currently known, in a stable order.
    fn list(&self) -> Result<Vec<GameRecord>, StoreError>;
}

impl GameStore for Vec<GameRecord> {
    fn list(&self) -> Result<Vec<GameRecord>, StoreError> {
        Ok(self.clone())
    }
}

/// Games kept as a JSON array on disk.
#[derive(Debug, Clone)]
pub struct GameFile {
    path: PathBuf,
}

impl GameFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        GameFile { path: path.into() }
    }

    /// Serialize and write `games` to the file.
    pub fn save(&self, games: &[GameRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(games)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl GameStore for GameFile {
    fn list(&self) -> Result<Vec<GameRecord>, StoreError> {
        let json = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Single-slot byte store holding one serialized tree. Last write wins.
pub trait ByteSlot {
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError>;
    fn save(&mut self, bytes: &[u8]) -> Result<(), StoreError>;
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// In-memory slot, for tests and hosts without durable storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    bytes: Option<Vec<u8>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-filled with a payload.
    pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        MemorySlot {
            bytes: Some(bytes.into()),
        }
    }
}

impl ByteSlot for MemorySlot {
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.bytes.clone())
    }

    fn save(&mut self, bytes: &[u8]) -> Result<(), StoreError> {
        self.bytes = Some(bytes.to_vec());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.bytes = None;
        Ok(())
    }
}

/// Slot backed by one file. A missing file is an empty slot.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSlot { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSlot for FileSlot {
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&mut self, bytes: &[u8]) -> Result<(), StoreError> {
        fs::write(&self.path, bytes)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}
