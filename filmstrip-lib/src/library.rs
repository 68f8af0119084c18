//! Storage of saved projects.
//!
//! Projects are opaque blobs (the output of [`crate::encode`]) filed under a
//! name. The real backend lives outside of this crate; [`MemoryLibrary`] is
//! enough for merging archives and for tests.

use std::collections::BTreeMap;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SaveId(pub u32);

impl fmt::Display for SaveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveEntry {
    pub id: SaveId,
    pub name: String,
}

#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum LibraryError {
    #[error("no save with id {0}")]
    NotFound(SaveId),
}

pub trait Library {
    fn list_saves(&self) -> Vec<SaveEntry>;

    fn load_save(&self, id: SaveId) -> Result<Vec<u8>, LibraryError>;

    fn save_new(&mut self, name: &str, bytes: Vec<u8>) -> SaveId;

    fn update_save(&mut self, id: SaveId, bytes: Vec<u8>) -> Result<(), LibraryError>;

    fn delete_save(&mut self, id: SaveId) -> Result<(), LibraryError>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryLibrary {
    saves: BTreeMap<SaveId, (String, Vec<u8>)>,
    next_id: u32,
}

impl MemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.saves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.saves.is_empty()
    }
}

impl Library for MemoryLibrary {
    fn list_saves(&self) -> Vec<SaveEntry> {
        self.saves
            .iter()
            .map(|(id, (name, _))| SaveEntry {
                id: *id,
                name: name.clone(),
            })
            .collect()
    }

    fn load_save(&self, id: SaveId) -> Result<Vec<u8>, LibraryError> {
        self.saves
            .get(&id)
            .map(|(_, bytes)| bytes.clone())
            .ok_or(LibraryError::NotFound(id))
    }

    fn save_new(&mut self, name: &str, bytes: Vec<u8>) -> SaveId {
        self.next_id += 1;

        let id = SaveId(self.next_id);
        self.saves.insert(id, (name.to_owned(), bytes));

        id
    }

    fn update_save(&mut self, id: SaveId, bytes: Vec<u8>) -> Result<(), LibraryError> {
        let (_, stored) = self.saves.get_mut(&id).ok_or(LibraryError::NotFound(id))?;
        *stored = bytes;

        Ok(())
    }

    fn delete_save(&mut self, id: SaveId) -> Result<(), LibraryError> {
        self.saves
            .remove(&id)
            .map(drop)
            .ok_or(LibraryError::NotFound(id))
    }
}
