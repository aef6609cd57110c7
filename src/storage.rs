//! Folder Manager
//!
//! Layout: `<root>/<KindRoot>/<PersonName>/{photo.jpg, IDcard.jpg, card.json}`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::schema::CardKind;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No folders found in {}", .0.display())]
    NoFolders(PathBuf),

    #[error("Invalid choice: {0}")]
    InvalidSelection(String),
}

/// Per-kind person folders under an explicit storage root.
#[derive(Debug, Clone)]
pub struct CardStore {
    root: PathBuf,
}

impl CardStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn card_root(&self, kind: CardKind) -> PathBuf {
        self.root.join(kind.root_dir())
    }

    pub fn person_folder(&self, kind: CardKind, name: &str) -> PathBuf {
        self.card_root(kind).join(name)
    }

    /// Idempotent; an existing folder and its files are left as they are.
    pub fn create_person_folder(&self, kind: CardKind, name: &str) -> Result<PathBuf, StoreError> {
        let folder = self.person_folder(kind, name);
        fs::create_dir_all(&folder)?;
        debug!(folder = %folder.display(), "person folder ready");
        Ok(folder)
    }

    /// Immediate subdirectories of the kind root, in enumeration order.
    pub fn list_people(&self, kind: CardKind) -> Result<Vec<String>, StoreError> {
        let card_root = self.card_root(kind);
        if !card_root.exists() {
            return Ok(vec![]);
        }

        let mut people = vec![];
        for entry in fs::read_dir(&card_root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                people.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(people)
    }

    /// Delete the person folder picked by `choose`.
    ///
    /// `choose` receives the folder names and returns the operator's raw
    /// answer, read as a 1-based index. Nothing is removed unless the answer
    /// names an existing entry.
    pub fn delete_person_folder<F>(&self, kind: CardKind, choose: F) -> Result<PathBuf, StoreError>
    where
        F: FnOnce(&[String]) -> io::Result<String>,
    {
        let people = self.list_people(kind)?;
        if people.is_empty() {
            return Err(StoreError::NoFolders(self.card_root(kind)));
        }

        let answer = choose(&people)?;
        let index = answer
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|i| (1..=people.len()).contains(i))
            .ok_or_else(|| StoreError::InvalidSelection(answer.trim().to_string()))?;

        let target = self.card_root(kind).join(&people[index - 1]);
        fs::remove_dir_all(&target)?;
        info!(folder = %target.display(), "deleted person folder");
        Ok(target)
    }
}
