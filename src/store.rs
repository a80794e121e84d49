//! Caught-Pokemon storage
//!
//! Holds caught Pokemon in memory and persists them as a single pretty-printed
//! JSON object mapping names to stat records.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use thiserror::Error;
use tracing::{debug, info};

use crate::data::Pokemon;

/// File name of the saved pokedex
const POKEDEX_FILE_NAME: &str = "pokedex.json";

/// Errors that can occur while loading or saving the pokedex
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading, writing or creating the directory failed
    #[error("pokedex file error: {0}")]
    Io(#[from] io::Error),

    /// The file contents could not be (de)serialized
    #[error("pokedex file is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Returns the default location of the saved pokedex
///
/// Uses the XDG data directory (`~/.local/share/pokedex/` on Linux), falling
/// back to `data/pokedex.json` relative to the working directory when no home
/// directory can be determined.
pub fn default_pokedex_path() -> PathBuf {
    ProjectDirs::from("", "", "pokedex")
        .map(|dirs| dirs.data_dir().join(POKEDEX_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from("data").join(POKEDEX_FILE_NAME))
}

/// The caught Pokemon, keyed by the name they were caught under
#[derive(Debug, Clone)]
pub struct Pokedex {
    path: PathBuf,
    caught: BTreeMap<String, Pokemon>,
}

impl Pokedex {
    /// Creates an empty pokedex that will be saved to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            caught: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records a caught Pokemon, replacing any earlier catch of the same name
    pub fn add(&mut self, name: impl Into<String>, pokemon: Pokemon) {
        self.caught.insert(name.into(), pokemon);
    }

    pub fn get(&self, name: &str) -> Option<&Pokemon> {
        self.caught.get(name)
    }

    /// All caught Pokemon, ordered by name
    pub fn all(&self) -> &BTreeMap<String, Pokemon> {
        &self.caught
    }

    pub fn len(&self) -> usize {
        self.caught.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caught.is_empty()
    }

    /// Writes every caught Pokemon to the pokedex file
    ///
    /// Creates parent directories as needed. The file is overwritten in place.
    pub fn save(&self) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let json = serde_json::to_string_pretty(&self.caught)?;
        fs::write(&self.path, json)?;

        info!(path = %self.path.display(), count = self.caught.len(), "saved pokedex");
        Ok(())
    }

    /// Replaces the in-memory contents with the pokedex file
    ///
    /// A missing file is not an error; the pokedex is simply left empty.
    pub fn load(&mut self) -> Result<(), StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no saved pokedex yet");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        self.caught = serde_json::from_str(&content)?;
        info!(path = %self.path.display(), count = self.caught.len(), "loaded pokedex");
        Ok(())
    }
}
