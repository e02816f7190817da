//! Local preset storage.
//!
//! DESIGN
//! ======
//! Presets live under one key of a small key-value store, serialized as a
//! JSON object of preset id to preset. Every mutation rewrites the whole
//! value: the updated collection is persisted first and only then swapped
//! into memory, so the in-memory copy never runs ahead of storage.
//!
//! ERROR HANDLING
//! ==============
//! Reads fail soft. A missing key, unreadable file, or malformed value all
//! load as an empty collection (with a warning), because a broken local
//! cache must not block the practice session. Writes report errors.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::preset::{Preset, PresetCollection, PresetIds, PresetLight, ValidationError};

/// Key under which the custom preset collection is stored.
pub const PRESETS_STORAGE_KEY: &str = "colregs-custom-presets";

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serialize failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum LocalPresetError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

// =============================================================================
// KEY-VALUE BACKENDS
// =============================================================================

/// String key-value storage, the shape of a browser's local storage.
pub trait KeyValueStore {
    /// Read a value. `Ok(None)` when the key has never been written.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrite a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Process-local store, used by tests and throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

// =============================================================================
// LOAD / SAVE
// =============================================================================

/// Read the preset collection. Never fails: problems load as empty.
/// Entries are re-keyed by their own `id`.
pub fn load_local(store: &impl KeyValueStore) -> PresetCollection {
    let raw = match store.get(PRESETS_STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return PresetCollection::new(),
        Err(e) => {
            warn!(error = %e, "local preset storage unreadable; starting empty");
            return PresetCollection::new();
        }
    };

    match serde_json::from_str::<IndexMap<String, Preset>>(&raw) {
        Ok(entries) => {
            let collection: PresetCollection = entries
                .into_iter()
                .map(|(key, preset)| {
                    if key != preset.id {
                        warn!(key = %key, preset_id = %preset.id, "stored preset key differs from its id; keyed by id");
                    }
                    preset
                })
                .collect();
            debug!(count = collection.len(), "loaded local presets");
            collection
        }
        Err(e) => {
            warn!(error = %e, "local preset storage malformed; starting empty");
            PresetCollection::new()
        }
    }
}

/// Persist the full collection, replacing whatever was stored.
///
/// # Errors
///
/// Returns an error if serialization or the backend write fails.
pub fn save_local(store: &mut impl KeyValueStore, collection: &PresetCollection) -> Result<(), StoreError> {
    let raw = serde_json::to_string(collection)?;
    store.set(PRESETS_STORAGE_KEY, &raw)
}

// =============================================================================
// LOCAL PRESETS
// =============================================================================

/// The session's own presets, mirrored to a key-value store.
pub struct LocalPresets<S> {
    store: S,
    presets: PresetCollection,
    ids: PresetIds,
}

impl<S: KeyValueStore> LocalPresets<S> {
    /// Load whatever the store holds.
    pub fn load(store: S) -> Self {
        let presets = load_local(&store);
        let ids = PresetIds::after(presets.iter().map(|preset| preset.id.as_str()));
        Self { store, presets, ids }
    }

    #[must_use]
    pub fn presets(&self) -> &PresetCollection {
        &self.presets
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Preset> {
        self.presets.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.presets.contains(id)
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate and save a new preset.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name or empty pattern (nothing
    /// is written), or a storage error if persisting fails (the in-memory
    /// collection is left unchanged).
    pub fn create(
        &mut self,
        name: &str,
        description: &str,
        lights: Vec<PresetLight>,
    ) -> Result<Preset, LocalPresetError> {
        let preset = Preset::new(self.ids.next_id(), name, description, lights)?;

        let mut updated = self.presets.clone();
        updated.insert(preset.clone());
        save_local(&mut self.store, &updated)?;
        self.presets = updated;

        info!(preset_id = %preset.id, lights = preset.lights.len(), "preset saved locally");
        Ok(preset)
    }

    /// Remove a preset. Returns the removed preset, or `None` if the id was
    /// unknown (in which case nothing is written).
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails; the preset is then kept.
    pub fn delete(&mut self, id: &str) -> Result<Option<Preset>, StoreError> {
        if !self.presets.contains(id) {
            return Ok(None);
        }

        let mut updated = self.presets.clone();
        let removed = updated.remove(id);
        save_local(&mut self.store, &updated)?;
        self.presets = updated;

        info!(preset_id = %id, "preset deleted");
        Ok(removed)
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
