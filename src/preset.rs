//! Preset records: named, immutable light patterns.
//!
//! DESIGN
//! ======
//! A preset stores only its lit cells (`lights`); any cell not listed is
//! dark. Presets are never edited after creation, so every constructor
//! validates once and the record is treated as read-only afterwards.
//!
//! Collections keep insertion order so listings show presets in the order
//! they were saved, and they serialize as a JSON object keyed by preset id.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::grid::{CELL_COUNT, LightColor};

/// Description stored when the user leaves the field blank.
pub const DEFAULT_DESCRIPTION: &str = "Custom pattern";

const PRESET_ID_PREFIX: &str = "custom_";

// =============================================================================
// ERROR
// =============================================================================

/// Reasons a draft cannot become a preset.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("please enter a name for your preset")]
    EmptyName,
    #[error("please add at least one light to your pattern before saving")]
    EmptyPattern,
    #[error("cell {0} is outside the grid")]
    InvalidCell(u32),
    #[error("cell {0} appears more than once")]
    DuplicateCell(u32),
}

// =============================================================================
// RECORDS
// =============================================================================

/// One lit cell of a preset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetLight {
    pub id: u32,
    pub color: LightColor,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetCategory {
    #[default]
    Custom,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: PresetCategory,
    pub lights: Vec<PresetLight>,
}

impl Preset {
    /// Validate a draft and build a custom preset with the given id.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the name is blank, the pattern is
    /// empty, or a light references a missing or repeated cell.
    pub fn new(id: String, name: &str, description: &str, lights: Vec<PresetLight>) -> Result<Self, ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        validate_lights(&lights)?;

        let description = if description.trim().is_empty() { DEFAULT_DESCRIPTION } else { description };
        Ok(Self {
            id,
            name: name.to_owned(),
            description: description.to_owned(),
            category: PresetCategory::Custom,
            lights,
        })
    }

    /// Colour recorded for a cell, if the preset lights it.
    #[must_use]
    pub fn color_of(&self, cell: u32) -> Option<LightColor> {
        self.lights.iter().find(|light| light.id == cell).map(|light| light.color)
    }
}

/// Check that a pattern is non-empty and every cell is valid and unique.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn validate_lights(lights: &[PresetLight]) -> Result<(), ValidationError> {
    if lights.is_empty() {
        return Err(ValidationError::EmptyPattern);
    }
    let mut seen = HashSet::with_capacity(lights.len());
    for light in lights {
        if light.id as usize >= CELL_COUNT {
            return Err(ValidationError::InvalidCell(light.id));
        }
        if !seen.insert(light.id) {
            return Err(ValidationError::DuplicateCell(light.id));
        }
    }
    Ok(())
}

// =============================================================================
// COLLECTION
// =============================================================================

/// Insertion-ordered mapping of preset id to preset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetCollection {
    entries: IndexMap<String, Preset>,
}

impl PresetCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Preset> {
        self.entries.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Insert or replace a preset, keyed by its own id.
    pub fn insert(&mut self, preset: Preset) {
        self.entries.insert(preset.id.clone(), preset);
    }

    /// Remove a preset, keeping the order of the remaining entries.
    pub fn remove(&mut self, id: &str) -> Option<Preset> {
        self.entries.shift_remove(id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.entries.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Preset> for PresetCollection {
    fn from_iter<I: IntoIterator<Item = Preset>>(iter: I) -> Self {
        let mut collection = Self::new();
        for preset in iter {
            collection.insert(preset);
        }
        collection
    }
}

// =============================================================================
// IDS
// =============================================================================

/// Milliseconds since the Unix epoch, or 0 if the clock is before it.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

/// Time-based preset ids (`custom_<millis>`), bumped forward when two ids
/// would land on the same millisecond.
#[derive(Debug, Default)]
pub struct PresetIds {
    last_ms: i64,
}

impl PresetIds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start after the newest `custom_<millis>` id among `existing`, so new
    /// ids never collide with stored ones even if the clock goes backwards.
    pub fn after<'a>(existing: impl IntoIterator<Item = &'a str>) -> Self {
        let last_ms = existing
            .into_iter()
            .filter_map(|id| id.strip_prefix(PRESET_ID_PREFIX)?.parse::<i64>().ok())
            .max()
            .unwrap_or(0);
        Self { last_ms }
    }

    pub fn next_at(&mut self, now_ms: i64) -> String {
        let ms = if now_ms > self.last_ms { now_ms } else { self.last_ms + 1 };
        self.last_ms = ms;
        format!("{PRESET_ID_PREFIX}{ms}")
    }

    pub fn next_id(&mut self) -> String {
        self.next_at(now_ms())
    }
}

#[cfg(test)]
#[path = "preset_test.rs"]
mod tests;
