//! Grid model: the fixed 12x8 board of signal lights.
//!
//! DESIGN
//! ======
//! The grid always holds exactly `CELL_COUNT` lights in row-major order, so a
//! light's id doubles as its index (`id = y * GRID_COLUMNS + x`). Mutations
//! address cells by id; ids outside the grid are ignored rather than treated
//! as errors, which keeps click handling total.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::preset::{Preset, PresetLight};

pub const GRID_COLUMNS: u32 = 12;
pub const GRID_ROWS: u32 = 8;
pub const CELL_COUNT: usize = (GRID_COLUMNS * GRID_ROWS) as usize;

// =============================================================================
// COLOR
// =============================================================================

/// Colours a navigation light can show.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LightColor {
    #[default]
    White,
    Red,
    Green,
    Yellow,
    FlashingYellow,
    Blue,
}

impl LightColor {
    /// Swatch order as presented to the user.
    pub const SWATCHES: [Self; 6] = [Self::Red, Self::Green, Self::White, Self::Yellow, Self::FlashingYellow, Self::Blue];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Red => "red",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::FlashingYellow => "flashing-yellow",
            Self::Blue => "blue",
        }
    }

    /// Single-letter symbol used by text renderings.
    #[must_use]
    pub fn symbol(self) -> char {
        match self {
            Self::White => 'W',
            Self::Red => 'R',
            Self::Green => 'G',
            Self::Yellow => 'Y',
            Self::FlashingYellow => 'F',
            Self::Blue => 'B',
        }
    }
}

impl fmt::Display for LightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown light color: {0}")]
pub struct ParseColorError(pub String);

impl FromStr for LightColor {
    type Err = ParseColorError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "white" | "w" => Ok(Self::White),
            "red" | "r" => Ok(Self::Red),
            "green" | "g" => Ok(Self::Green),
            "yellow" | "y" => Ok(Self::Yellow),
            "flashing-yellow" | "flashing_yellow" | "f" => Ok(Self::FlashingYellow),
            "blue" | "b" => Ok(Self::Blue),
            _ => Err(ParseColorError(raw.to_owned())),
        }
    }
}

// =============================================================================
// LIGHT
// =============================================================================

/// One cell of the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Light {
    pub id: u32,
    pub active: bool,
    pub color: LightColor,
    pub x: u32,
    pub y: u32,
}

/// Cell id for a column/row pair, or `None` when outside the grid.
#[must_use]
pub fn cell_id(x: u32, y: u32) -> Option<u32> {
    (x < GRID_COLUMNS && y < GRID_ROWS).then(|| y * GRID_COLUMNS + x)
}

// =============================================================================
// GRID
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    lights: Vec<Light>,
}

impl Grid {
    /// Build a fresh grid: every cell inactive and white.
    #[must_use]
    pub fn new() -> Self {
        let mut lights = Vec::with_capacity(CELL_COUNT);
        for y in 0..GRID_ROWS {
            for x in 0..GRID_COLUMNS {
                lights.push(Light { id: y * GRID_COLUMNS + x, active: false, color: LightColor::White, x, y });
            }
        }
        Self { lights }
    }

    #[must_use]
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    #[must_use]
    pub fn light(&self, id: u32) -> Option<&Light> {
        self.lights.get(id as usize)
    }

    #[must_use]
    pub fn light_at(&self, x: u32, y: u32) -> Option<&Light> {
        cell_id(x, y).and_then(|id| self.light(id))
    }

    /// Paint a cell with `color`.
    ///
    /// The cell ends up active unless it was already active with the same
    /// colour; that re-click switches it off. Returns `false` when `id` is
    /// outside the grid.
    pub fn toggle(&mut self, id: u32, color: LightColor) -> bool {
        let Some(light) = self.lights.get_mut(id as usize) else {
            return false;
        };
        light.active = !light.active || light.color != color;
        light.color = color;
        true
    }

    /// Deactivate every cell. Colours are left as they were.
    pub fn reset(&mut self) {
        for light in &mut self.lights {
            light.active = false;
        }
    }

    /// Replace the pattern with the one recorded in `preset`.
    pub fn apply_preset(&mut self, preset: &Preset) {
        self.reset();
        for preset_light in &preset.lights {
            if let Some(light) = self.lights.get_mut(preset_light.id as usize) {
                light.active = true;
                light.color = preset_light.color;
            }
        }
    }

    /// Active cells in ascending id order, in the sparse form presets store.
    #[must_use]
    pub fn active_pattern(&self) -> Vec<PresetLight> {
        self.lights
            .iter()
            .filter(|light| light.active)
            .map(|light| PresetLight { id: light.id, color: light.color })
            .collect()
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.lights.iter().filter(|light| light.active).count()
    }

    /// Compare the current pattern against a preset, cell by cell.
    #[must_use]
    pub fn diff(&self, preset: &Preset) -> PatternDiff {
        let mut expected: Vec<Option<LightColor>> = vec![None; CELL_COUNT];
        for preset_light in &preset.lights {
            if let Some(slot) = expected.get_mut(preset_light.id as usize) {
                *slot = Some(preset_light.color);
            }
        }

        let mut diff = PatternDiff::default();
        for (light, want) in self.lights.iter().zip(expected) {
            match (light.active, want) {
                (true, Some(color)) if light.color == color => diff.matched.push(light.id),
                (true, Some(color)) => {
                    diff.wrong_color.push(ColorMismatch { id: light.id, expected: color, actual: light.color });
                }
                (true, None) => diff.extra.push(PresetLight { id: light.id, color: light.color }),
                (false, Some(color)) => diff.missing.push(PresetLight { id: light.id, color }),
                (false, None) => {}
            }
        }
        diff
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// DIFF
// =============================================================================

/// A cell lit in both patterns but with different colours.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorMismatch {
    pub id: u32,
    pub expected: LightColor,
    pub actual: LightColor,
}

/// Result of comparing the user's grid with a preset. All lists ascend by id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatternDiff {
    /// Cells lit with the expected colour.
    pub matched: Vec<u32>,
    /// Cells the preset lights but the grid does not.
    pub missing: Vec<PresetLight>,
    /// Cells the grid lights but the preset does not.
    pub extra: Vec<PresetLight>,
    pub wrong_color: Vec<ColorMismatch>,
}

impl PatternDiff {
    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty() && self.wrong_color.is_empty()
    }
}

#[cfg(test)]
#[path = "grid_test.rs"]
mod tests;
