//! Line commands and text rendering for the interactive practice session.
//!
//! Grids render one row per line, a letter per lit cell (`W R G Y F B`) and
//! `.` for a dark one.

use crate::grid::{GRID_COLUMNS, GRID_ROWS, Grid, LightColor, ParseColorError, PatternDiff, cell_id};
use crate::preset::{Preset, PresetLight};
use crate::session::Role;

pub const HELP: &str = "\
commands:
  toggle <cell> | at <x> <y>   paint a cell; same colour again clears it
  color <name>                 red, green, white, yellow, flashing-yellow, blue
  reset                        darken every cell
  name <text> | desc <text>    fill in the save form
  save | share                 save locally (and publish with share)
  list | refresh               show the carousel / reload public presets
  select <id> | reveal | apply | clear
  compare                      diff the grid against the revealed preset
  delete <id>                  remove a local preset (teacher only)
  role teacher|student | day | open <link>
  show | help | quit";

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),
    #[error("'{command}' needs {expected}")]
    MissingArgument { command: &'static str, expected: &'static str },
    #[error("invalid cell '{0}'")]
    InvalidCell(String),
    #[error(transparent)]
    Color(#[from] ParseColorError),
    #[error("unknown role '{0}', expected teacher or student")]
    Role(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PracticeCommand {
    Toggle(u32),
    Color(LightColor),
    Reset,
    Name(String),
    Description(String),
    Save,
    Share,
    List,
    Refresh,
    Select(String),
    Reveal,
    Apply,
    Clear,
    Compare,
    Delete(String),
    Role(Role),
    Day,
    Open(String),
    Show,
    Help,
    Quit,
}

/// Parse one input line.
///
/// # Errors
///
/// Returns an error for blank input, an unknown verb, or a bad argument.
pub fn parse_command(line: &str) -> Result<PracticeCommand, CommandError> {
    let line = line.trim();
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let command = match verb.to_ascii_lowercase().as_str() {
        "" => return Err(CommandError::Empty),
        "toggle" | "t" => PracticeCommand::Toggle(parse_cell(required(rest, "toggle", "a cell id")?)?),
        "at" => {
            let mut parts = rest.split_whitespace();
            let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err(CommandError::MissingArgument { command: "at", expected: "a column and a row" });
            };
            let id = match (x.parse::<u32>(), y.parse::<u32>()) {
                (Ok(x), Ok(y)) => cell_id(x, y),
                _ => None,
            };
            PracticeCommand::Toggle(id.ok_or_else(|| CommandError::InvalidCell(rest.to_owned()))?)
        }
        "color" | "c" => PracticeCommand::Color(required(rest, "color", "a colour")?.parse()?),
        "reset" => PracticeCommand::Reset,
        "name" => PracticeCommand::Name(rest.to_owned()),
        "desc" | "description" => PracticeCommand::Description(rest.to_owned()),
        "save" => PracticeCommand::Save,
        "share" => PracticeCommand::Share,
        "list" | "ls" => PracticeCommand::List,
        "refresh" => PracticeCommand::Refresh,
        "select" => PracticeCommand::Select(required(rest, "select", "a preset id")?.to_owned()),
        "reveal" => PracticeCommand::Reveal,
        "apply" => PracticeCommand::Apply,
        "clear" => PracticeCommand::Clear,
        "compare" => PracticeCommand::Compare,
        "delete" | "rm" => PracticeCommand::Delete(required(rest, "delete", "a preset id")?.to_owned()),
        "role" => PracticeCommand::Role(parse_role(required(rest, "role", "teacher or student")?)?),
        "day" => PracticeCommand::Day,
        "open" => PracticeCommand::Open(required(rest, "open", "a share link")?.to_owned()),
        "show" => PracticeCommand::Show,
        "help" | "?" => PracticeCommand::Help,
        "quit" | "exit" | "q" => PracticeCommand::Quit,
        other => return Err(CommandError::Unknown(other.to_owned())),
    };
    Ok(command)
}

fn required<'a>(rest: &'a str, command: &'static str, expected: &'static str) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        return Err(CommandError::MissingArgument { command, expected });
    }
    Ok(rest)
}

fn parse_cell(raw: &str) -> Result<u32, CommandError> {
    raw.parse::<u32>()
        .ok()
        .filter(|&id| cell_id(id % GRID_COLUMNS, id / GRID_COLUMNS).is_some())
        .ok_or_else(|| CommandError::InvalidCell(raw.to_owned()))
}

fn parse_role(raw: &str) -> Result<Role, CommandError> {
    match raw.to_ascii_lowercase().as_str() {
        "teacher" => Ok(Role::Teacher),
        "student" => Ok(Role::Student),
        _ => Err(CommandError::Role(raw.to_owned())),
    }
}

// =============================================================================
// RENDERING
// =============================================================================

fn render_cells(cells: impl IntoIterator<Item = PresetLight>) -> String {
    let mut rows = vec![vec!['.'; GRID_COLUMNS as usize]; GRID_ROWS as usize];
    for cell in cells {
        let (x, y) = ((cell.id % GRID_COLUMNS) as usize, (cell.id / GRID_COLUMNS) as usize);
        if let Some(slot) = rows.get_mut(y).and_then(|row| row.get_mut(x)) {
            *slot = cell.color.symbol();
        }
    }
    rows.into_iter()
        .map(|row| row.into_iter().map(String::from).collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

#[must_use]
pub fn render_grid(grid: &Grid) -> String {
    render_cells(grid.active_pattern())
}

#[must_use]
pub fn render_preset(preset: &Preset) -> String {
    render_cells(preset.lights.iter().copied())
}

/// One-line preset summary for listings.
#[must_use]
pub fn describe_preset(preset: &Preset) -> String {
    format!("{}  {} ({} lights) - {}", preset.id, preset.name, preset.lights.len(), preset.description)
}

#[must_use]
pub fn render_diff(diff: &PatternDiff) -> String {
    if diff.is_exact() {
        return format!("exact match ({} lights)", diff.matched.len());
    }
    let mut lines = vec![format!("matched: {}", diff.matched.len())];
    if !diff.missing.is_empty() {
        lines.push(format!("missing: {}", join_lights(&diff.missing)));
    }
    if !diff.extra.is_empty() {
        lines.push(format!("extra: {}", join_lights(&diff.extra)));
    }
    for mismatch in &diff.wrong_color {
        lines.push(format!("cell {}: expected {}, got {}", mismatch.id, mismatch.expected, mismatch.actual));
    }
    lines.join("\n")
}

fn join_lights(lights: &[PresetLight]) -> String {
    lights
        .iter()
        .map(|light| format!("{}:{}", light.id, light.color.symbol()))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[path = "practice_test.rs"]
mod tests;
