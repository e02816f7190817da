//! Pattern session: the practice workflow around one grid.
//!
//! DESIGN
//! ======
//! `PatternSession` owns everything a practice screen needs: the user's grid,
//! the selected colour, the role (teacher or student), the preset selected
//! for comparison and whether it is revealed, the save form, and the two
//! preset collections (local and the cached public listing).
//!
//! Every user action is a method. Side effects are explicit: local writes
//! happen inside the mutating call, and the only remote traffic is
//! `switch_role(Student)` / `refresh_public` (public listing), `save_and_share`
//! (publish) and `open_deep_link` (fetch by id).
//!
//! Selection is resolved against the local collection first, then the public
//! cache. A manually selected preset starts hidden; a deep-linked preset is
//! revealed immediately. Only presets in the local collection can be applied
//! to the grid.
//!
//! ERROR HANDLING
//! ==============
//! Validation and storage failures abort the save with nothing changed.
//! Publish failures never undo the local save; they come back as
//! `ShareOutcome::LocalOnly`. Public listing failures leave an empty cache and
//! an error message for display.

use std::sync::Arc;

use reqwest::Url;
use tracing::{debug, info, warn};

use crate::grid::{Grid, LightColor, PatternDiff};
use crate::preset::{Preset, PresetCollection, ValidationError};
use crate::remote::{DEFAULT_PUBLIC_LIMIT, RemoteError, RemoteStore};
use crate::store::{KeyValueStore, LocalPresetError, LocalPresets, StoreError};

/// Query parameter that carries a shared preset's remote id.
pub const DEEP_LINK_PARAM: &str = "preset";

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("preset not found: {0}")]
    NotFound(String),
    #[error("{action} is only available in teacher mode")]
    Forbidden { action: &'static str },
}

impl From<LocalPresetError> for SessionError {
    fn from(err: LocalPresetError) -> Self {
        match err {
            LocalPresetError::Validation(e) => Self::Validation(e),
            LocalPresetError::Storage(e) => Self::Storage(e),
        }
    }
}

// =============================================================================
// STATE TYPES
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Role {
    /// Creates and manages presets.
    #[default]
    Teacher,
    /// Picks presets to study.
    Student,
}

/// Progress of the save/share workflow.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SaveFlow {
    #[default]
    Idle,
    SavingLocal,
    SharingRemote,
    Shared {
        link: String,
    },
}

/// Name and description inputs of the save form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PresetForm {
    pub name: String,
    pub description: String,
}

/// Cached public listing. Replaced wholesale by each completed fetch.
#[derive(Clone, Debug, Default)]
pub struct PublicPresets {
    pub presets: PresetCollection,
    pub loading: bool,
    pub error: Option<String>,
}

/// Result of a save that also tried to share online.
#[derive(Debug)]
pub enum ShareOutcome {
    Shared { preset: Preset, remote_id: String, link: String },
    /// Saved locally; publishing failed or is not configured.
    LocalOnly { preset: Preset, error: RemoteError },
}

impl ShareOutcome {
    #[must_use]
    pub fn preset(&self) -> &Preset {
        match self {
            Self::Shared { preset, .. } | Self::LocalOnly { preset, .. } => preset,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SessionOptions {
    /// Page URL that share links are built on.
    pub share_base_url: Url,
    pub public_limit: usize,
}

impl SessionOptions {
    #[must_use]
    pub fn new(share_base_url: Url) -> Self {
        Self { share_base_url, public_limit: DEFAULT_PUBLIC_LIMIT }
    }
}

// =============================================================================
// LINKS
// =============================================================================

/// Shareable URL for a published preset: `base` with `preset=<id>` set.
#[must_use]
pub fn share_link(base: &Url, remote_id: &str) -> String {
    let mut url = base.clone();
    let kept: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != DEEP_LINK_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(DEEP_LINK_PARAM, remote_id);
    url.to_string()
}

/// Extract the shared preset id from a full URL or a bare query string.
#[must_use]
pub fn deep_link_id(input: &str) -> Option<String> {
    let input = input.trim();
    let url = Url::parse(input).or_else(|_| {
        let query = input.trim_start_matches('?');
        Url::parse(&format!("http://localhost/?{query}"))
    });
    let url = url.ok()?;
    url.query_pairs()
        .find(|(key, _)| key == DEEP_LINK_PARAM)
        .map(|(_, value)| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

// =============================================================================
// SESSION
// =============================================================================

pub struct PatternSession<S> {
    grid: Grid,
    selected_color: LightColor,
    selected: Option<Preset>,
    reveal: bool,
    role: Role,
    day_mode: bool,
    form: PresetForm,
    save_flow: SaveFlow,
    local: LocalPresets<S>,
    public: PublicPresets,
    remote: Option<Arc<dyn RemoteStore>>,
    options: SessionOptions,
}

impl<S: KeyValueStore> PatternSession<S> {
    /// Start a session in teacher mode with a blank grid and red selected.
    /// `remote = None` gives the offline variant.
    pub fn new(local: LocalPresets<S>, remote: Option<Arc<dyn RemoteStore>>, options: SessionOptions) -> Self {
        Self {
            grid: Grid::new(),
            selected_color: LightColor::Red,
            selected: None,
            reveal: false,
            role: Role::Teacher,
            day_mode: false,
            form: PresetForm::default(),
            save_flow: SaveFlow::Idle,
            local,
            public: PublicPresets::default(),
            remote,
            options,
        }
    }

    /// Set the starting role without any remote traffic. `start` then loads
    /// the public listing once for a student.
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn selected_color(&self) -> LightColor {
        self.selected_color
    }

    #[must_use]
    pub fn selected_preset(&self) -> Option<&Preset> {
        self.selected.as_ref()
    }

    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.reveal
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn is_day_mode(&self) -> bool {
        self.day_mode
    }

    #[must_use]
    pub fn form(&self) -> &PresetForm {
        &self.form
    }

    #[must_use]
    pub fn save_flow(&self) -> &SaveFlow {
        &self.save_flow
    }

    #[must_use]
    pub fn local_presets(&self) -> &PresetCollection {
        self.local.presets()
    }

    #[must_use]
    pub fn public_presets(&self) -> &PublicPresets {
        &self.public
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        self.remote.is_some()
    }

    /// Presets offered for selection: local ones for a teacher; local ones
    /// then public ones (minus duplicates) for a student.
    #[must_use]
    pub fn carousel(&self) -> Vec<&Preset> {
        let mut items: Vec<&Preset> = self.local.presets().iter().collect();
        if self.role == Role::Student {
            items.extend(self.public.presets.iter().filter(|p| !self.local.contains(&p.id)));
        }
        items
    }

    /// The preset to draw on the comparison grid: selected and revealed.
    #[must_use]
    pub fn comparison(&self) -> Option<&Preset> {
        self.selected.as_ref().filter(|_| self.reveal)
    }

    /// Cell-by-cell comparison of the grid with the revealed preset.
    #[must_use]
    pub fn compare_with_selection(&self) -> Option<PatternDiff> {
        self.comparison().map(|preset| self.grid.diff(preset))
    }

    // -------------------------------------------------------------------------
    // Grid editing
    // -------------------------------------------------------------------------

    /// Paint a cell with the selected colour.
    pub fn toggle_light(&mut self, cell: u32) -> bool {
        self.grid.toggle(cell, self.selected_color)
    }

    pub fn select_color(&mut self, color: LightColor) {
        self.selected_color = color;
    }

    pub fn reset_grid(&mut self) {
        self.grid.reset();
    }

    pub fn toggle_day_mode(&mut self) -> bool {
        self.day_mode = !self.day_mode;
        self.day_mode
    }

    // -------------------------------------------------------------------------
    // Save form
    // -------------------------------------------------------------------------

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.form.name = name.into();
        self.save_flow = SaveFlow::Idle;
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.form.description = description.into();
        self.save_flow = SaveFlow::Idle;
    }

    /// Save the current pattern under the form's name and description.
    /// Clears the form on success.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name or an empty grid, or a
    /// storage error if the local write fails. Nothing changes on error.
    pub fn save_local(&mut self) -> Result<Preset, SessionError> {
        self.save_flow = SaveFlow::SavingLocal;
        let result = self
            .local
            .create(&self.form.name, &self.form.description, self.grid.active_pattern());
        self.save_flow = SaveFlow::Idle;

        let preset = result?;
        self.form = PresetForm::default();
        Ok(preset)
    }

    /// Save locally, then publish and build a share link.
    ///
    /// # Errors
    ///
    /// Returns an error only when the local save fails. A failed publish is
    /// reported as [`ShareOutcome::LocalOnly`] and keeps the local preset.
    pub async fn save_and_share(&mut self) -> Result<ShareOutcome, SessionError> {
        let preset = self.save_local()?;

        let Some(remote) = self.remote.clone() else {
            return Ok(ShareOutcome::LocalOnly { preset, error: RemoteError::NotConfigured });
        };

        self.save_flow = SaveFlow::SharingRemote;
        match remote.publish(&preset).await {
            Ok(remote_id) => {
                let link = share_link(&self.options.share_base_url, &remote_id);
                info!(preset_id = %preset.id, remote_id = %remote_id, "preset shared");
                self.save_flow = SaveFlow::Shared { link: link.clone() };
                Ok(ShareOutcome::Shared { preset, remote_id, link })
            }
            Err(e) => {
                warn!(preset_id = %preset.id, error = %e, "preset publish failed; kept local copy");
                self.save_flow = SaveFlow::Idle;
                Ok(ShareOutcome::LocalOnly { preset, error: e })
            }
        }
    }

    // -------------------------------------------------------------------------
    // Roles and remote loading
    // -------------------------------------------------------------------------

    /// Handle the initial page query: open a deep-linked preset if one is
    /// named, then load the public listing if the session is in student mode.
    ///
    /// # Errors
    ///
    /// Returns a remote error if the deep-linked preset could not be fetched.
    /// A deep link to a missing preset is not an error.
    pub async fn start(&mut self, query: Option<&str>) -> Result<(), SessionError> {
        let deep_link = query.and_then(deep_link_id);
        let opened = match deep_link {
            Some(id) => self.open_deep_link(&id).await.map(|_| ()),
            None => Ok(()),
        };
        if self.role == Role::Student {
            self.refresh_public().await;
        }
        opened
    }

    /// Fetch a shared preset and show it revealed.
    ///
    /// Returns `Ok(None)` when no such preset exists; the session is then
    /// left as it was.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::NotConfigured`] offline, or the transport error.
    pub async fn open_deep_link(&mut self, remote_id: &str) -> Result<Option<&Preset>, SessionError> {
        let Some(remote) = self.remote.clone() else {
            return Err(RemoteError::NotConfigured.into());
        };

        match remote.fetch_by_id(remote_id).await? {
            Some(preset) => {
                debug!(remote_id = %remote_id, "opened shared preset");
                self.selected = Some(preset);
                self.reveal = true;
                Ok(self.selected.as_ref())
            }
            None => {
                debug!(remote_id = %remote_id, "shared preset not found");
                Ok(None)
            }
        }
    }

    /// Change role. Switching to student loads the public listing.
    pub async fn switch_role(&mut self, role: Role) {
        self.role = role;
        if role == Role::Student {
            self.refresh_public().await;
        }
    }

    /// Reload the public listing now.
    pub async fn refresh_public(&mut self) {
        let Some((remote, limit)) = self.begin_public_fetch() else {
            return;
        };
        let result = remote.fetch_public(limit).await;
        self.finish_public_fetch(result);
    }

    /// Mark a public listing fetch as in flight and hand back what is needed
    /// to run it. `None` when offline.
    pub fn begin_public_fetch(&mut self) -> Option<(Arc<dyn RemoteStore>, usize)> {
        let remote = self.remote.clone()?;
        self.public.loading = true;
        Some((remote, self.options.public_limit))
    }

    /// Store the outcome of a public listing fetch. The latest completion
    /// wins regardless of the current role.
    pub fn finish_public_fetch(&mut self, result: Result<Vec<Preset>, RemoteError>) {
        self.public.loading = false;
        match result {
            Ok(presets) => {
                debug!(count = presets.len(), "public presets loaded");
                self.public.presets = presets.into_iter().collect();
                self.public.error = None;
            }
            Err(e) => {
                warn!(error = %e, "public presets unavailable");
                self.public.presets.clear();
                self.public.error = Some(e.to_string());
            }
        }
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    /// Select a preset for comparison. It starts hidden.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if neither collection holds the id.
    pub fn select_preset(&mut self, id: &str) -> Result<&Preset, SessionError> {
        let preset = self
            .local
            .get(id)
            .or_else(|| self.public.presets.get(id))
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.to_owned()))?;
        self.reveal = false;
        Ok(self.selected.insert(preset))
    }

    /// Show or hide the selected preset. Returns `false` if nothing is selected.
    pub fn toggle_reveal(&mut self) -> bool {
        if self.selected.is_none() {
            return false;
        }
        self.reveal = !self.reveal;
        true
    }

    /// Copy the selected preset onto the grid. Only local presets can be
    /// applied; returns whether the grid changed.
    pub fn apply_selected(&mut self) -> bool {
        let Some(selected) = &self.selected else {
            return false;
        };
        let Some(preset) = self.local.get(&selected.id) else {
            return false;
        };
        self.grid.apply_preset(preset);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.reveal = false;
    }

    /// Delete a local preset after `confirm` agrees. Clears the selection if
    /// it pointed at the deleted preset. Returns whether anything was deleted.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` outside teacher mode, `NotFound` for an unknown
    /// id, or a storage error if the write fails.
    pub fn delete_preset(&mut self, id: &str, confirm: impl FnOnce(&Preset) -> bool) -> Result<bool, SessionError> {
        if self.role != Role::Teacher {
            return Err(SessionError::Forbidden { action: "deleting presets" });
        }
        let Some(preset) = self.local.get(id) else {
            return Err(SessionError::NotFound(id.to_owned()));
        };
        if !confirm(preset) {
            return Ok(false);
        }

        self.local.delete(id)?;
        if self.selected.as_ref().is_some_and(|p| p.id == id) {
            self.clear_selection();
        }
        Ok(true)
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
