//! Remote preset sharing: the public `presets` document collection.
//!
//! DESIGN
//! ======
//! The collection is reached through the [`RemoteStore`] trait so the session
//! never cares whether documents live behind HTTP or in process memory.
//! Documents carry the preset fields plus a server-assigned `createdAt`
//! timestamp (Unix millis) and an `isPublic` flag that is always `true` on
//! write. This crate never updates or deletes remote documents.

pub mod http;
pub mod memory;

use serde::{Deserialize, Serialize};

use crate::preset::{Preset, PresetCategory, PresetLight};

pub use http::HttpRemote;
pub use memory::MemoryRemote;

/// Name of the remote collection holding shared presets.
pub const PRESETS_COLLECTION: &str = "presets";
/// Most documents a public listing returns.
pub const DEFAULT_PUBLIC_LIMIT: usize = 50;

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// No remote service is configured for this session.
    #[error("online sharing is not configured")]
    NotConfigured,

    #[error("remote request failed: {0}")]
    Request(String),

    #[error("remote response error: status {status}")]
    Response { status: u16, body: String },

    #[error("remote response parse failed: {0}")]
    Parse(String),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    #[error("invalid remote URL: {0}")]
    InvalidUrl(String),
}

// =============================================================================
// DOCUMENTS
// =============================================================================

/// Preset fields sent when publishing. The service assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: PresetCategory,
    pub lights: Vec<PresetLight>,
}

impl From<&Preset> for PresetDraft {
    fn from(preset: &Preset) -> Self {
        Self {
            name: preset.name.clone(),
            description: preset.description.clone(),
            category: preset.category,
            lights: preset.lights.clone(),
        }
    }
}

/// A stored document in the `presets` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetDocument {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: PresetCategory,
    pub lights: Vec<PresetLight>,
    pub created_at: i64,
    pub is_public: bool,
}

impl PresetDocument {
    #[must_use]
    pub fn from_draft(id: String, draft: PresetDraft, created_at: i64) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            category: draft.category,
            lights: draft.lights,
            created_at,
            is_public: true,
        }
    }

    /// The preset this document shares, identified by the remote id.
    #[must_use]
    pub fn into_preset(self) -> Preset {
        Preset {
            id: self.id,
            name: self.name,
            description: self.description,
            category: self.category,
            lights: self.lights,
        }
    }
}

// =============================================================================
// TRAIT
// =============================================================================

/// Access to the shared `presets` collection.
#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync {
    /// Publish a preset publicly and return the id the service assigned.
    async fn publish(&self, preset: &Preset) -> Result<String, RemoteError>;

    /// Public presets, newest first, at most `limit` of them.
    async fn fetch_public(&self, limit: usize) -> Result<Vec<Preset>, RemoteError>;

    /// One preset by remote id. `Ok(None)` when no such document exists.
    async fn fetch_by_id(&self, id: &str) -> Result<Option<Preset>, RemoteError>;
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
