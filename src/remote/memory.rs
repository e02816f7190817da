//! In-process `presets` collection.
//!
//! Backs the HTTP service and stands in for it in tests. Writes mark the
//! collection dirty so the service's persistence task knows when to flush.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PresetDocument, PresetDraft, RemoteError, RemoteStore};
use crate::preset::{Preset, now_ms};

#[derive(Default)]
struct CollectionState {
    /// Documents in insertion order.
    documents: IndexMap<String, PresetDocument>,
    dirty: bool,
}

/// Shared handle to an in-memory document collection. Clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryRemote {
    inner: Arc<RwLock<CollectionState>>,
}

impl MemoryRemote {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from previously stored documents. Starts clean.
    #[must_use]
    pub fn from_documents(documents: Vec<PresetDocument>) -> Self {
        let documents = documents.into_iter().map(|doc| (doc.id.clone(), doc)).collect();
        Self { inner: Arc::new(RwLock::new(CollectionState { documents, dirty: false })) }
    }

    /// Add a document with a fresh id and the current time as `createdAt`.
    pub async fn add(&self, draft: PresetDraft) -> PresetDocument {
        self.add_at(draft, now_ms()).await
    }

    /// Add a document with an explicit `createdAt`.
    pub async fn add_at(&self, draft: PresetDraft, created_at: i64) -> PresetDocument {
        let id = Uuid::new_v4().simple().to_string();
        let doc = PresetDocument::from_draft(id, draft, created_at);
        let mut state = self.inner.write().await;
        state.documents.insert(doc.id.clone(), doc.clone());
        state.dirty = true;
        doc
    }

    pub async fn get(&self, id: &str) -> Option<PresetDocument> {
        self.inner.read().await.documents.get(id).cloned()
    }

    /// Public documents ordered by `createdAt` descending, capped at `limit`.
    /// Documents sharing a timestamp list the later-added one first.
    pub async fn query_public(&self, limit: usize) -> Vec<PresetDocument> {
        let state = self.inner.read().await;
        let mut docs: Vec<PresetDocument> = state.documents.values().rev().filter(|doc| doc.is_public).cloned().collect();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        docs.truncate(limit);
        docs
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.documents.is_empty()
    }

    /// Take a copy of every document if anything changed since the last
    /// snapshot, clearing the dirty flag.
    pub async fn take_dirty_snapshot(&self) -> Option<Vec<PresetDocument>> {
        let mut state = self.inner.write().await;
        if !state.dirty {
            return None;
        }
        state.dirty = false;
        Some(state.documents.values().cloned().collect())
    }

    /// Flag the collection dirty again after a failed flush.
    pub async fn mark_dirty(&self) {
        self.inner.write().await.dirty = true;
    }
}

#[async_trait::async_trait]
impl RemoteStore for MemoryRemote {
    async fn publish(&self, preset: &Preset) -> Result<String, RemoteError> {
        let doc = self.add(PresetDraft::from(preset)).await;
        Ok(doc.id)
    }

    async fn fetch_public(&self, limit: usize) -> Result<Vec<Preset>, RemoteError> {
        Ok(self
            .query_public(limit)
            .await
            .into_iter()
            .map(PresetDocument::into_preset)
            .collect())
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<Preset>, RemoteError> {
        Ok(self.get(id).await.map(PresetDocument::into_preset))
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
