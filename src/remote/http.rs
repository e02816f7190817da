//! HTTP client for the presets service.
//!
//! Thin wrapper over `POST /api/presets`, `GET /api/presets?limit=N` and
//! `GET /api/presets/{id}`. Response parsing is kept in pure functions for
//! testability. No timeout is configured; requests rely on the transport's
//! own defaults.

use reqwest::{StatusCode, Url};
use serde::Deserialize;

use super::{PresetDocument, PresetDraft, RemoteError, RemoteStore};
use crate::preset::Preset;

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpRemote {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpRemote {
    /// Build a client for the service rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse or the HTTP client fails
    /// to build.
    pub fn new(base_url: &str) -> Result<Self, RemoteError> {
        let base_url = parse_base_url(base_url)?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| RemoteError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn presets_url(&self) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["api", "presets"]);
        }
        url
    }

    fn preset_url(&self, id: &str) -> Url {
        let mut url = self.presets_url();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(id);
        }
        url
    }
}

fn parse_base_url(raw: &str) -> Result<Url, RemoteError> {
    let url = Url::parse(raw).map_err(|e| RemoteError::InvalidUrl(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(RemoteError::InvalidUrl(raw.to_owned()));
    }
    Ok(url)
}

async fn read_body(response: reqwest::Response) -> Result<(StatusCode, String), RemoteError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| RemoteError::Request(e.to_string()))?;
    Ok((status, text))
}

#[async_trait::async_trait]
impl RemoteStore for HttpRemote {
    async fn publish(&self, preset: &Preset) -> Result<String, RemoteError> {
        let response = self
            .http
            .post(self.presets_url())
            .json(&PresetDraft::from(preset))
            .send()
            .await
            .map_err(|e| RemoteError::Request(e.to_string()))?;

        let (status, text) = read_body(response).await?;
        if !status.is_success() {
            return Err(RemoteError::Response { status: status.as_u16(), body: text });
        }
        parse_created(&text)
    }

    async fn fetch_public(&self, limit: usize) -> Result<Vec<Preset>, RemoteError> {
        let mut url = self.presets_url();
        url.query_pairs_mut().append_pair("limit", &limit.to_string());

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| RemoteError::Request(e.to_string()))?;

        let (status, text) = read_body(response).await?;
        if !status.is_success() {
            return Err(RemoteError::Response { status: status.as_u16(), body: text });
        }
        parse_document_list(&text)
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<Preset>, RemoteError> {
        let response = self
            .http
            .get(self.preset_url(id))
            .send()
            .await
            .map_err(|e| RemoteError::Request(e.to_string()))?;

        let (status, text) = read_body(response).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(RemoteError::Response { status: status.as_u16(), body: text });
        }
        parse_document(&text).map(Some)
    }
}

// =============================================================================
// PARSING
// =============================================================================

#[derive(Deserialize)]
struct CreatedResponse {
    id: String,
}

fn parse_created(json: &str) -> Result<String, RemoteError> {
    let created: CreatedResponse = serde_json::from_str(json).map_err(|e| RemoteError::Parse(e.to_string()))?;
    Ok(created.id)
}

fn parse_document(json: &str) -> Result<Preset, RemoteError> {
    let doc: PresetDocument = serde_json::from_str(json).map_err(|e| RemoteError::Parse(e.to_string()))?;
    Ok(doc.into_preset())
}

fn parse_document_list(json: &str) -> Result<Vec<Preset>, RemoteError> {
    let docs: Vec<PresetDocument> = serde_json::from_str(json).map_err(|e| RemoteError::Parse(e.to_string()))?;
    Ok(docs
        .into_iter()
        .filter(|doc| doc.is_public)
        .map(PresetDocument::into_preset)
        .collect())
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
