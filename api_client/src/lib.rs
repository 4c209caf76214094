//! API client for the device's gallery HTTP endpoints.

mod model;
mod wire;

pub use model::{
    GalleryItem, GalleryPageResult, GalleryStats, MediaAddress, MediaKind, StorageLocation, Theme,
    UNKNOWN_GAME,
};

use reqwest::header::ACCEPT;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ApiClientError {
    #[error("Request Error: {0}")]
    RequestError(String),
    #[error("Gallery API Error ({status}): {body}")]
    GalleryApiError { status: u16, body: String },
    #[error("Malformed Response: {0}")]
    MalformedResponse(String),
    #[error("Other Error: {0}")]
    Other(String),
}

/// Parses a `/gallery` response body fetched for `requested_page`.
pub fn parse_gallery_page(body: &str, requested_page: u32) -> Result<GalleryPageResult, ApiClientError> {
    let envelope: wire::PageEnvelope =
        serde_json::from_str(body).map_err(|e| ApiClientError::MalformedResponse(e.to_string()))?;
    Ok(envelope.into_page(requested_page))
}

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the backend at `base_url`. An empty string keeps
    /// requests relative to the serving origin.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        ApiClient { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn get_gallery_page(&self, page: u32) -> Result<GalleryPageResult, ApiClientError> {
        let url = format!("{}/gallery?page={}", self.base_url, page);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ApiClientError::RequestError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiClientError::GalleryApiError { status, body });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiClientError::RequestError(e.to_string()))?;

        let result = parse_gallery_page(&body, page)?;
        tracing::debug!(page, items = result.items.len(), pages = result.total_pages, "Fetched gallery page");
        Ok(result)
    }

    /// Fetch the raw bytes behind a resolved asset URL.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, ApiClientError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ApiClientError::RequestError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiClientError::GalleryApiError { status, body });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiClientError::RequestError(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// Download an asset and write it to `dest`. Returns the number of bytes written.
    pub async fn download_to(&self, url: &str, dest: &Path) -> Result<u64, ApiClientError> {
        let bytes = self.download(url).await?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ApiClientError::Other(e.to_string()))?;
        }
        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|e| ApiClientError::Other(e.to_string()))?;
        tracing::info!(path = %dest.display(), bytes = bytes.len(), "Downloaded gallery item");
        Ok(bytes.len() as u64)
    }
}
