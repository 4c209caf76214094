//! Turns gallery items into the URLs, labels and filenames a client renders.
//!
//! Everything here is pure: no I/O, no shared state. A [`MediaResolver`] only
//! carries the [`ClientContext`] it was built with.

mod context;

pub use context::{ClientContext, ContextError, DateStyle};

use api_client::{GalleryItem, MediaAddress, MediaKind, UNKNOWN_GAME};
use chrono::DateTime;
use serde::Serialize;

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human readable size in base-1024 units, rounded to two decimals.
///
/// Whole values carry no fraction: `1024` is `1 KB`, `1536` is `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let index = (bytes.ilog(1024) as usize).min(SIZE_UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(index as i32);
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZE_UNITS[index])
}

/// Which element a client should render for an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "element", rename_all = "lowercase")]
pub enum MediaElement {
    /// Video with controls, not preloaded, using the preview as poster.
    Video { src: String, poster: String },
    /// Static preview image linking to the full asset.
    Image { src: String, full: String },
}

/// Display-ready view of one gallery item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedMedia {
    pub id: String,
    pub kind: MediaKind,
    pub kind_label: &'static str,
    pub preview_url: String,
    pub full_url: String,
    pub element: MediaElement,
    pub captured_at: String,
    pub game: String,
    pub stored_at: &'static str,
    pub size: String,
    pub download_filename: String,
}

#[derive(Debug, Clone, Default)]
pub struct MediaResolver {
    ctx: ClientContext,
}

impl MediaResolver {
    pub fn new(ctx: ClientContext) -> Self {
        MediaResolver { ctx }
    }

    fn asset_url(&self, endpoint: &str, item: &GalleryItem) -> String {
        match &item.address {
            MediaAddress::Id(id) => {
                let id: String = url::form_urlencoded::byte_serialize(id.as_bytes()).collect();
                format!("{}/{}?id={}", self.ctx.base_url(), endpoint, id)
            }
            MediaAddress::Path(path) if path.starts_with('/') => {
                format!("{}{}", self.ctx.base_url(), path)
            }
            MediaAddress::Path(path) => format!("{}/{}", self.ctx.base_url(), path),
        }
    }

    /// Reduced-size rendition. Legacy backends have none, so the asset itself is used.
    pub fn preview_url(&self, item: &GalleryItem) -> String {
        self.asset_url("thumbnail", item)
    }

    pub fn full_url(&self, item: &GalleryItem) -> String {
        self.asset_url("file", item)
    }

    pub fn classify(&self, item: &GalleryItem) -> MediaKind {
        item.kind
    }

    pub fn element(&self, item: &GalleryItem) -> MediaElement {
        match self.classify(item) {
            MediaKind::Video => MediaElement::Video {
                src: self.full_url(item),
                poster: self.preview_url(item),
            },
            MediaKind::Image => MediaElement::Image {
                src: self.preview_url(item),
                full: self.full_url(item),
            },
        }
    }

    pub fn format_captured_at(&self, item: &GalleryItem) -> String {
        match DateTime::from_timestamp(item.captured_at, 0) {
            Some(utc) => utc
                .with_timezone(&self.ctx.utc_offset())
                .format(self.ctx.date_style().pattern())
                .to_string(),
            None => {
                tracing::debug!(captured_at = item.captured_at, "Timestamp out of range");
                item.captured_at.to_string()
            }
        }
    }

    /// The backend's filename if it sent one, otherwise `<game>_<date>.<ext>`.
    pub fn download_filename(&self, item: &GalleryItem) -> String {
        if let Some(hint) = &item.file_name_hint {
            return hint.clone();
        }

        let game = if item.game.trim().is_empty() {
            UNKNOWN_GAME
        } else {
            item.game.as_str()
        };
        let game: String = game
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .map(without_separator)
            .collect();
        let date: String = self
            .format_captured_at(item)
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ':' && *c != '.')
            .map(without_separator)
            .collect();
        let ext = if item.is_video() { "mp4" } else { "jpg" };
        format!("{}_{}.{}", game, date, ext)
    }

    pub fn resolve(&self, item: &GalleryItem) -> ResolvedMedia {
        let kind = self.classify(item);
        ResolvedMedia {
            id: item.id().to_string(),
            kind,
            kind_label: kind.label(),
            preview_url: self.preview_url(item),
            full_url: self.full_url(item),
            element: self.element(item),
            captured_at: self.format_captured_at(item),
            game: item.game.clone(),
            stored_at: item.storage.label(),
            size: format_file_size(item.file_size_bytes),
            download_filename: self.download_filename(item),
        }
    }
}

// Dates like 1/1/2023 would otherwise nest directories.
fn without_separator(c: char) -> char {
    if c == '/' || c == '\\' {
        '-'
    } else {
        c
    }
}
