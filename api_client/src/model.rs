//! Canonical gallery model shared by the controller and the resolver.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Game name used when the backend could not name the originating title.
pub const UNKNOWN_GAME: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Label shown in item details.
    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Image => "Screenshot",
            MediaKind::Video => "Video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageLocation {
    Removable,
    Internal,
}

impl StorageLocation {
    pub fn label(self) -> &'static str {
        match self {
            StorageLocation::Removable => "SD Card",
            StorageLocation::Internal => "Internal Storage",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Maps the backend's theme string. Anything other than `dark` is light.
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("dark") => Theme::Dark,
            Some("light") | None => Theme::Light,
            Some(other) => {
                tracing::debug!(theme = other, "Unknown theme from backend, using light");
                Theme::Light
            }
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

/// How an item's assets are addressed on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaAddress {
    /// Newer backends serve `/thumbnail?id=` and `/file?id=`.
    Id(String),
    /// Legacy backends expose a static asset path.
    Path(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryItem {
    pub address: MediaAddress,
    pub kind: MediaKind,
    pub captured_at: i64,
    pub game: String,
    pub storage: StorageLocation,
    pub file_size_bytes: u64,
    pub file_name_hint: Option<String>,
}

impl GalleryItem {
    /// Stable identifier of the item. For legacy records this is the asset path.
    pub fn id(&self) -> &str {
        match &self.address {
            MediaAddress::Id(id) => id,
            MediaAddress::Path(path) => path,
        }
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GalleryStats {
    pub screenshots: u64,
    pub videos: u64,
    pub index_time_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryPageResult {
    pub items: Vec<GalleryItem>,
    pub total_pages: u32,
    pub theme: Theme,
    pub stats: Option<GalleryStats>,
}
