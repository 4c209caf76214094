//! Wire shapes of the `/gallery` endpoint and their normalization.
//!
//! Two backend generations are in the field. Newer ones send id-addressed
//! records with an explicit `type`, older ones send a static asset `path` and
//! leave the kind to the file extension. The oldest ones answer with a bare
//! array instead of an envelope. Everything is folded into the canonical
//! model here so nothing downstream branches on the record shape.

use crate::model::{
    GalleryItem, GalleryPageResult, GalleryStats, MediaAddress, MediaKind, StorageLocation, Theme,
    UNKNOWN_GAME,
};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::path::Path;

/// Either an envelope or a bare array. The shape is picked up front so that
/// field errors inside a record surface as-is.
#[derive(Debug)]
pub(crate) enum PageEnvelope {
    Paged(GalleryEnvelope),
    Bare(Vec<ItemRecord>),
}

impl<'de> Deserialize<'de> for PageEnvelope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        if value.is_array() {
            serde_json::from_value(value)
                .map(PageEnvelope::Bare)
                .map_err(D::Error::custom)
        } else {
            serde_json::from_value(value)
                .map(PageEnvelope::Paged)
                .map_err(D::Error::custom)
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GalleryEnvelope {
    gallery: Vec<ItemRecord>,
    pages: i64,
    #[serde(default)]
    theme: Option<serde_json::Value>,
    #[serde(default)]
    stats: Option<StatsRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsRecord {
    #[serde(default)]
    num_screenshots: u64,
    #[serde(default)]
    num_videos: u64,
    #[serde(default)]
    index_time: f64,
}

/// Records with an `id` are id-addressed, everything else is legacy.
#[derive(Debug)]
pub(crate) enum ItemRecord {
    Current(CurrentRecord),
    Legacy(LegacyRecord),
}

impl<'de> Deserialize<'de> for ItemRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        if value.get("id").is_some() {
            serde_json::from_value(value)
                .map(ItemRecord::Current)
                .map_err(D::Error::custom)
        } else {
            serde_json::from_value(value)
                .map(ItemRecord::Legacy)
                .map_err(D::Error::custom)
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CurrentRecord {
    #[serde(deserialize_with = "flexible_id")]
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(deserialize_with = "flexible_timestamp")]
    taken_at: i64,
    #[serde(default)]
    game: Option<String>,
    #[serde(default)]
    stored_at: Option<String>,
    #[serde(default)]
    file_size: Option<u64>,
    #[serde(default)]
    file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LegacyRecord {
    path: String,
    #[serde(deserialize_with = "flexible_timestamp")]
    taken_at: i64,
    #[serde(default)]
    game: Option<String>,
    #[serde(default)]
    stored_at: Option<String>,
    #[serde(default)]
    file_size: Option<u64>,
    #[serde(default)]
    file_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Unsigned(u64),
    Signed(i64),
    Text(String),
}

fn flexible_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Unsigned(n) => Ok(n.to_string()),
        NumberOrString::Signed(n) => Ok(n.to_string()),
        NumberOrString::Text(s) if !s.trim().is_empty() => Ok(s),
        NumberOrString::Text(_) => Err(D::Error::custom("empty item id")),
    }
}

fn flexible_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Unsigned(n) => i64::try_from(n).map_err(D::Error::custom),
        NumberOrString::Signed(n) => Ok(n),
        NumberOrString::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| D::Error::custom(format!("invalid takenAt {:?}: {}", s, e))),
    }
}

fn kind_from_type(kind: &str) -> MediaKind {
    if kind.eq_ignore_ascii_case("video") || kind.eq_ignore_ascii_case("movie") {
        MediaKind::Video
    } else {
        MediaKind::Image
    }
}

fn kind_from_path(path: &str) -> MediaKind {
    let is_video = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("mp4"))
        .unwrap_or(false);
    if is_video {
        MediaKind::Video
    } else {
        MediaKind::Image
    }
}

fn storage_from_wire(stored_at: Option<&str>) -> StorageLocation {
    match stored_at {
        Some(s) if s.eq_ignore_ascii_case("sd") => StorageLocation::Removable,
        _ => StorageLocation::Internal,
    }
}

fn game_or_unknown(game: Option<String>) -> String {
    game.filter(|g| !g.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_GAME.to_string())
}

fn non_empty(hint: Option<String>) -> Option<String> {
    hint.filter(|h| !h.trim().is_empty())
}

impl From<ItemRecord> for GalleryItem {
    fn from(record: ItemRecord) -> Self {
        match record {
            ItemRecord::Current(r) => GalleryItem {
                address: MediaAddress::Id(r.id),
                kind: kind_from_type(&r.kind),
                captured_at: r.taken_at,
                game: game_or_unknown(r.game),
                storage: storage_from_wire(r.stored_at.as_deref()),
                file_size_bytes: r.file_size.unwrap_or(0),
                file_name_hint: non_empty(r.file_name),
            },
            ItemRecord::Legacy(r) => GalleryItem {
                kind: kind_from_path(&r.path),
                address: MediaAddress::Path(r.path),
                captured_at: r.taken_at,
                game: game_or_unknown(r.game),
                storage: storage_from_wire(r.stored_at.as_deref()),
                file_size_bytes: r.file_size.unwrap_or(0),
                file_name_hint: non_empty(r.file_name),
            },
        }
    }
}

impl From<StatsRecord> for GalleryStats {
    fn from(s: StatsRecord) -> Self {
        GalleryStats {
            screenshots: s.num_screenshots,
            videos: s.num_videos,
            index_time_secs: s.index_time.max(0.0),
        }
    }
}

impl PageEnvelope {
    /// Normalizes the response for `requested_page`.
    ///
    /// A backend with an empty album reports zero pages; that is raised to one.
    /// Bare arrays carry no page count, so another page is assumed to exist
    /// while the current one is non-empty.
    pub(crate) fn into_page(self, requested_page: u32) -> GalleryPageResult {
        match self {
            PageEnvelope::Paged(env) => GalleryPageResult {
                items: env.gallery.into_iter().map(GalleryItem::from).collect(),
                total_pages: env.pages.clamp(1, i64::from(u32::MAX)) as u32,
                theme: Theme::from_wire(env.theme.as_ref().and_then(|t| t.as_str())),
                stats: env.stats.map(GalleryStats::from),
            },
            PageEnvelope::Bare(records) => {
                let page = requested_page.max(1);
                let total_pages = if records.is_empty() {
                    page
                } else {
                    page.saturating_add(1)
                };
                GalleryPageResult {
                    items: records.into_iter().map(GalleryItem::from).collect(),
                    total_pages,
                    theme: Theme::Light,
                    stats: None,
                }
            }
        }
    }
}
