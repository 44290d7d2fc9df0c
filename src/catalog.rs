//! Catalogue records as produced by the playlist scraper.
//!
//! A catalogue is a JSON array of entries shaped like:
//!
//! ```json
//! {
//!   "track_id": "4gT1faTjrtFRFTsr2bqqYV",
//!   "track_info": {
//!     "name": "Song",
//!     "artists": [{ "name": "Artist" }],
//!     "album": { "name": "Album", "image_large": "https://..." },
//!     "popularity": 61,
//!     "preview_url": "https://..."
//!   },
//!   "audio_features": { "danceability": 0.7, "energy": 0.5, "tempo": 118.0 },
//!   "spotify": { "id": "4gT1faTjrtFRFTsr2bqqYV", "name": "Song", "artist": "Artist" }
//! }
//! ```
//!
//! Every part of an entry is optional, and entries that fail to decode are
//! skipped rather than failing the load. A single-entry document (one object
//! instead of an array) is also accepted.

use crate::error::Result;
use crate::features::Feature;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// One catalogue entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_info: Option<TrackInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_features: Option<AudioFeatures>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spotify: Option<SpotifyRef>,
}

/// Track metadata block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub artists: Vec<Artist>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<Album>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub popularity: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Album {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_large: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_default: Option<String>,
}

/// Playlist reference recorded by the scraper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpotifyRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
}

/// Flat audio-feature block.
///
/// Fields that are present but not numeric deserialize as `None`. Fields other
/// than the clustering features (key, mode, loudness, ...) are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub danceability: Option<f32>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub energy: Option<f32>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub valence: Option<f32>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub acousticness: Option<f32>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub instrumentalness: Option<f32>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub liveness: Option<f32>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub speechiness: Option<f32>,
    /// Beats per minute.
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub tempo: Option<f32>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl AudioFeatures {
    /// Raw value of an audio feature. Popularity lives in [`TrackInfo`], so it is
    /// always `None` here.
    pub fn get(&self, feature: Feature) -> Option<f32> {
        match feature {
            Feature::Danceability => self.danceability,
            Feature::Energy => self.energy,
            Feature::Valence => self.valence,
            Feature::Acousticness => self.acousticness,
            Feature::Instrumentalness => self.instrumentalness,
            Feature::Liveness => self.liveness,
            Feature::Speechiness => self.speechiness,
            Feature::Tempo => self.tempo,
            Feature::Popularity => None,
        }
    }
}

fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_f64()).map(|x| x as f32))
}

fn lenient_list<'de, D>(deserializer: D) -> std::result::Result<Vec<Artist>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

impl TrackRecord {
    /// A record with neither audio features nor metadata carries nothing to
    /// cluster or show.
    pub fn is_eligible(&self) -> bool {
        self.audio_features.is_some() || self.track_info.is_some()
    }

    /// Raw popularity from the metadata block, if any.
    pub fn popularity(&self) -> Option<f32> {
        self.track_info.as_ref().and_then(|i| i.popularity)
    }

    /// Display metadata with defaults filled in.
    pub fn meta(&self) -> TrackMeta {
        let info = self.track_info.as_ref();
        let album = info.and_then(|i| i.album.as_ref());

        let artist = info
            .map(|i| {
                i.artists
                    .iter()
                    .filter_map(|a| a.name.as_deref())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string());

        TrackMeta {
            title: info
                .and_then(|i| i.name.clone())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            artist,
            album: album
                .and_then(|a| a.name.clone())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            popularity: self.popularity().unwrap_or(DEFAULT_POPULARITY),
            cover_url: album
                .and_then(|a| non_empty(&a.image_large).or_else(|| non_empty(&a.image_default)))
                .unwrap_or_default(),
            preview_url: info.and_then(|i| non_empty(&i.preview_url)).unwrap_or_default(),
        }
    }
}

fn non_empty(s: &Option<String>) -> Option<String> {
    s.as_ref().filter(|s| !s.is_empty()).cloned()
}

const UNKNOWN: &str = "Unknown";

/// Popularity assumed when a record has none.
pub const DEFAULT_POPULARITY: f32 = 50.0;

/// Metadata handed to the rendering layer alongside each placed track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackMeta {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Popularity on a 0..100 scale.
    pub popularity: f32,
    /// Empty when no cover is known.
    pub cover_url: String,
    /// Empty when no preview is available.
    pub preview_url: String,
}

impl TrackMeta {
    /// "title — artist (album)", dropping parts that repeat an earlier one.
    pub fn hover_label(&self) -> String {
        let mut parts = vec![self.title.clone()];
        if !self.artist.is_empty() && self.artist != self.title {
            parts.push(self.artist.clone());
        }
        if !self.album.is_empty() && self.album != self.title && self.album != self.artist {
            parts.push(format!("({})", self.album));
        }
        parts.join(" — ")
    }

    /// Marker sphere radius, scaled from popularity.
    pub fn marker_radius(&self) -> f32 {
        crate::normalize::map_to_range(self.popularity, 0.0, 100.0, 0.1, 0.6)
    }
}

/// Records from a parsed document. An array yields one record per entry that
/// decodes, and malformed entries are dropped. Any other value must be a single
/// record.
fn records_from(doc: Value) -> Result<Vec<TrackRecord>> {
    let Value::Array(entries) = doc else {
        return Ok(vec![serde_json::from_value(doc)?]);
    };
    let total = entries.len();
    let records: Vec<TrackRecord> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(index, error = %e, "dropping malformed catalogue entry");
                None
            }
        })
        .collect();
    if records.len() < total {
        debug!(kept = records.len(), total, "catalogue had malformed entries");
    }
    Ok(records)
}

/// Parse a catalogue document.
pub fn parse_catalog(json: &str) -> Result<Vec<TrackRecord>> {
    records_from(serde_json::from_str(json)?)
}

/// Read a catalogue document from any reader.
pub fn read_catalog<R: Read>(reader: R) -> Result<Vec<TrackRecord>> {
    records_from(serde_json::from_reader(reader)?)
}

/// Load a catalogue document from disk.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Vec<TrackRecord>> {
    let file = std::fs::File::open(path.as_ref())?;
    read_catalog(std::io::BufReader::new(file))
}

/// Fetch a catalogue document over HTTP.
#[cfg(feature = "fetch")]
pub async fn fetch_catalog(url: &str) -> Result<Vec<TrackRecord>> {
    let doc: Value = reqwest::get(url).await?.error_for_status()?.json().await?;
    records_from(doc)
}
