//! Canonical clustering features and the vectors built from them.
//!
//! Every eligible track becomes a [`FeatureVector`] with one component per
//! [`Feature`], in [`Feature::ALL`] order:
//!
//! | # | feature | source | scaling |
//! |---|---------|--------|---------|
//! | 0 | danceability | `audio_features` | raw, missing = 0 |
//! | 1 | energy | `audio_features` | raw, missing = 0 |
//! | 2 | valence | `audio_features` | raw, missing = 0 |
//! | 3 | acousticness | `audio_features` | raw, missing = 0 |
//! | 4 | instrumentalness | `audio_features` | raw, missing = 0 |
//! | 5 | liveness | `audio_features` | raw, missing = 0 |
//! | 6 | speechiness | `audio_features` | raw, missing = 0 |
//! | 7 | tempo | `audio_features` | `min(bpm / 200, 1)`, missing = 120 bpm |
//! | 8 | popularity | `track_info` | `value / 100`, missing = 50 |

use crate::catalog::{TrackRecord, DEFAULT_POPULARITY};
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;
use std::str::FromStr;

/// Number of canonical features.
pub const FEATURE_COUNT: usize = 9;

/// A canonical audio feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    Danceability,
    Energy,
    Valence,
    Acousticness,
    Instrumentalness,
    Liveness,
    Speechiness,
    #[serde(alias = "bpm")]
    Tempo,
    Popularity,
}

impl Feature {
    /// All features in vector order.
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::Danceability,
        Feature::Energy,
        Feature::Valence,
        Feature::Acousticness,
        Feature::Instrumentalness,
        Feature::Liveness,
        Feature::Speechiness,
        Feature::Tempo,
        Feature::Popularity,
    ];

    /// Position of this feature within a [`FeatureVector`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Lowercase name used in catalogue JSON and config files.
    pub fn name(self) -> &'static str {
        match self {
            Feature::Danceability => "danceability",
            Feature::Energy => "energy",
            Feature::Valence => "valence",
            Feature::Acousticness => "acousticness",
            Feature::Instrumentalness => "instrumentalness",
            Feature::Liveness => "liveness",
            Feature::Speechiness => "speechiness",
            Feature::Tempo => "tempo",
            Feature::Popularity => "popularity",
        }
    }

    /// Captions for the low and high ends of an axis showing this feature.
    pub fn poles(self) -> Option<(&'static str, &'static str)> {
        match self {
            Feature::Danceability => Some(("Listen", "Dance")),
            Feature::Energy => Some(("Mellow", "Intense")),
            Feature::Valence => Some(("Sad", "Happy")),
            Feature::Acousticness => Some(("Synthetic", "Acoustic")),
            Feature::Instrumentalness => Some(("Vocals", "Instrumental")),
            Feature::Liveness => Some(("Studio", "Live")),
            Feature::Speechiness => Some(("Musical", "Spoken")),
            Feature::Tempo => Some(("Slow", "Fast")),
            Feature::Popularity => None,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Feature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "bpm" {
            return Ok(Feature::Tempo);
        }
        Feature::ALL
            .into_iter()
            .find(|f| f.name() == lower)
            .ok_or_else(|| Error::UnknownFeature(s.to_string()))
    }
}

/// Normalized feature values for one track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f32; FEATURE_COUNT]);

impl FeatureVector {
    /// Wrap values already in canonical feature order.
    pub fn new(values: [f32; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    /// Value of one feature.
    pub fn get(&self, feature: Feature) -> f32 {
        self.0[feature.index()]
    }

    /// All nine values in canonical order.
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

impl AsRef<[f32]> for FeatureVector {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

impl Index<Feature> for FeatureVector {
    type Output = f32;

    fn index(&self, feature: Feature) -> &f32 {
        &self.0[feature.index()]
    }
}

/// Turns catalogue records into [`FeatureVector`]s.
#[derive(Debug, Clone)]
pub struct FeatureVectorBuilder {
    /// BPM that maps to 1.0; faster tempos are clamped.
    pub tempo_ceiling: f32,
    /// BPM assumed when a record has none.
    pub default_tempo: f32,
    /// Popularity assumed when a record has none (0..100 scale).
    pub default_popularity: f32,
}

impl Default for FeatureVectorBuilder {
    fn default() -> Self {
        Self {
            tempo_ceiling: 200.0,
            default_tempo: 120.0,
            default_popularity: DEFAULT_POPULARITY,
        }
    }
}

impl FeatureVectorBuilder {
    /// Builder with the default tempo ceiling and fallbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the vector for one record. Eligibility is the caller's concern.
    pub fn build(&self, record: &TrackRecord) -> FeatureVector {
        let audio = record.audio_features.as_ref();
        let mut values = [0.0f32; FEATURE_COUNT];
        for feature in Feature::ALL {
            let raw = audio.and_then(|a| a.get(feature));
            values[feature.index()] = match feature {
                Feature::Tempo => (raw.unwrap_or(self.default_tempo) / self.tempo_ceiling).min(1.0),
                Feature::Popularity => {
                    record.popularity().unwrap_or(self.default_popularity) / 100.0
                }
                _ => raw.unwrap_or(0.0),
            };
        }
        FeatureVector(values)
    }

    /// Build vectors for the eligible records, returning each alongside its
    /// index in `records`.
    pub fn build_all(&self, records: &[TrackRecord]) -> Vec<(usize, FeatureVector)> {
        records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_eligible())
            .map(|(i, r)| (i, self.build(r)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AudioFeatures, TrackInfo};

    fn with_tempo(tempo: Option<f32>) -> TrackRecord {
        TrackRecord {
            audio_features: Some(AudioFeatures {
                tempo,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn tempo_is_scaled_and_clamped() {
        let b = FeatureVectorBuilder::new();
        assert_eq!(b.build(&with_tempo(Some(400.0)))[Feature::Tempo], 1.0);
        assert_eq!(b.build(&with_tempo(Some(100.0)))[Feature::Tempo], 0.5);
        assert_eq!(b.build(&with_tempo(None))[Feature::Tempo], 0.6);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let record = TrackRecord {
            track_info: Some(TrackInfo::default()),
            ..Default::default()
        };
        let v = FeatureVectorBuilder::new().build(&record);
        assert_eq!(v[Feature::Danceability], 0.0);
        assert_eq!(v[Feature::Speechiness], 0.0);
        assert_eq!(v[Feature::Tempo], 0.6);
        assert_eq!(v[Feature::Popularity], 0.5);
    }

    #[test]
    fn popularity_comes_from_metadata() {
        let record = TrackRecord {
            track_info: Some(TrackInfo {
                popularity: Some(80.0),
                ..Default::default()
            }),
            audio_features: Some(AudioFeatures {
                energy: Some(0.9),
                ..Default::default()
            }),
            ..Default::default()
        };
        let v = FeatureVectorBuilder::new().build(&record);
        assert_eq!(v[Feature::Popularity], 0.8);
        assert_eq!(v[Feature::Energy], 0.9);
        assert_eq!(v.as_slice().len(), FEATURE_COUNT);
    }

    #[test]
    fn build_all_skips_ineligible() {
        let records = vec![with_tempo(Some(90.0)), TrackRecord::default(), with_tempo(None)];
        let built = FeatureVectorBuilder::new().build_all(&records);
        let indices: Vec<usize> = built.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 2]);
    }

    #[test]
    fn feature_names_round_trip() {
        for f in Feature::ALL {
            assert_eq!(f.name().parse::<Feature>().unwrap(), f);
            assert_eq!(Feature::ALL[f.index()], f);
        }
        assert_eq!("BPM".parse::<Feature>().unwrap(), Feature::Tempo);
        assert!("loudness".parse::<Feature>().is_err());
    }
}
