use proptest::prelude::*;
use trackspace::catalog::{AudioFeatures, TrackInfo};
use trackspace::cluster::{Clustering, Kmeans};
use trackspace::{Feature, FeatureVectorBuilder, RangeNormalizer, TrackRecord};

fn record(features: [f32; 7], tempo: f32, popularity: f32) -> TrackRecord {
    TrackRecord {
        track_info: Some(TrackInfo {
            popularity: Some(popularity),
            ..Default::default()
        }),
        audio_features: Some(AudioFeatures {
            danceability: Some(features[0]),
            energy: Some(features[1]),
            valence: Some(features[2]),
            acousticness: Some(features[3]),
            instrumentalness: Some(features[4]),
            liveness: Some(features[5]),
            speechiness: Some(features[6]),
            tempo: Some(tempo),
            ..Default::default()
        }),
        ..Default::default()
    }
}

proptest! {
    #[test]
    fn prop_kmeans_all_assigned(
        data in prop::collection::vec(prop::collection::vec(-10.0f32..10.0, 2), 1..20),
        k in 1usize..5
    ) {
        // Skip if k > n
        if k <= data.len() {
            let model = Kmeans::new(k).with_seed(42);
            let labels = model.fit_predict(&data).unwrap();

            prop_assert_eq!(labels.len(), data.len());
            for &l in &labels {
                prop_assert!(l < k);
            }
        }
    }

    #[test]
    fn prop_kmeans_rejects_k_above_n(
        data in prop::collection::vec(prop::collection::vec(0.0f32..1.0, 3), 1..10),
        extra in 1usize..4
    ) {
        let k = data.len() + extra;
        prop_assert!(Kmeans::new(k).with_seed(1).fit(&data).is_err());
    }

    #[test]
    fn prop_kmeans_seed_is_reproducible(
        data in prop::collection::vec(prop::collection::vec(0.0f32..1.0, 9), 6..30),
        seed in any::<u64>()
    ) {
        let a = Kmeans::new(3).with_seed(seed).fit(&data).unwrap();
        let b = Kmeans::new(3).with_seed(seed).fit(&data).unwrap();
        prop_assert_eq!(a.labels, b.labels);
    }

    #[test]
    fn prop_feature_vectors_stay_in_unit_range(
        features in prop::array::uniform7(0.0f32..=1.0),
        tempo in 0.0f32..1000.0,
        popularity in 0.0f32..=100.0
    ) {
        let v = FeatureVectorBuilder::new().build(&record(features, tempo, popularity));
        for (i, &x) in v.as_slice().iter().enumerate() {
            prop_assert!((0.0..=1.0).contains(&x), "component {} = {}", i, x);
        }
        prop_assert!(v[Feature::Tempo] <= 1.0);
    }

    #[test]
    fn prop_normalize_hits_both_ends(
        values in prop::collection::vec(-1000.0f32..1000.0, 2..50),
        radius in 1.0f32..100.0
    ) {
        let n = RangeNormalizer::new(radius);
        let (out, range) = n.normalize(&values);
        let range = range.unwrap();
        prop_assume!(range.min != range.max);

        for (&v, &o) in values.iter().zip(&out) {
            if v == range.min {
                prop_assert_eq!(o, -radius);
            }
            if v == range.max {
                prop_assert_eq!(o, radius);
            }
            prop_assert!(o >= -radius - 1e-3 && o <= radius + 1e-3);
        }
    }

    #[test]
    fn prop_degenerate_axis_is_centered(value in -100.0f32..100.0, len in 1usize..40) {
        let (out, _) = RangeNormalizer::default().normalize(&vec![value; len]);
        prop_assert!(out.iter().all(|&o| o == 0.0));
    }
}
