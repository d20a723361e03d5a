//! Materialize view collections from measured samples.

use mosaic_core::constants::KERNEL_WEIGHT_FLOOR;
use mosaic_core::errors::ViewError;
use mosaic_core::types::{FeatureTable, View, ViewCollection, ViewKind};
use rayon::prelude::*;

use crate::geometry::{gaussian_cutoff, gaussian_weight, DistanceMatrix, NeighborGraph};

/// Build every requested view over the sample, in request order.
///
/// The sample's own validation already guarantees finite geometry and
/// unique ids; this only adds per-view construction. The pairwise distance
/// matrix is shared across distance-weighted views.
pub fn build_views(sample: &FeatureTable, kinds: &[ViewKind]) -> Result<ViewCollection, ViewError> {
    let mut collection = ViewCollection::new(sample.locations().to_vec());
    let mut distances: Option<DistanceMatrix> = None;

    for kind in kinds {
        let view = match *kind {
            ViewKind::Intrinsic => View::new(
                *kind,
                sample.features().to_vec(),
                sample.values().to_vec(),
                sample.n_locations(),
            )?,
            ViewKind::DistanceWeighted { radius } => {
                let matrix = distances
                    .get_or_insert_with(|| DistanceMatrix::build(sample.locations()));
                distance_weighted_view(sample, matrix, radius)?
            }
            ViewKind::NeighborGraph { threshold } => neighbor_graph_view(sample, threshold)?,
        };
        collection.push(view)?;
    }

    Ok(collection)
}

/// Kernel-weighted sums over surrounding locations.
///
/// Each row is the weighted sum of every other location's feature vector;
/// contributions past the kernel cutoff are skipped. A location with no
/// neighbor inside the cutoff gets a zero vector, never an error.
fn distance_weighted_view(
    sample: &FeatureTable,
    distances: &DistanceMatrix,
    radius: f64,
) -> Result<View, ViewError> {
    let n = sample.n_locations();
    let p = sample.n_features();
    let cutoff = gaussian_cutoff(radius);

    let rows: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| {
            let mut acc = vec![0.0; p];
            for j in 0..n {
                if j == i {
                    continue;
                }
                let d = distances.get(i, j);
                if d > cutoff {
                    continue;
                }
                let w = gaussian_weight(d, radius);
                if w < KERNEL_WEIGHT_FLOOR {
                    continue;
                }
                for (a, v) in acc.iter_mut().zip(sample.row(j)) {
                    *a += w * v;
                }
            }
            acc
        })
        .collect();

    let values: Vec<f64> = rows.into_iter().flatten().collect();
    View::new(
        ViewKind::DistanceWeighted { radius },
        sample.features().to_vec(),
        values,
        n,
    )
}

/// Feature means over direct neighbors in the planar neighbor graph.
/// Isolated locations get a zero vector.
fn neighbor_graph_view(sample: &FeatureTable, threshold: f64) -> Result<View, ViewError> {
    let n = sample.n_locations();
    let p = sample.n_features();
    let graph = NeighborGraph::build(sample.locations(), threshold);

    let mut values = vec![0.0; n * p];
    for i in 0..n {
        let neighbors = graph.neighbors(i);
        if neighbors.is_empty() {
            continue;
        }
        let row = &mut values[i * p..(i + 1) * p];
        for &j in &neighbors {
            for (a, v) in row.iter_mut().zip(sample.row(j)) {
                *a += v;
            }
        }
        let count = neighbors.len() as f64;
        for a in row.iter_mut() {
            *a /= count;
        }
    }

    View::new(
        ViewKind::NeighborGraph { threshold },
        sample.features().to_vec(),
        values,
        n,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::types::Location;

    fn line_sample() -> FeatureTable {
        // Four locations on a line, two features.
        FeatureTable::new(
            (0..4)
                .map(|i| Location::new(format!("l{i}"), i as f64, 0.0))
                .collect(),
            vec!["f0".into(), "f1".into()],
            vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0, 4.0, 40.0],
        )
        .unwrap()
    }

    #[test]
    fn intrinsic_view_passes_the_sample_through() {
        let sample = line_sample();
        let collection = build_views(&sample, &[ViewKind::Intrinsic]).unwrap();
        let view = collection.intrinsic().unwrap();
        assert_eq!(view.values(), sample.values());
        assert_eq!(view.features(), sample.features());
    }

    #[test]
    fn views_keep_request_order_and_parameter_names() {
        let sample = line_sample();
        let collection = build_views(
            &sample,
            &[
                ViewKind::Intrinsic,
                ViewKind::DistanceWeighted { radius: 1.0 },
                ViewKind::NeighborGraph { threshold: 1.5 },
            ],
        )
        .unwrap();
        assert_eq!(
            collection.view_names(),
            vec!["intrinsic", "distance_1", "neighbor_1.5"]
        );
    }

    #[test]
    fn distance_weighted_rows_are_kernel_sums_of_others() {
        let sample = line_sample();
        let collection = build_views(
            &sample,
            &[ViewKind::Intrinsic, ViewKind::DistanceWeighted { radius: 1.0 }],
        )
        .unwrap();
        let view = collection.get("distance_1").unwrap();

        // Location 0: neighbors at distance 1, 2, 3 with Gaussian weights.
        let w1 = gaussian_weight(1.0, 1.0);
        let w2 = gaussian_weight(2.0, 1.0);
        let w3 = gaussian_weight(3.0, 1.0);
        let expected_f0 = w1 * 2.0 + w2 * 3.0 + w3 * 4.0;
        assert!((view.row(0)[0] - expected_f0).abs() < 1e-9);
        // The location itself contributes nothing.
        assert!(view.row(0)[0] < 2.0 + 3.0 + 4.0);
    }

    #[test]
    fn far_location_gets_a_zero_vector_not_an_error() {
        let mut locations: Vec<Location> = (0..3)
            .map(|i| Location::new(format!("l{i}"), i as f64, 0.0))
            .collect();
        locations.push(Location::new("far", 1e6, 1e6));
        let sample = FeatureTable::new(
            locations,
            vec!["f0".into()],
            vec![1.0, 2.0, 3.0, 4.0],
        )
        .unwrap();

        let collection = build_views(
            &sample,
            &[ViewKind::Intrinsic, ViewKind::DistanceWeighted { radius: 1.0 }],
        )
        .unwrap();
        let view = collection.get("distance_1").unwrap();
        assert_eq!(view.row(3), &[0.0]);
    }

    #[test]
    fn neighbor_view_averages_direct_neighbors() {
        let sample = line_sample();
        let collection = build_views(
            &sample,
            &[ViewKind::Intrinsic, ViewKind::NeighborGraph { threshold: 1.0 }],
        )
        .unwrap();
        let view = collection.get("neighbor_1").unwrap();

        // Location 1 neighbors locations 0 and 2.
        assert!((view.row(1)[0] - 2.0).abs() < 1e-12);
        assert!((view.row(1)[1] - 20.0).abs() < 1e-12);
        // Endpoint 0 has the single neighbor 1.
        assert!((view.row(0)[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn isolated_location_in_neighbor_view_is_zero() {
        let mut locations: Vec<Location> = (0..3)
            .map(|i| Location::new(format!("l{i}"), i as f64, 0.0))
            .collect();
        locations.push(Location::new("far", 500.0, 500.0));
        let sample = FeatureTable::new(
            locations,
            vec!["f0".into()],
            vec![1.0, 2.0, 3.0, 4.0],
        )
        .unwrap();

        let collection = build_views(
            &sample,
            &[ViewKind::Intrinsic, ViewKind::NeighborGraph { threshold: 2.0 }],
        )
        .unwrap();
        let view = collection.get("neighbor_2").unwrap();
        assert_eq!(view.row(3), &[0.0]);
    }

    #[test]
    fn duplicate_views_are_rejected() {
        let sample = line_sample();
        let err = build_views(
            &sample,
            &[
                ViewKind::Intrinsic,
                ViewKind::DistanceWeighted { radius: 1.0 },
                ViewKind::DistanceWeighted { radius: 1.0 },
            ],
        )
        .unwrap_err();
        assert!(matches!(err, ViewError::DuplicateView { .. }));
    }
}
