//! `NoData` gap filling by spatial nearest valid neighbour.
//!
//! Valid samples are bulk loaded into an R-tree; every missing sample takes
//! the value of its nearest tree entry, in logarithmic time whatever the
//! shape of the gap.

use crate::core_types::Point2;
use rayon::prelude::*;
use rstar::primitives::GeomWithData;
use rstar::RTree;

type ValidSample = GeomWithData<[f64; 2], usize>;

/// Index of the valid sample nearest to `p`; equidistant samples resolve to
/// the lowest index.
fn nearest(tree: &RTree<ValidSample>, p: Point2) -> Option<usize> {
    let mut candidates = tree.nearest_neighbor_iter_with_distance_2(&[p.x, p.y]);
    let (first, best_d2) = candidates.next()?;
    let tied = candidates
        .take_while(|&(_, d2)| d2 == best_d2)
        .map(|(s, _)| s.data);
    Some(tied.fold(first.data, usize::min))
}

/// Replace every `None` in `values` with the value of the spatially nearest
/// `Some` sample. Returns `None` when there is no valid sample at all.
pub fn fill_nearest_valid(points: &[Point2], values: &[Option<f64>]) -> Option<Vec<f64>> {
    debug_assert_eq!(points.len(), values.len());
    let valid: Vec<ValidSample> = (0..values.len())
        .filter(|&i| values[i].is_some())
        .map(|i| GeomWithData::new([points[i].x, points[i].y], i))
        .collect();
    if valid.is_empty() {
        return None;
    }
    let missing: Vec<usize> = (0..values.len()).filter(|&i| values[i].is_none()).collect();
    if missing.is_empty() {
        return Some(values.iter().map(|v| v.unwrap_or_default()).collect());
    }

    let tree = RTree::bulk_load(valid);
    let fills: Vec<(usize, usize)> = missing
        .par_iter()
        .filter_map(|&i| nearest(&tree, points[i]).map(|source| (i, source)))
        .collect();

    let mut filled: Vec<f64> = values.iter().map(|v| v.unwrap_or(f64::NAN)).collect();
    for (target, source) in fills {
        filled[target] = filled[source];
    }
    Some(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn grid_points(nx: usize, ny: usize) -> Vec<Point2> {
        (0..ny)
            .flat_map(|j| (0..nx).map(move |i| Point2::new(i as f64, j as f64)))
            .collect()
    }

    #[test]
    fn test_no_missing_values_passthrough() {
        let points = grid_points(2, 2);
        let values = vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)];
        assert_eq!(
            fill_nearest_valid(&points, &values),
            Some(vec![1.0, 2.0, 3.0, 4.0])
        );
    }

    #[test]
    fn test_all_missing_is_none() {
        let points = grid_points(3, 1);
        assert!(fill_nearest_valid(&points, &[None, None, None]).is_none());
    }

    #[test]
    fn test_fills_from_spatial_nearest() {
        // 5x1 strip, only the ends are valid
        let points = grid_points(5, 1);
        let values = vec![Some(10.0), None, None, None, Some(50.0)];
        let filled = fill_nearest_valid(&points, &values).unwrap();
        // Middle point is equidistant: lowest index wins
        assert_eq!(filled, vec![10.0, 10.0, 10.0, 50.0, 50.0]);
    }

    #[test]
    fn test_nearest_not_raster_adjacent() {
        // A large hole: the only valid samples are far corners
        let points = grid_points(20, 20);
        let mut values = vec![None; 400];
        values[0] = Some(1.0); // (0, 0)
        values[399] = Some(2.0); // (19, 19)
        let filled = fill_nearest_valid(&points, &values).unwrap();
        assert_eq!(filled[20 + 3], 1.0); // (3, 1)
        assert_eq!(filled[18 * 20 + 17], 2.0); // (17, 18)
        assert!(filled.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_query_outside_valid_extent() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(500.0, -300.0),
        ];
        let values = vec![Some(7.0), Some(8.0), None];
        let filled = fill_nearest_valid(&points, &values).unwrap();
        assert_eq!(filled[2], 8.0);
    }

    #[test]
    fn test_small_valid_patch_fills_large_grid_quickly() {
        // 400x400 samples at 10 m, valid only on a 10x10 corner patch
        let n = 400;
        let points: Vec<Point2> = grid_points(n, n).into_iter().map(|p| p * 10.0).collect();
        let values: Vec<Option<f64>> = points
            .iter()
            .map(|p| (p.x < 100.0 && p.y < 100.0).then_some(1.0))
            .collect();
        assert_eq!(values.iter().flatten().count(), 100);

        let start = Instant::now();
        let filled = fill_nearest_valid(&points, &values).unwrap();
        let elapsed = start.elapsed();

        assert!(elapsed < Duration::from_secs(5), "fill took {elapsed:?}");
        assert_eq!(filled.len(), n * n);
        assert!(filled.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_equidistant_ties_in_two_dimensions() {
        // Four valid corners of a 3x3 block, the centre is equidistant to all
        let points = grid_points(3, 3);
        let mut values = vec![None; 9];
        values[8] = Some(4.0);
        values[6] = Some(3.0);
        values[2] = Some(2.0);
        values[0] = Some(1.0);
        let filled = fill_nearest_valid(&points, &values).unwrap();
        assert_eq!(filled[4], 1.0);
    }
}
