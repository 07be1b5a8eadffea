//! Selection of the best spread subset of Morris trajectories.
//!
//! Heuristic by Ruano, M. V. et al. (2012), "An improved sampling strategy based on
//! trajectory design for application of the Morris method to systems with many
//! input factors", Environmental Modelling & Software 37:103-109, as an alternative
//! to the brute force approach of Campolongo, F. et al. (2007).
//!
//! Given a pool of `M` trajectories, for every subset size `i` in `1..r` the row whose
//! `i` farthest trajectories (plus itself) have the largest summed pairwise distance
//! is taken as seed, then the seed is greedily grown up to `r` trajectories. The grown
//! subset with the largest total distance over all `i` wins.
//!
//! Ties are always resolved in favour of the first encountered index (lowest row,
//! lowest candidate), which keeps designs reproducible.
use crate::errors::Result;
use crate::matrix::{mat_copy_scal, mat_ext_mat, mat_ins_mat, mat_new, mat_sum_dists};
use crate::progress::Monitor;
use linfa::Float;
use log::debug;
use ndarray::{Array2, ArrayBase, ArrayView1, Data, Ix2};

/// Result of the trajectories selection
#[derive(Clone, Debug, PartialEq)]
pub struct Selection<F: Float> {
    /// Selected trajectories indices in the pool, sorted ascending
    pub indices: Vec<usize>,
    /// Sum of the pairwise distances of the selected trajectories
    pub total: F,
    /// For each subset size `i` in `1..r`, the seed indices and their summed distances
    pub seeds: Vec<(Vec<usize>, F)>,
}

/// Computes the (M, M) symmetric matrix of distances between the `M` trajectories
/// of a `(M * (k + 1), k)` pool.
///
/// The distance of two trajectories is the sum of the Euclidean distances between all
/// their pairs of points. The diagonal is left to zero.
pub fn distance_matrix<F: Float>(
    pool: &ArrayBase<impl Data<Elem = F>, Ix2>,
    k: usize,
    monitor: &Monitor,
) -> Result<Array2<F>> {
    let m = pool.nrows() / (k + 1);
    let mut dm = mat_new(m, m);
    mat_copy_scal(&mut dm, F::zero());
    let mut input_1 = mat_new(k + 1, k);
    let mut input_2 = mat_new(k + 1, k);

    monitor.start("Compute EE distance matrix", m);
    for i in 0..m {
        monitor.check()?;
        mat_ext_mat(&mut input_1, pool, i * (k + 1));
        for j in i + 1..m {
            mat_ext_mat(&mut input_2, pool, j * (k + 1));
            let d = mat_sum_dists(&input_1, &input_2);
            dm[[i, j]] = d;
            dm[[j, i]] = d;
        }
        monitor.advance(i + 1);
    }
    monitor.finish();
    Ok(dm)
}

/// Sum of the distances of all pairs of trajectories given by `indices`
pub fn sum_distances<F: Float>(indices: &[usize], dm: &Array2<F>) -> F {
    let mut d = F::zero();
    for (n, &a) in indices.iter().enumerate() {
        for &b in &indices[n + 1..] {
            d += dm[[a, b]];
        }
    }
    d
}

/// Indices of the `i` largest distances of a distance matrix row, `exclude` (the row
/// itself) left apart. On equal distances the first encountered index wins.
pub fn top_idx<F: Float>(distances: ArrayView1<F>, i: usize, exclude: usize) -> Vec<usize> {
    let mut used = vec![false; distances.len()];
    used[exclude] = true;
    let mut top = Vec::with_capacity(i + 1);
    for _ in 0..i {
        let mut max_idx = None;
        let mut max = F::neg_infinity();
        for (j, &d) in distances.iter().enumerate() {
            if !used[j] && d > max {
                max_idx = Some(j);
                max = d;
            }
        }
        match max_idx {
            Some(j) => {
                used[j] = true;
                top.push(j);
            }
            None => break,
        }
    }
    top
}

/// Position of the first maximum value
fn argmax_first<F: Float>(values: &[F]) -> Option<usize> {
    let mut best = None;
    let mut max = F::neg_infinity();
    for (i, &v) in values.iter().enumerate() {
        if v > max {
            best = Some(i);
            max = v;
        }
    }
    best
}

/// Every extension of `indices` by one trajectory of the pool not yet included:
/// `[1, 2]` with a pool of 4 gives `[[1, 2, 0], [1, 2, 3]]`.
fn add_indices(indices: &[usize], m: usize) -> Vec<Vec<usize>> {
    (0..m)
        .filter(|c| !indices.contains(c))
        .map(|c| {
            let mut extended = indices.to_vec();
            extended.push(c);
            extended
        })
        .collect()
}

/// Selects the `r` trajectories maximizing the summed pairwise distances given the
/// (M, M) distance matrix of the pool, with `r < M`.
pub fn select_trajectories<F: Float>(
    dm: &Array2<F>,
    r: usize,
    monitor: &Monitor,
) -> Result<Selection<F>> {
    let m = dm.nrows();
    if r <= 1 || r >= m {
        // no pair to spread, keep the first ones
        return Ok(Selection {
            indices: (0..r.min(m)).collect(),
            total: sum_distances(&(0..r.min(m)).collect::<Vec<_>>(), dm),
            seeds: vec![],
        });
    }

    let mut seeds = Vec::with_capacity(r - 1);
    let mut finals: Vec<Vec<usize>> = Vec::with_capacity(r - 1);
    let mut totals: Vec<F> = Vec::with_capacity(r - 1);

    monitor.start("Select EE trajectories", r - 1);
    for i in 1..r {
        monitor.check()?;
        let mut indices_list = Vec::with_capacity(m);
        let mut row_maxima_i = Vec::with_capacity(m);
        for row in 0..m {
            let mut indices = top_idx(dm.row(row), i, row);
            indices.push(row);
            row_maxima_i.push(sum_distances(&indices, dm));
            indices_list.push(indices);
        }
        let best = argmax_first(&row_maxima_i).unwrap_or(0);
        let seed = indices_list.swap_remove(best);
        let seed_total = row_maxima_i[best];

        let mut grown = seed.clone();
        while grown.len() < r {
            let candidates = add_indices(&grown, m);
            let sums: Vec<F> = candidates.iter().map(|c| sum_distances(c, dm)).collect();
            match argmax_first(&sums) {
                Some(best) => grown = candidates[best].clone(),
                None => break,
            }
        }
        let total = sum_distances(&grown, dm);
        debug!("subset size {i}: seed {seed:?} ({seed_total}), grown {grown:?} ({total})");

        seeds.push((seed, seed_total));
        finals.push(grown);
        totals.push(total);
        monitor.advance(i);
    }
    monitor.finish();

    let best = argmax_first(&totals).unwrap_or(0);
    let mut indices = finals.swap_remove(best);
    indices.sort_unstable();
    Ok(Selection {
        indices,
        total: totals[best],
        seeds,
    })
}

/// Extracts from a `(M * (k + 1), k)` pool of trajectories the `r` trajectories with the
/// largest spread, returned as a `(r * (k + 1), k)` matrix in pool order.
///
/// When `r >= M` the pool is returned unchanged.
pub fn opt_trajectories<F: Float>(
    pool: &ArrayBase<impl Data<Elem = F>, Ix2>,
    k: usize,
    r: usize,
    monitor: &Monitor,
) -> Result<Array2<F>> {
    let m = pool.nrows() / (k + 1);
    if r >= m {
        return Ok(pool.to_owned());
    }

    let dm = distance_matrix(pool, k, monitor)?;
    let selection = select_trajectories(&dm, r, monitor)?;
    debug!(
        "Selected trajectories {:?} with total distance {}",
        selection.indices, selection.total
    );

    let mut x = mat_new(r * (k + 1), k);
    let mut temp = mat_new(k + 1, k);
    for (i, &t) in selection.indices.iter().enumerate() {
        mat_ext_mat(&mut temp, pool, t * (k + 1));
        mat_ins_mat(&mut x, &temp, i * (k + 1));
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, s};

    // 5 trajectories of 2 factors
    fn pool() -> Array2<f64> {
        let t = 1. / 3.;
        array![
            [0., 0.],
            [2. * t, 0.],
            [2. * t, 2. * t],
            [t, t],
            [t, 1.],
            [1., 1.],
            [0., t],
            [0., 1.],
            [2. * t, 1.],
            [t, 0.],
            [1., 0.],
            [1., 2. * t],
            [2. * t, t],
            [0., t],
            [0., 1.]
        ]
    }

    #[test]
    fn test_distance_matrix() {
        let dm = distance_matrix(&pool(), 2, &Monitor::new()).unwrap();
        assert_eq!(dm.dim(), (5, 5));
        assert_abs_diff_eq!(dm, dm.t().to_owned());
        assert_abs_diff_eq!(dm[[0, 1]], 6.933513826497, epsilon = 1e-9);
        assert_abs_diff_eq!(dm[[2, 3]], 8.681577924292, epsilon = 1e-9);
        assert_abs_diff_eq!(dm[[2, 4]], 5.218951416497, epsilon = 1e-9);
        assert!(dm.diag().iter().all(|&d| d == 0.));
    }

    #[test]
    fn test_top_idx() {
        let row = array![0., 3., 1., 3., 2.];
        assert_eq!(top_idx(row.view(), 1, 0), vec![1]);
        assert_eq!(top_idx(row.view(), 3, 0), vec![1, 3, 4]);
        assert_eq!(top_idx(row.view(), 2, 1), vec![3, 4]);
        assert_eq!(top_idx(row.view(), 9, 0), vec![1, 3, 4, 2]);
    }

    #[test]
    fn test_add_indices() {
        assert_eq!(add_indices(&[1, 2], 4), vec![vec![1, 2, 0], vec![1, 2, 3]]);
    }

    #[test]
    fn test_select_trajectories() {
        let dm = distance_matrix(&pool(), 2, &Monitor::new()).unwrap();
        let selection = select_trajectories(&dm, 3, &Monitor::new()).unwrap();
        assert_eq!(selection.indices, vec![0, 2, 3]);
        assert_abs_diff_eq!(selection.total, 21.759265154755, epsilon = 1e-9);
        assert_eq!(selection.seeds.len(), 2);
        assert_eq!(selection.seeds[0].0, vec![3, 2]);
        assert_eq!(selection.seeds[1].0, vec![3, 0, 2]);
        for (_, seed_total) in &selection.seeds {
            assert!(selection.total >= *seed_total);
        }

        let selection = select_trajectories(&dm, 4, &Monitor::new()).unwrap();
        assert_eq!(selection.indices, vec![0, 1, 2, 3]);
        assert_abs_diff_eq!(selection.total, 41.770466211716, epsilon = 1e-9);
    }

    #[test]
    fn test_selection_is_locally_optimal() {
        let dm = distance_matrix(&pool(), 2, &Monitor::new()).unwrap();
        let selection = select_trajectories(&dm, 3, &Monitor::new()).unwrap();
        for out in &selection.indices {
            for candidate in (0..5).filter(|c| !selection.indices.contains(c)) {
                let swapped: Vec<usize> = selection
                    .indices
                    .iter()
                    .map(|&i| if i == *out { candidate } else { i })
                    .collect();
                assert!(sum_distances(&swapped, &dm) <= selection.total + 1e-12);
            }
        }
    }

    #[test]
    fn test_opt_trajectories_copies_blocks() {
        let pool = pool();
        let x = opt_trajectories(&pool, 2, 3, &Monitor::new()).unwrap();
        assert_eq!(x.dim(), (9, 2));
        assert_abs_diff_eq!(x.slice(s![0..3, ..]), pool.slice(s![0..3, ..]));
        assert_abs_diff_eq!(x.slice(s![3..6, ..]), pool.slice(s![6..9, ..]));
        assert_abs_diff_eq!(x.slice(s![6..9, ..]), pool.slice(s![9..12, ..]));
    }

    #[test]
    fn test_opt_trajectories_whole_pool() {
        let pool = pool();
        let x = opt_trajectories(&pool, 2, 5, &Monitor::new()).unwrap();
        assert_abs_diff_eq!(x, pool);
        let x = opt_trajectories(&pool, 2, 7, &Monitor::new()).unwrap();
        assert_abs_diff_eq!(x, pool);
    }

    #[test]
    fn test_opt_trajectories_cancelled() {
        let monitor = Monitor::new();
        monitor.cancel();
        assert!(opt_trajectories(&pool(), 2, 3, &monitor).is_err());
    }
}
