//! Dense matrix helpers used by the samplers.
//!
//! Every operation writes into an explicit output buffer given as last argument
//! so that scratch matrices can be allocated once and reused across the
//! trajectories of a Morris pool or the rows of a distance matrix.
//! Shape mismatches between operands are caller contract violations and panic,
//! except for the block insert/extract operations which report them with `None`.
use linfa::Float;
use ndarray::{linalg::general_mat_mul, s, Array2, ArrayBase, Data, DataMut, Ix2, Zip};

/// Allocates a zeroed (m, n) matrix
pub fn mat_new<F: Float>(m: usize, n: usize) -> Array2<F> {
    Array2::zeros((m, n))
}

/// Matrix product `c <- a . b`
///
/// **Panics** if `a.ncols() != b.nrows()` or `c` is not `(a.nrows(), b.ncols())`-shaped.
pub fn mat_mult_mat<F: Float>(
    a: &ArrayBase<impl Data<Elem = F>, Ix2>,
    b: &ArrayBase<impl Data<Elem = F>, Ix2>,
    c: &mut ArrayBase<impl DataMut<Elem = F>, Ix2>,
) {
    general_mat_mul(F::one(), a, b, F::zero(), c);
}

/// Elementwise sum of same size matrices `c <- a + b`
pub fn mat_add_mat<F: Float>(
    a: &ArrayBase<impl Data<Elem = F>, Ix2>,
    b: &ArrayBase<impl Data<Elem = F>, Ix2>,
    c: &mut ArrayBase<impl DataMut<Elem = F>, Ix2>,
) {
    Zip::from(c)
        .and(a)
        .and(b)
        .for_each(|c, &a, &b| *c = a + b);
}

/// Multiplies all positions of a matrix by a scalar `c <- a * s`
pub fn mat_mult_scal<F: Float>(
    a: &ArrayBase<impl Data<Elem = F>, Ix2>,
    s: F,
    c: &mut ArrayBase<impl DataMut<Elem = F>, Ix2>,
) {
    Zip::from(c).and(a).for_each(|c, &a| *c = a * s);
}

/// Adds a scalar to all positions of a matrix `c <- a + s`
pub fn mat_add_scal<F: Float>(
    a: &ArrayBase<impl Data<Elem = F>, Ix2>,
    s: F,
    c: &mut ArrayBase<impl DataMut<Elem = F>, Ix2>,
) {
    Zip::from(c).and(a).for_each(|c, &a| *c = a + s);
}

/// Sets all positions of a matrix to a scalar
pub fn mat_copy_scal<F: Float>(a: &mut ArrayBase<impl DataMut<Elem = F>, Ix2>, s: F) {
    a.fill(s);
}

/// Copies a same size matrix `a <- b`
pub fn mat_copy_mat<F: Float>(
    a: &mut ArrayBase<impl DataMut<Elem = F>, Ix2>,
    b: &ArrayBase<impl Data<Elem = F>, Ix2>,
) {
    a.assign(b);
}

/// Replaces the rows `lpos..lpos + b.nrows()` of `a` by the rows of `b`.
///
/// Only the first `b.ncols()` columns of `a` are touched.
/// Returns `None`, leaving `a` untouched, when the block does not fit in `a`.
pub fn mat_ins_mat<F: Float>(
    a: &mut ArrayBase<impl DataMut<Elem = F>, Ix2>,
    b: &ArrayBase<impl Data<Elem = F>, Ix2>,
    lpos: usize,
) -> Option<()> {
    let (o, p) = b.dim();
    if lpos + o > a.nrows() || p > a.ncols() {
        return None;
    }
    a.slice_mut(s![lpos..lpos + o, ..p]).assign(b);
    Some(())
}

/// Fills `a` with the rows `lpos..lpos + a.nrows()` of `b` (first `a.ncols()` columns).
///
/// Returns `None`, leaving `a` untouched, when the block does not fit in `b`.
pub fn mat_ext_mat<F: Float>(
    a: &mut ArrayBase<impl DataMut<Elem = F>, Ix2>,
    b: &ArrayBase<impl Data<Elem = F>, Ix2>,
    lpos: usize,
) -> Option<()> {
    let (m, n) = a.dim();
    if lpos + m > b.nrows() || n > b.ncols() {
        return None;
    }
    a.assign(&b.slice(s![lpos..lpos + m, ..n]));
    Some(())
}

/// Sums the Euclidean distances between all pairs of rows `(a_i, b_k)`
/// of two matrices having the same number of columns.
///
/// With single-row matrices this is the plain Euclidean distance.
pub fn mat_sum_dists<F: Float>(
    a: &ArrayBase<impl Data<Elem = F>, Ix2>,
    b: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> F {
    assert_eq!(
        a.ncols(),
        b.ncols(),
        "mat_sum_dists: operands should have same nb of columns"
    );
    let mut sum = F::zero();
    for row_a in a.rows() {
        for row_b in b.rows() {
            let dist2 = Zip::from(&row_a)
                .and(&row_b)
                .fold(F::zero(), |acc, &x, &y| acc + (x - y) * (x - y));
            sum += dist2.sqrt();
        }
    }
    sum
}
