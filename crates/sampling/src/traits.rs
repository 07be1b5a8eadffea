use crate::errors::Result;
use linfa::Float;
use ndarray::{Array2, Axis};

/// A way to place `ns` points in a box of `R^nx`.
///
/// Implementors work in the unit hypercube `[0, 1]^nx` and the box, given as a
/// `(nx, 2)` matrix of `[low, high]` rows, is only used to scale the result.
/// Sampling is fallible as it may be cancelled through the [`Monitor`](crate::Monitor)
/// of the sampler.
pub trait SamplingMethod<F: Float> {
    /// The `(nx, 2)` box the samples are scaled to
    fn sampling_space(&self) -> &Array2<F>;

    /// Number of components `nx` of a sample
    fn dim(&self) -> usize {
        self.sampling_space().nrows()
    }

    /// `ns` samples of the unit hypercube as a `(ns, nx)` matrix
    fn normalized_sample(&self, ns: usize) -> Result<Array2<F>>;

    /// `ns` samples as a `(ns, nx)` matrix, component `i` being mapped linearly
    /// from `[0, 1]` to the `i`th row of the sampling space
    fn sample(&self, ns: usize) -> Result<Array2<F>> {
        let space = self.sampling_space();
        let low = space.index_axis(Axis(1), 0);
        let width = &space.index_axis(Axis(1), 1) - &low;
        Ok(self.normalized_sample(ns)? * width + low)
    }
}
