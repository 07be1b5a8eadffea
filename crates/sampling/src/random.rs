use std::sync::{Arc, RwLock};

use crate::errors::Result;
use crate::progress::Monitor;
use crate::{lock_rng, RngRef, SamplingMethod};
use linfa::Float;
use ndarray::{Array2, ArrayBase, Data, Ix2};
use ndarray_rand::{rand::Rng, rand::SeedableRng, rand_distr::Uniform};
use rand_xoshiro::Xoshiro256Plus;

/// Uniform random design: every component of every sample is an independent draw.
#[derive(Clone, Debug)]
pub struct Random<F: Float, R: Rng> {
    /// `(nx, 2)` box of `[low, high]` rows
    xlimits: Array2<F>,
    /// Generator, possibly shared with other samplers
    rng: RngRef<R>,
    /// Cancellation and progress
    monitor: Monitor,
}

impl<F: Float> Random<F, Xoshiro256Plus> {
    /// Random design over the `(nx, 2)` box `xlimits`, seeded from entropy
    ///
    /// ```
    /// use simdoe_sampling::Random;
    /// use ndarray::arr2;
    ///
    /// let doe = Random::new(&arr2(&[[0.0, 1.0], [5.0, 10.0]]));
    /// ```
    pub fn new(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Self {
        Self::new_with_rng(xlimits, Xoshiro256Plus::from_entropy())
    }
}

impl<F: Float, R: Rng> Random<F, R> {
    /// Random design drawing from `rng`, for reproducible samples
    ///
    /// **Panics** if xlimits number of columns is different from 2.
    pub fn new_with_rng(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>, rng: R) -> Self {
        Self::new_with_shared_rng(xlimits, Arc::new(RwLock::new(rng)))
    }

    /// Constructor drawing from a random generator shared with other samplers
    ///
    /// **Panics** if xlimits number of columns is different from 2.
    pub fn new_with_shared_rng(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>, rng: RngRef<R>) -> Self {
        if xlimits.ncols() != 2 {
            panic!("xlimits must have 2 columns (lower, upper)");
        }
        Random {
            xlimits: xlimits.to_owned(),
            rng,
            monitor: Monitor::default(),
        }
    }

    /// Replaces the generator by a private one
    pub fn with_rng<R2: Rng>(self, rng: R2) -> Random<F, R2> {
        Random {
            xlimits: self.xlimits,
            rng: Arc::new(RwLock::new(rng)),
            monitor: self.monitor,
        }
    }

    /// Sets the cancellation flag and progress reporter
    pub fn with_monitor(mut self, monitor: Monitor) -> Self {
        self.monitor = monitor;
        self
    }
}

impl<F: Float, R: Rng> SamplingMethod<F> for Random<F, R> {
    fn sampling_space(&self) -> &Array2<F> {
        &self.xlimits
    }

    /// Draws row by row (experiment by experiment), checking cancellation in between
    fn normalized_sample(&self, ns: usize) -> Result<Array2<F>> {
        let mut rng = lock_rng(&self.rng)?;
        let nx = self.xlimits.nrows();
        let unif = Uniform::new(0., 1.);
        let mut doe = Array2::zeros((ns, nx));
        self.monitor.start("Random sampling", ns);
        for (i, mut row) in doe.rows_mut().into_iter().enumerate() {
            self.monitor.check()?;
            row.iter_mut()
                .for_each(|v| *v = F::cast(rng.sample(unif)));
            self.monitor.advance(i + 1);
        }
        self.monitor.finish();
        Ok(doe)
    }
}
