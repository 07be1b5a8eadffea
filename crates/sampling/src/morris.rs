//! Elementary Effects sampling (Morris One-At-a-Time).
//!
//! A trajectory is made of `k + 1` points of the `[0, 1]^k` grid with `p` levels:
//! starting from a random base point, each following point moves exactly one factor
//! by `delta = jump / (p - 1)`. Factors are visited in random order with a random
//! direction.
//!
//! Reference: Morris, M. D. (1991), "Factorial sampling plans for preliminary computational
//! experiments", Technometrics 33:161-174.
//!
//! A pool of `M` trajectories is generated then the `r` trajectories with the largest
//! spread are kept (see [`optimizer`](crate::optimizer)).
use std::sync::{Arc, RwLock};

use crate::errors::{Result, SamplingError};
use crate::matrix::{
    mat_add_mat, mat_add_scal, mat_copy_scal, mat_ins_mat, mat_mult_mat, mat_mult_scal, mat_new,
};
use crate::optimizer::opt_trajectories;
use crate::progress::Monitor;
use crate::{lock_rng, RngRef, SamplingMethod};
use linfa::Float;
use log::debug;
use ndarray::{Array2, ArrayBase, Data, Ix2};
use ndarray_rand::rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

/// Default number of grid levels
pub const MORRIS_DEF_LEVELS: usize = 4;
/// Default jump in grid levels between two points of a trajectory
pub const MORRIS_DEF_JUMP: usize = 2;

/// The Morris OAT design generates trajectories suited to the elementary effects
/// screening of the factors.
#[derive(Clone, Debug)]
pub struct MorrisOat<F: Float, R: Rng> {
    /// Sampling space definition as a (nx, 2) matrix
    /// The ith row is the [lower_bound, upper_bound] of xi, the ith component of x
    xlimits: Array2<F>,
    /// Number of levels `p` of the grid
    levels: usize,
    /// Step in grid levels
    jump: usize,
    /// Number of trajectories of the pool, defaults to the requested number of trajectories
    pool_size: Option<usize>,
    /// Random generator used for reproducibility
    rng: RngRef<R>,
    /// Cancellation and progress
    monitor: Monitor,
}

impl<F: Float> MorrisOat<F, Xoshiro256Plus> {
    /// Constructor given a design space given a (nx, 2) matrix \[\[lower bound, upper bound\], ...\]
    ///
    /// ```
    /// use simdoe_sampling::MorrisOat;
    /// use ndarray::arr2;
    ///
    /// let doe = MorrisOat::new(&arr2(&[[0.0, 1.0], [5.0, 10.0]]));
    /// ```
    pub fn new(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Self {
        Self::new_with_rng(xlimits, Xoshiro256Plus::from_entropy())
    }
}

impl<F: Float, R: Rng> MorrisOat<F, R> {
    /// Constructor given a design space and a random generator for reproducibility
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
        MorrisOat {
            xlimits: xlimits.to_owned(),
            levels: MORRIS_DEF_LEVELS,
            jump: MORRIS_DEF_JUMP,
            pool_size: None,
            rng,
            monitor: Monitor::default(),
        }
    }

    /// Sets the number of levels `p` of the grid
    pub fn levels(mut self, levels: usize) -> Self {
        self.levels = levels;
        self
    }

    /// Sets the jump in grid levels, `delta = jump / (p - 1)`
    pub fn jump(mut self, jump: usize) -> Self {
        self.jump = jump;
        self
    }

    /// Sets the number of trajectories of the pool the trajectories are picked from
    pub fn pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = Some(pool_size);
        self
    }

    /// Set random generator
    pub fn with_rng<R2: Rng>(self, rng: R2) -> MorrisOat<F, R2> {
        MorrisOat {
            xlimits: self.xlimits,
            levels: self.levels,
            jump: self.jump,
            pool_size: self.pool_size,
            rng: Arc::new(RwLock::new(rng)),
            monitor: self.monitor,
        }
    }

    /// Sets the cancellation flag and progress reporter
    pub fn with_monitor(mut self, monitor: Monitor) -> Self {
        self.monitor = monitor;
        self
    }

    /// Step between two consecutive points of a trajectory in normalized units
    pub fn delta(&self) -> F {
        F::cast(self.jump) / F::cast(self.levels.saturating_sub(1).max(1))
    }

    fn check(&self) -> Result<()> {
        if self.xlimits.nrows() == 0 {
            return Err(SamplingError::InvalidValue(
                "Morris sampling requires at least one factor".to_string(),
            ));
        }
        if self.levels < 2 {
            return Err(SamplingError::InvalidValue(format!(
                "Morris sampling requires at least 2 levels, got {}",
                self.levels
            )));
        }
        if self.jump == 0 || self.jump >= self.levels {
            return Err(SamplingError::InvalidValue(format!(
                "Morris jump should be in [1, {}], got {}",
                self.levels - 1,
                self.jump
            )));
        }
        Ok(())
    }

    /// Generates a `(m * (k + 1), k)` pool of `m` trajectories in `[0, 1]^k`
    ///
    /// Each trajectory is `x* + delta / 2 * ((B . P . D) + 1)` where `B` is the
    /// `(k + 1, k)` orientation matrix (1 below the diagonal, -1 elsewhere), `P` a
    /// random permutation matrix, `D` a random diagonal matrix of signs and `x*` the
    /// base point drawn on the grid so that the trajectory stays in the hypercube.
    pub fn generate_pool(&self, m: usize) -> Result<Array2<F>> {
        self.check()?;
        let k = self.xlimits.nrows();
        let p = self.levels;
        let delta = self.delta();
        let mut rng = lock_rng(&self.rng)?;

        let mut b = mat_new(k + 1, k);
        for ((i, j), v) in b.indexed_iter_mut() {
            *v = if i > j { F::one() } else { -F::one() };
        }
        let mut perm_mat = mat_new(k, k);
        let mut sign_mat = mat_new(k, k);
        let mut x_base = mat_new(k + 1, k);
        let mut temp1 = mat_new(k + 1, k);
        let mut temp2 = mat_new(k + 1, k);
        let mut pool = mat_new(m * (k + 1), k);
        let mut perm: Vec<usize> = (0..k).collect();

        self.monitor.start("Generate EE trajectories", m);
        for l in 0..m {
            self.monitor.check()?;

            mat_copy_scal(&mut sign_mat, F::zero());
            for i in 0..k {
                sign_mat[[i, i]] = if rng.gen::<f64>() < 0.5 {
                    -F::one()
                } else {
                    F::one()
                };
            }

            perm.shuffle(&mut *rng);
            mat_copy_scal(&mut perm_mat, F::zero());
            for (i, &pi) in perm.iter().enumerate() {
                perm_mat[[i, pi]] = F::one();
            }

            for j in 0..k {
                let level = rng.gen_range(0..=p - self.jump - 1);
                let x = F::cast(level) / F::cast(p - 1);
                x_base.column_mut(j).fill(x);
            }

            mat_mult_mat(&b, &perm_mat, &mut temp1);
            mat_mult_mat(&temp1, &sign_mat, &mut temp2);
            mat_add_scal(&temp2, F::one(), &mut temp1);
            mat_mult_scal(&temp1, F::cast(0.5) * delta, &mut temp2);
            mat_add_mat(&temp2, &x_base, &mut temp1);
            mat_ins_mat(&mut pool, &temp1, l * (k + 1));

            self.monitor.advance(l + 1);
        }
        self.monitor.finish();
        debug!("Pool of {m} trajectories generated (k={k}, p={p}, delta={delta})");
        Ok(pool)
    }

    /// Generates `r` trajectories as a `(r * (k + 1), k)` matrix in `[0, 1]^k`,
    /// picked among the pool as the ones with the largest spread.
    pub fn normalized_trajectories(&self, r: usize) -> Result<Array2<F>> {
        let m = self.pool_size.unwrap_or(r);
        if r > m {
            return Err(SamplingError::InvalidValue(format!(
                "cannot pick {r} trajectories from a pool of {m}"
            )));
        }
        let k = self.xlimits.nrows();
        let pool = self.generate_pool(m)?;
        opt_trajectories(&pool, k, r, &self.monitor)
    }

    /// Generates `r` trajectories scaled to the sampling space
    pub fn trajectories(&self, r: usize) -> Result<Array2<F>> {
        self.sample(r * (self.xlimits.nrows() + 1))
    }
}

impl<F: Float, R: Rng> SamplingMethod<F> for MorrisOat<F, R> {
    fn sampling_space(&self) -> &Array2<F> {
        &self.xlimits
    }

    /// `ns` should be a multiple of `nx + 1`, the number of points of a trajectory
    fn normalized_sample(&self, ns: usize) -> Result<Array2<F>> {
        let npoints = self.xlimits.nrows() + 1;
        if ns % npoints != 0 {
            return Err(SamplingError::InvalidValue(format!(
                "Morris sample size should be a multiple of {npoints}, got {ns}"
            )));
        }
        self.normalized_trajectories(ns / npoints)
    }
}
