use crate::errors::SamplingError;
use crate::progress::Monitor;
use log::debug;
use ndarray_rand::rand::Rng;

/// The FullFactorial design consists of all possible combinations
/// of levels for all components, the last component varying fastest.
///
/// Points are described by the level index of each component, it is up to the
/// caller to map them to actual values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FullFactorial {
    /// Number of levels of each component
    levels: Vec<usize>,
}

impl FullFactorial {
    /// Constructor given the number of levels of each component
    ///
    /// ```
    /// use simdoe_sampling::FullFactorial;
    ///
    /// let doe = FullFactorial::new(&[3, 2]);
    /// assert_eq!(doe.points(), 6);
    /// assert_eq!(doe.indices(1), vec![0, 1]);
    /// ```
    pub fn new(levels: &[usize]) -> Self {
        FullFactorial {
            levels: levels.to_vec(),
        }
    }

    /// Number of levels of each component
    pub fn levels(&self) -> &[usize] {
        &self.levels
    }

    /// Total number of combinations, zero when any component has no level
    pub fn points(&self) -> usize {
        if self.levels.is_empty() {
            return 0;
        }
        self.levels.iter().product()
    }

    /// Level indices of the `n`th combination
    pub fn indices(&self, n: usize) -> Vec<usize> {
        let mut idx = vec![0; self.levels.len()];
        let mut rest = n;
        for (i, &l) in self.levels.iter().enumerate().rev() {
            if l > 0 {
                idx[i] = rest % l;
                rest /= l;
            }
        }
        idx
    }

    /// All combinations in order
    pub fn iter(&self) -> impl Iterator<Item = Vec<usize>> + '_ {
        (0..self.points()).map(move |n| self.indices(n))
    }

    /// Walks all combinations in order and hands each one to `visit` with probability
    /// `prob` (one uniform draw per combination unless `prob >= 1`).
    ///
    /// Cancellation is checked before each combination. Returns the number of
    /// combinations visited.
    pub fn visit<R, E>(
        &self,
        prob: f64,
        rng: &mut R,
        monitor: &Monitor,
        mut visit: impl FnMut(usize, &[usize]) -> Result<(), E>,
    ) -> Result<usize, E>
    where
        R: Rng + ?Sized,
        E: From<SamplingError>,
    {
        let points = self.points();
        let mut idx = vec![0; self.levels.len()];
        let mut count = 0;
        monitor.start("Full factorial exploration", points);
        for n in 0..points {
            monitor.check()?;
            if prob >= 1. || rng.gen::<f64>() < prob {
                visit(n, &idx)?;
                count += 1;
            }
            // odometer increment, last component first
            for i in (0..idx.len()).rev() {
                idx[i] += 1;
                if idx[i] < self.levels[i] {
                    break;
                }
                idx[i] = 0;
            }
            monitor.advance(n + 1);
        }
        monitor.finish();
        debug!("{count} out of {points} combinations visited");
        Ok(count)
    }
}
