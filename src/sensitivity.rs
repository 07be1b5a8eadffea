//! Sequential exploration of explicit factor values (full factorial).
use crate::design::{Dispatch, ExperimentSink, Setting};
use crate::errors::{DoeError, Result};
use crate::factor::FactorKind;
use log::info;
use ndarray::Array1;
use ndarray_rand::rand::Rng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use simdoe_sampling::{FullFactorial, Monitor, SamplingError};

/// A compact way to give a series of values
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ValueClause {
    /// `samples` evenly spaced values from the lowest to the highest bound
    Linear {
        /// First bound
        start: f64,
        /// Second bound
        end: f64,
        /// Number of values
        samples: usize,
    },
    /// `samples` uniformly drawn values between the bounds
    Random {
        /// First bound
        start: f64,
        /// Second bound
        end: f64,
        /// Number of values
        samples: usize,
    },
}

impl ValueClause {
    /// Expands the clause to its values, rounded to the nearest integer if required
    pub fn expand<R: Rng + ?Sized>(&self, integer: bool, rng: &mut R) -> Vec<f64> {
        let round = |v: f64| if integer { v.round() } else { v };
        match *self {
            ValueClause::Linear {
                start,
                end,
                samples,
            } => {
                let (lo, hi) = (start.min(end), start.max(end));
                match samples {
                    0 => vec![],
                    1 => vec![round(lo)],
                    n => Array1::linspace(lo, hi, n).mapv(round).to_vec(),
                }
            }
            ValueClause::Random {
                start,
                end,
                samples,
            } => {
                let (lo, hi) = (start.min(end), start.max(end));
                Array1::random_using(samples, Uniform::new(0., 1.), rng)
                    .mapv(|x| round(lo + x * (hi - lo)))
                    .to_vec()
            }
        }
    }
}

/// A factor explored over an explicit list of values
#[derive(Clone, Debug, PartialEq)]
pub struct SensitivityFactor {
    /// Factor label
    pub label: String,
    /// Parameter or lagged variable
    pub kind: FactorKind,
    /// Values to explore
    pub values: Vec<f64>,
    /// Whether the values are rounded to the nearest integer
    pub integer: bool,
}

impl SensitivityFactor {
    /// A parameter explored over the given values
    pub fn parameter(label: impl Into<String>, values: &[f64]) -> Self {
        SensitivityFactor {
            label: label.into(),
            kind: FactorKind::Parameter,
            values: values.to_vec(),
            integer: false,
        }
    }

    /// Sets the integer rounding flag
    pub fn integer(mut self, integer: bool) -> Self {
        self.integer = integer;
        self
    }
}

/// The space of all combinations of the factors values
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SensitivitySpace {
    factors: Vec<SensitivityFactor>,
}

impl SensitivitySpace {
    /// Space of the given factors, the last one varying fastest
    pub fn new(factors: Vec<SensitivityFactor>) -> Self {
        SensitivitySpace { factors }
    }

    /// Factors of the space
    pub fn factors(&self) -> &[SensitivityFactor] {
        &self.factors
    }

    /// Number of points of the space
    pub fn points(&self) -> usize {
        self.full_factorial().points()
    }

    /// Number of factors actually varying (at least 2 values)
    pub fn variables(&self) -> usize {
        self.factors.iter().filter(|f| f.values.len() > 1).count()
    }

    fn full_factorial(&self) -> FullFactorial {
        let levels: Vec<usize> = self.factors.iter().map(|f| f.values.len()).collect();
        FullFactorial::new(&levels)
    }

    /// Hands the points of the space to `sink`, each one being kept with probability `prob`.
    ///
    /// Kept points are numbered from `first_index`. Each setting holds a single value
    /// applying to every instance of the factor.
    pub fn enumerate<R: Rng + ?Sized, S: ExperimentSink>(
        &self,
        first_index: usize,
        prob: f64,
        rng: &mut R,
        mut sink: S,
        monitor: &Monitor,
    ) -> Result<Dispatch> {
        if !(prob > 0. && prob <= 1.) {
            return Err(DoeError::Config(format!(
                "sampling probability should be in ]0, 1], got {prob}"
            )));
        }
        let mut count = 0;
        let res = self.full_factorial().visit(prob, rng, monitor, |_, idx| {
            let values: Vec<f64> = self
                .factors
                .iter()
                .zip(idx)
                .map(|(f, &i)| {
                    if f.integer {
                        f.values[i].round()
                    } else {
                        f.values[i]
                    }
                })
                .collect();
            let settings: Vec<Setting> = self
                .factors
                .iter()
                .zip(&values)
                .map(|(f, v)| Setting {
                    label: &f.label,
                    kind: f.kind,
                    values: std::slice::from_ref(v),
                })
                .collect();
            sink.write_experiment(first_index + count, &settings)?;
            count += 1;
            Ok::<_, DoeError>(())
        });
        match res {
            Ok(n) => {
                info!("{n} configurations created out of {} points", self.points());
                Ok(Dispatch::Completed(n))
            }
            Err(DoeError::Sampling(SamplingError::Cancelled)) => Ok(Dispatch::Cancelled(count)),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray_rand::rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    struct Recorder(Vec<(usize, Vec<f64>)>);

    impl ExperimentSink for Recorder {
        fn write_experiment(&mut self, index: usize, settings: &[Setting<'_>]) -> Result<()> {
            self.0
                .push((index, settings.iter().map(|s| s.values[0]).collect()));
            Ok(())
        }
    }

    fn space() -> SensitivitySpace {
        SensitivitySpace::new(vec![
            SensitivityFactor::parameter("a", &[1., 2.]),
            SensitivityFactor::parameter("b", &[0.]),
            SensitivityFactor::parameter("c", &[0.4, 1.6, 2.5]).integer(true),
        ])
    }

    #[test]
    fn test_linear_clause() {
        let mut rng = Xoshiro256Plus::seed_from_u64(0);
        let clause = ValueClause::Linear {
            start: 10.,
            end: 0.,
            samples: 5,
        };
        assert_eq!(clause.expand(false, &mut rng), vec![0., 2.5, 5., 7.5, 10.]);
        assert_eq!(clause.expand(true, &mut rng), vec![0., 3., 5., 8., 10.]);
    }

    #[test]
    fn test_random_clause() {
        let mut rng = Xoshiro256Plus::seed_from_u64(0);
        let clause = ValueClause::Random {
            start: -1.,
            end: 1.,
            samples: 20,
        };
        let values = clause.expand(false, &mut rng);
        assert_eq!(values.len(), 20);
        assert!(values.iter().all(|v| (-1. ..=1.).contains(v)));
        let mut rng = Xoshiro256Plus::seed_from_u64(0);
        assert_eq!(values, clause.expand(false, &mut rng));
    }

    #[test]
    fn test_space_size() {
        assert_eq!(space().points(), 6);
        assert_eq!(space().variables(), 2);
    }

    #[test]
    fn test_enumerate_all() {
        let mut rng = Xoshiro256Plus::seed_from_u64(0);
        let mut recorder = Recorder(vec![]);
        let res = space()
            .enumerate(1, 1., &mut rng, &mut recorder, &Monitor::new())
            .unwrap();
        assert_eq!(res, Dispatch::Completed(6));
        assert_eq!(recorder.0[0], (1, vec![1., 0., 0.]));
        assert_eq!(recorder.0[1], (2, vec![1., 0., 2.]));
        assert_eq!(recorder.0[5].0, 6);
        assert_abs_diff_eq!(recorder.0[5].1[2], 3.);
    }

    #[test]
    fn test_enumerate_cancelled() {
        let monitor = Monitor::new();
        monitor.cancel();
        let mut rng = Xoshiro256Plus::seed_from_u64(0);
        let res = space()
            .enumerate(1, 1., &mut rng, Recorder(vec![]), &monitor)
            .unwrap();
        assert_eq!(res, Dispatch::Cancelled(0));
    }

    #[test]
    fn test_enumerate_invalid_probability() {
        let mut rng = Xoshiro256Plus::seed_from_u64(0);
        let res = space().enumerate(1, 0., &mut rng, Recorder(vec![]), &Monitor::new());
        assert!(matches!(res, Err(DoeError::Config(_))));
    }
}
