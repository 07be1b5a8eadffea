//! Scaling of normalized samples to the factor ranges.
use crate::design::Experiment;
use crate::errors::Result;
use crate::factor::Factor;
use ndarray::{ArrayBase, Data, Ix2};
use simdoe_sampling::Monitor;

/// How the columns of a normalized sample map to the factors
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Columns {
    /// Column `j` is used by every instance of factor `j`
    PerFactor,
    /// One column per instance, factors in order
    PerInstance,
}

impl Columns {
    /// Number of columns required by the factors
    pub fn count(&self, factors: &[Factor]) -> usize {
        match self {
            Columns::PerFactor => factors.len(),
            Columns::PerInstance => factors.iter().map(Factor::instances).sum(),
        }
    }
}

/// Scales each row of `samples` in `[0, 1]` into the `[low, high]` bounds of each
/// factor instance as `low + x * (high - low)`, then rounds integer factors.
///
/// **Panics** if `samples` has less columns than required by `columns`.
pub fn assemble(
    factors: &[Factor],
    samples: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    columns: Columns,
    monitor: &Monitor,
) -> Result<Vec<Experiment>> {
    assert!(
        samples.ncols() >= columns.count(factors),
        "assemble: not enough sample columns"
    );
    let mut experiments = Vec::with_capacity(samples.nrows());
    for row in samples.rows() {
        monitor.check()?;
        let mut col = 0;
        let values = factors
            .iter()
            .enumerate()
            .map(|(j, factor)| {
                factor
                    .bounds()
                    .iter()
                    .map(|&(lo, hi)| {
                        let x = match columns {
                            Columns::PerFactor => row[j],
                            Columns::PerInstance => {
                                col += 1;
                                row[col - 1]
                            }
                        };
                        let v = lo + x * (hi - lo);
                        if factor.is_integer() {
                            v.round()
                        } else {
                            v
                        }
                    })
                    .collect()
            })
            .collect();
        experiments.push(Experiment::new(values));
    }
    Ok(experiments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factor::FactorSpec;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn factors() -> Vec<Factor> {
        vec![
            Factor::resolve(&FactorSpec::parameter("a", &[0., 10., 100., 200.]).instances(2))
                .unwrap(),
            Factor::resolve(&FactorSpec::parameter("n", &[1., 5.]).integer(true)).unwrap(),
        ]
    }

    #[test]
    fn test_assemble_per_factor() {
        let samples = array![[0.25, 0.6], [1., 0.]];
        let exps = assemble(&factors(), &samples, Columns::PerFactor, &Monitor::new()).unwrap();
        assert_eq!(exps.len(), 2);
        assert_abs_diff_eq!(exps[0].factor(0)[0], 2.5);
        assert_abs_diff_eq!(exps[0].factor(0)[1], 125.);
        // 1 + 0.6 * 4 = 3.4
        assert_eq!(exps[0].factor(1), &[3.]);
        assert_eq!(exps[1].flatten().collect::<Vec<_>>(), vec![10., 200., 1.]);
    }

    #[test]
    fn test_assemble_per_instance() {
        let samples = array![[0.5, 0., 0.9]];
        assert_eq!(Columns::PerInstance.count(&factors()), 3);
        let exps = assemble(&factors(), &samples, Columns::PerInstance, &Monitor::new()).unwrap();
        // 1 + 0.9 * 4 = 4.6
        assert_eq!(exps[0].flatten().collect::<Vec<_>>(), vec![5., 100., 5.]);
    }

    #[test]
    fn test_assemble_cancelled() {
        let monitor = Monitor::new();
        monitor.cancel();
        let samples = array![[0.5, 0.5]];
        assert!(assemble(&factors(), &samples, Columns::PerFactor, &monitor).is_err());
    }
}
