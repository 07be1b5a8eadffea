//! Factors of a design and resolution of their per-instance ranges.
use log::debug;

#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// How a factor value is set in the model
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum FactorKind {
    /// Instantaneous parameter
    Parameter,
    /// Variable with the lagged value to set
    Variable {
        /// Lag index (0 is the current value)
        lag: usize,
    },
}

impl FactorKind {
    /// Lag index of the value to set, 0 for parameters
    pub fn lag(&self) -> usize {
        match self {
            FactorKind::Parameter => 0,
            FactorKind::Variable { lag } => *lag,
        }
    }
}

/// A factor as selected for sensitivity variation
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct FactorSpec {
    /// Factor label
    pub label: String,
    /// Parameter or lagged variable
    pub kind: FactorKind,
    /// Raw values consumed by (low, high) pairs, one pair per instance
    pub values: Vec<f64>,
    /// Whether the values are rounded to the nearest integer
    pub integer: bool,
    /// Number of live instances of the owning entity
    pub instances: usize,
}

impl FactorSpec {
    /// A single instance parameter with the given raw values
    pub fn parameter(label: impl Into<String>, values: &[f64]) -> Self {
        FactorSpec {
            label: label.into(),
            kind: FactorKind::Parameter,
            values: values.to_vec(),
            integer: false,
            instances: 1,
        }
    }

    /// A single instance variable with the given lag and raw values
    pub fn variable(label: impl Into<String>, lag: usize, values: &[f64]) -> Self {
        FactorSpec {
            kind: FactorKind::Variable { lag },
            ..Self::parameter(label, values)
        }
    }

    /// Sets the number of instances
    pub fn instances(mut self, instances: usize) -> Self {
        self.instances = instances;
        self
    }

    /// Sets the integer rounding flag
    pub fn integer(mut self, integer: bool) -> Self {
        self.integer = integer;
        self
    }
}

/// A factor of a design with its resolved `(low, high)` bounds per instance
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Factor {
    label: String,
    kind: FactorKind,
    integer: bool,
    bounds: Vec<(f64, f64)>,
}

impl Factor {
    /// Resolves the bounds of each instance from the raw values of the factor.
    ///
    /// Values are taken by pairs, `(v[0], v[1])` for instance 0, `(v[2], v[3])` for
    /// instance 1 and so on, an odd trailing value being discarded. When there are fewer
    /// pairs than instances the last pair is repeated for the remaining instances.
    ///
    /// Returns `None` when the factor has no instance or less than two values.
    pub fn resolve(spec: &FactorSpec) -> Option<Factor> {
        let pairs: Vec<(f64, f64)> = spec
            .values
            .chunks_exact(2)
            .map(|p| (p[0].min(p[1]), p[0].max(p[1])))
            .collect();
        let last = *pairs.last()?;
        if spec.instances == 0 {
            return None;
        }
        let bounds = (0..spec.instances)
            .map(|h| pairs.get(h).copied().unwrap_or(last))
            .collect();
        Some(Factor {
            label: spec.label.clone(),
            kind: spec.kind,
            integer: spec.integer,
            bounds,
        })
    }

    /// Factor label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Parameter or lagged variable
    pub fn kind(&self) -> FactorKind {
        self.kind
    }

    /// Whether the values are rounded to the nearest integer
    pub fn is_integer(&self) -> bool {
        self.integer
    }

    /// Number of instances
    pub fn instances(&self) -> usize {
        self.bounds.len()
    }

    /// `(low, high)` bounds of each instance
    pub fn bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }

    /// Column header of each instance: the bare label then `label.2`, `label.3`...
    pub fn headers(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.instances()).map(move |h| match h {
            0 => self.label.clone(),
            h => format!("{}.{}", self.label, h + 1),
        })
    }
}

/// Resolves the factors taking part in the design, in order.
///
/// Factors without instance or with less than two values are left out.
pub fn resolve_factors(specs: &[FactorSpec]) -> Vec<Factor> {
    specs
        .iter()
        .filter_map(|spec| {
            let factor = Factor::resolve(spec);
            if factor.is_none() {
                debug!(
                    "Factor {} skipped ({} instances, {} values)",
                    spec.label,
                    spec.instances,
                    spec.values.len()
                );
            }
            factor
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_pairs() {
        let spec = FactorSpec::parameter("alpha", &[1., 0., 5., 10.]).instances(2);
        let factor = Factor::resolve(&spec).unwrap();
        assert_eq!(factor.bounds(), &[(0., 1.), (5., 10.)]);
    }

    #[test]
    fn test_resolve_recycles_last_pair() {
        let spec = FactorSpec::parameter("alpha", &[0., 1., 2., 3.]).instances(4);
        let factor = Factor::resolve(&spec).unwrap();
        assert_eq!(factor.bounds(), &[(0., 1.), (2., 3.), (2., 3.), (2., 3.)]);
    }

    #[test]
    fn test_resolve_drops_odd_value() {
        let spec = FactorSpec::variable("x", 1, &[0., 1., 7.]).instances(2);
        let factor = Factor::resolve(&spec).unwrap();
        assert_eq!(factor.bounds(), &[(0., 1.), (0., 1.)]);
        assert_eq!(factor.kind().lag(), 1);
    }

    #[test]
    fn test_resolve_excluded() {
        assert!(Factor::resolve(&FactorSpec::parameter("a", &[1.])).is_none());
        assert!(Factor::resolve(&FactorSpec::parameter("a", &[1., 2.]).instances(0)).is_none());
        let specs = vec![
            FactorSpec::parameter("a", &[1.]),
            FactorSpec::parameter("b", &[1., 2.]),
            FactorSpec::parameter("c", &[]),
        ];
        let factors = resolve_factors(&specs);
        assert_eq!(factors.len(), 1);
        assert_eq!(factors[0].label(), "b");
    }

    #[test]
    fn test_headers() {
        let spec = FactorSpec::parameter("beta", &[0., 1.]).instances(3);
        let factor = Factor::resolve(&spec).unwrap();
        assert_eq!(
            factor.headers().collect::<Vec<_>>(),
            vec!["beta", "beta.2", "beta.3"]
        );
    }
}
