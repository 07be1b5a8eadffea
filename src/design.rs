//! The design of experiments table and its dispatch to the model configurations.
use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::factor::{Factor, FactorKind};
use log::info;
use simdoe_sampling::Monitor;

/// State of a design
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DesignStatus {
    /// All experiments are available
    Complete,
    /// The design could not be built from the factors and settings
    Invalid,
    /// The generation was cancelled
    Incomplete,
}

/// Values of one experiment: for each factor, one value per instance
#[derive(Clone, Debug, PartialEq)]
pub struct Experiment {
    values: Vec<Vec<f64>>,
}

impl Experiment {
    /// Builds an experiment from the per-factor per-instance values
    pub fn new(values: Vec<Vec<f64>>) -> Self {
        Experiment { values }
    }

    /// Values of the instances of the `j`th factor
    pub fn factor(&self, j: usize) -> &[f64] {
        &self.values[j]
    }

    /// Values of all factors
    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// Values of all instances of all factors, in column order
    pub fn flatten(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().flatten().copied()
    }
}

/// The value a factor takes in a given experiment
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Setting<'a> {
    /// Factor label
    pub label: &'a str,
    /// Parameter or lagged variable
    pub kind: FactorKind,
    /// One value per instance, a single value applying to every instance
    pub values: &'a [f64],
}

/// Receiver of the experiments, typically writing one model configuration per experiment
pub trait ExperimentSink {
    /// Stores the settings of experiment `index`
    fn write_experiment(&mut self, index: usize, settings: &[Setting<'_>]) -> Result<()>;
}

impl<S: ExperimentSink + ?Sized> ExperimentSink for &mut S {
    fn write_experiment(&mut self, index: usize, settings: &[Setting<'_>]) -> Result<()> {
        (**self).write_experiment(index, settings)
    }
}

/// Outcome of a dispatch of experiments to a sink
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// All experiments were written, with their count
    Completed(usize),
    /// Cancelled after the given count of experiments
    Cancelled(usize),
}

/// A design of experiments: `n` experiments over `k` factors.
///
/// An invalid design has no factor and no experiment, callers should check
/// [Design::is_valid] before using it.
#[derive(Clone, Debug, PartialEq)]
pub struct Design {
    status: DesignStatus,
    factors: Vec<Factor>,
    experiments: Vec<Experiment>,
    file: Option<PathBuf>,
}

impl Design {
    /// A complete design
    pub fn new(factors: Vec<Factor>, experiments: Vec<Experiment>) -> Self {
        Design {
            status: DesignStatus::Complete,
            factors,
            experiments,
            file: None,
        }
    }

    /// The invalid design sentinel: no factor, no experiment
    pub fn invalid() -> Self {
        Design {
            status: DesignStatus::Invalid,
            factors: vec![],
            experiments: vec![],
            file: None,
        }
    }

    /// A design whose generation was cancelled before any experiment was assembled
    pub fn incomplete(factors: Vec<Factor>) -> Self {
        Design {
            status: DesignStatus::Incomplete,
            factors,
            experiments: vec![],
            file: None,
        }
    }

    pub(crate) fn with_file(mut self, file: PathBuf) -> Self {
        self.file = Some(file);
        self
    }

    /// State of the design
    pub fn status(&self) -> DesignStatus {
        self.status
    }

    /// Whether the design is complete
    pub fn is_valid(&self) -> bool {
        self.status == DesignStatus::Complete
    }

    /// Number of factors `k`
    pub fn k(&self) -> usize {
        self.factors.len()
    }

    /// Number of experiments `n`
    pub fn n(&self) -> usize {
        self.experiments.len()
    }

    /// Factors in column order
    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    /// Experiments in order
    pub fn experiments(&self) -> &[Experiment] {
        &self.experiments
    }

    /// Value of experiment `i`, factor `j`, instance `h`
    pub fn value(&self, i: usize, j: usize, h: usize) -> f64 {
        self.experiments[i].factor(j)[h]
    }

    /// File the design was saved to, if any
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Hands every experiment to `sink` in order, numbered from `first_index`.
    ///
    /// Cancellation is checked before each experiment.
    pub fn dispatch<S: ExperimentSink>(
        &self,
        first_index: usize,
        mut sink: S,
        monitor: &Monitor,
    ) -> Result<Dispatch> {
        monitor.start("Creating configuration files", self.n());
        for (i, experiment) in self.experiments.iter().enumerate() {
            if monitor.is_cancelled() {
                info!("DoE dispatch cancelled after {i} configurations");
                return Ok(Dispatch::Cancelled(i));
            }
            let settings: Vec<Setting> = self
                .factors
                .iter()
                .zip(experiment.values())
                .map(|(f, values)| Setting {
                    label: f.label(),
                    kind: f.kind(),
                    values,
                })
                .collect();
            sink.write_experiment(first_index + i, &settings)?;
            monitor.advance(i + 1);
        }
        monitor.finish();
        info!("{} configurations created", self.n());
        Ok(Dispatch::Completed(self.n()))
    }
}
