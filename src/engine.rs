//! The DoE generation engine.
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use crate::assembler::{assemble, Columns};
use crate::config::{DoeConfig, SamplingKind};
use crate::design::{Design, Dispatch, ExperimentSink};
use crate::errors::{DoeError, Result};
use crate::factor::{resolve_factors, Factor, FactorSpec};
use crate::sensitivity::SensitivitySpace;
use crate::writer::{design_file_name, save_design};
use log::{error, info, warn};
use ndarray::{Array2, Axis};
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use simdoe_sampling::{
    LogProgress, Monitor, MorrisOat, Nolh, NolhCatalogue, Random, RngRef, SamplingError, SamplingMethod,
    TableSource,
};

/// Generates designs of experiments from factors.
///
/// The engine owns the NOLH catalogue (and thus the loaded external table), the random
/// generator shared by all stages and the monitor used to report progress and to cancel.
#[derive(Debug)]
pub struct DoeEngine {
    config: DoeConfig,
    catalogue: NolhCatalogue,
    rng: RngRef<Xoshiro256Plus>,
    monitor: Monitor,
}

impl DoeEngine {
    /// Engine for the given configuration
    pub fn new(config: DoeConfig) -> Result<Self> {
        crate::init_logger();
        config.check()?;
        let rng = Arc::new(RwLock::new(Xoshiro256Plus::seed_from_u64(config.get_seed())));
        Ok(DoeEngine {
            config,
            catalogue: NolhCatalogue::new(),
            rng,
            monitor: Monitor::new().with_progress(Arc::new(LogProgress)),
        })
    }

    /// Sets the cancellation flag and progress reporter, progress being logged by default
    pub fn with_monitor(mut self, monitor: Monitor) -> Self {
        self.monitor = monitor;
        self
    }

    /// Current configuration
    pub fn config(&self) -> &DoeConfig {
        &self.config
    }

    /// Replaces the configuration
    pub fn set_config(&mut self, config: DoeConfig) -> Result<()> {
        config.check()?;
        self.config = config;
        Ok(())
    }

    /// NOLH tables
    pub fn catalogue(&self) -> &NolhCatalogue {
        &self.catalogue
    }

    /// NOLH tables, to load or clear the external table
    pub fn catalogue_mut(&mut self) -> &mut NolhCatalogue {
        &mut self.catalogue
    }

    /// Monitor shared by all stages.
    ///
    /// A cancellation stops the running generation only: the flag is cleared when the
    /// next one starts.
    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    fn lock_rng(&self) -> Result<RwLockWriteGuard<'_, Xoshiro256Plus>> {
        self.rng.write().map_err(|_| {
            DoeError::Sampling(SamplingError::InvalidValue(
                "random generator is poisoned".to_string(),
            ))
        })
    }

    fn reseed(&self) -> Result<()> {
        *self.lock_rng()? = Xoshiro256Plus::seed_from_u64(self.config.get_seed());
        Ok(())
    }

    /// Builds the design of the given factors without saving it.
    ///
    /// Returns an invalid design when the factors and the settings do not allow to build
    /// one, an incomplete design when cancelled.
    pub fn build(&mut self, specs: &[FactorSpec]) -> Result<Design> {
        self.monitor.reset();
        self.reseed()?;
        let factors = resolve_factors(specs);
        if factors.is_empty() {
            warn!("Invalid design of experiment: no factor to test");
            return Ok(Design::invalid());
        }

        let sampled = match self.config.sampling().clone() {
            SamplingKind::Nolh {
                extended,
                factors: k_table,
                table_file,
            } => {
                let table = match table_file {
                    Some(file) => {
                        self.catalogue.load_external(&file, true)?;
                        self.select_or_load(factors.len(), factors.len())
                    }
                    None if k_table != 0 && factors.len() > k_table => {
                        warn!(
                            "Invalid design of experiment: number of NOLH factors selected ({k_table}) is too small"
                        );
                        return Ok(Design::invalid());
                    }
                    None => self.select_or_load(
                        if k_table == 0 { factors.len() } else { k_table },
                        factors.len(),
                    ),
                };
                match table {
                    Some(idx) => self.sample_nolh(&factors, idx, extended),
                    None => return Ok(Design::invalid()),
                }
            }
            SamplingKind::Random { samples } => {
                if samples < 1 {
                    warn!("Invalid design of experiment: at least one sample required");
                    return Ok(Design::invalid());
                }
                let nx = Columns::PerInstance.count(&factors);
                Random::new_with_shared_rng(&unit_limits(nx), self.rng.clone())
                    .with_monitor(self.monitor.clone())
                    .normalized_sample(samples)
                    .map(|s| (s, Columns::PerInstance))
            }
            SamplingKind::Morris {
                pool,
                trajectories,
                levels,
                jump,
            } => {
                if trajectories < 1 || trajectories > pool {
                    warn!(
                        "Invalid design of experiment: cannot select {trajectories} trajectories out of {pool}"
                    );
                    return Ok(Design::invalid());
                }
                MorrisOat::new_with_shared_rng(&unit_limits(factors.len()), self.rng.clone())
                    .levels(levels)
                    .jump(jump)
                    .pool_size(pool)
                    .with_monitor(self.monitor.clone())
                    .normalized_trajectories(trajectories)
                    .map(|s| (s, Columns::PerFactor))
            }
        };

        let experiments = match sampled {
            Ok((samples, columns)) => assemble(&factors, &samples, columns, &self.monitor),
            Err(err) => Err(err.into()),
        };
        match experiments {
            Ok(experiments) => Ok(Design::new(factors, experiments)),
            Err(DoeError::Sampling(SamplingError::Cancelled)) => {
                info!("DoE generation cancelled");
                Ok(Design::incomplete(factors))
            }
            Err(err) => Err(err),
        }
    }

    /// Builds the design of the given factors and saves it as
    /// `<base>_<first>_<last>.csv` in the destination folder.
    pub fn generate(&mut self, specs: &[FactorSpec]) -> Result<Design> {
        let design = self.build(specs)?;
        if !design.is_valid() {
            return Ok(design);
        }
        let name = design_file_name(
            self.config.get_base_name(),
            self.config.get_first_index(),
            design.n(),
        );
        let path = save_design(&design, &self.config.dest_file(&name))?;
        Ok(design.with_file(path))
    }

    /// Hands the experiments of the design to `sink`, numbered from the first index
    pub fn dispatch<S: ExperimentSink>(&self, design: &Design, sink: S) -> Result<Dispatch> {
        design.dispatch(self.config.get_first_index(), sink, &self.monitor)
    }

    /// Hands the points of a sequential sensitivity space to `sink`, each one kept with
    /// probability `prob`, using the engine random generator reset to the seed
    pub fn enumerate<S: ExperimentSink>(
        &self,
        space: &SensitivitySpace,
        prob: f64,
        sink: S,
    ) -> Result<Dispatch> {
        self.monitor.reset();
        self.reseed()?;
        let mut rng = self.lock_rng()?;
        space.enumerate(
            self.config.get_first_index(),
            prob,
            &mut *rng,
            sink,
            &self.monitor,
        )
    }

    /// Index of the NOLH table to use for `k_table` factors, trying to load the default
    /// external table for `k` factors when no table is large enough
    fn select_or_load(&mut self, k_table: usize, k: usize) -> Option<usize> {
        if let Some(idx) = self.catalogue.select_table(k_table) {
            return Some(idx);
        }
        let path = self.config.nolh_path();
        match self.catalogue.load_external(&path, false) {
            Ok(_) => {
                let idx = self.catalogue.select_table(k);
                if idx.is_none() {
                    warn!(
                        "Invalid design of experiment: too many factors ({k}) for {} size",
                        path.display()
                    );
                }
                idx
            }
            Err(err) => {
                error!("{err} ({})", err.hint());
                warn!("Invalid design of experiment: too many factors to test ({k})");
                None
            }
        }
    }

    fn sample_nolh(
        &self,
        factors: &[Factor],
        idx: usize,
        extended: bool,
    ) -> std::result::Result<(Array2<f64>, Columns), SamplingError> {
        let table = self.catalogue.table(idx).ok_or_else(|| {
            SamplingError::InvalidValue(format!("no NOLH table at index {idx}"))
        })?;
        let n = table.n_samples(extended);
        let origin = match table.source() {
            TableSource::BuiltIn => "built-in",
            TableSource::External(_) => "from file",
        };
        info!("NOLH table used: {idx} ({origin}), n = {n}");
        Nolh::new(&unit_limits(factors.len()), table)
            .with_monitor(self.monitor.clone())
            .normalized_sample(n)
            .map(|s| (s, Columns::PerFactor))
    }
}

/// `[0, 1]^nx` sampling space
fn unit_limits(nx: usize) -> Array2<f64> {
    let mut xlimits = Array2::zeros((nx, 2));
    xlimits.index_axis_mut(Axis(1), 1).fill(1.);
    xlimits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::DesignStatus;
    use approx::assert_abs_diff_eq;
    use simdoe_sampling::Progress;
    use std::fs;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::tempdir;

    fn specs(k: usize) -> Vec<FactorSpec> {
        (0..k)
            .map(|i| FactorSpec::parameter(format!("x{i}"), &[0., 1.]))
            .collect()
    }

    #[test]
    fn test_unit_limits() {
        assert_abs_diff_eq!(unit_limits(2), ndarray::array![[0., 1.], [0., 1.]]);
    }

    #[test]
    fn test_nolh_design() {
        let mut engine = DoeEngine::new(DoeConfig::default().nolh(false)).unwrap();
        let design = engine.build(&specs(5)).unwrap();
        assert!(design.is_valid());
        let table = engine.catalogue().find(5).unwrap();
        assert_eq!(design.n(), table.n1());
        assert_eq!(design.k(), 5);

        let mut engine = DoeEngine::new(DoeConfig::default().nolh(true)).unwrap();
        let design = engine.build(&specs(5)).unwrap();
        assert_eq!(design.n(), table.n2());
    }

    #[test]
    fn test_nolh_too_few_factors_selected() {
        let config = DoeConfig::default().kind(SamplingKind::Nolh {
            extended: false,
            factors: 2,
            table_file: None,
        });
        let mut engine = DoeEngine::new(config).unwrap();
        let design = engine.build(&specs(3)).unwrap();
        assert_eq!(design.status(), DesignStatus::Invalid);
    }

    #[test]
    fn test_nolh_factors_override() {
        let config = DoeConfig::default().kind(SamplingKind::Nolh {
            extended: false,
            factors: 7,
            table_file: None,
        });
        let mut engine = DoeEngine::new(config).unwrap();
        let design = engine.build(&specs(3)).unwrap();
        assert_eq!(design.n(), engine.catalogue().find(7).unwrap().n1());
    }

    #[test]
    fn test_nolh_too_many_factors() {
        let dir = tempdir().unwrap();
        let mut engine = DoeEngine::new(DoeConfig::default().dest_path(dir.path())).unwrap();
        let design = engine.build(&specs(20)).unwrap();
        assert_eq!(design.status(), DesignStatus::Invalid);
    }

    #[test]
    fn test_nolh_default_external_table() {
        let dir = tempdir().unwrap();
        let k = 16;
        let rows: Vec<String> = (1..=3)
            .map(|i| vec![i.to_string(); k].join(","))
            .collect();
        fs::write(dir.path().join("NOLH.csv"), rows.join("\n")).unwrap();
        let mut engine = DoeEngine::new(DoeConfig::default().dest_path(dir.path())).unwrap();
        let design = engine.build(&specs(k)).unwrap();
        assert!(design.is_valid());
        assert_eq!(design.n(), 3);
        assert_abs_diff_eq!(design.value(2, 15, 0), 1.);
        assert_eq!(engine.catalogue().select_table(k), Some(0));
    }

    #[test]
    fn test_random_reproducible() {
        let config = DoeConfig::default().random(4).seed(42);
        let s = vec![FactorSpec::parameter("a", &[0., 1., 10., 20.]).instances(3)];
        let mut engine = DoeEngine::new(config.clone()).unwrap();
        let d1 = engine.build(&s).unwrap();
        let d2 = engine.build(&s).unwrap();
        assert_eq!(d1, d2);
        assert_eq!(d1.n(), 4);
        assert!(d1
            .experiments()
            .iter()
            .all(|e| (10. ..=20.).contains(&e.factor(0)[2])));
        let mut other = DoeEngine::new(config.seed(7)).unwrap();
        assert_ne!(d1, other.build(&s).unwrap());
    }

    #[test]
    fn test_random_without_samples() {
        let mut engine = DoeEngine::new(DoeConfig::default().random(0)).unwrap();
        assert!(!engine.build(&specs(2)).unwrap().is_valid());
    }

    #[test]
    fn test_morris_design() {
        let mut engine = DoeEngine::new(DoeConfig::default().morris(6, 2)).unwrap();
        let design = engine.build(&specs(3)).unwrap();
        assert!(design.is_valid());
        assert_eq!(design.n(), 2 * 4);

        let mut engine = DoeEngine::new(DoeConfig::default().morris(2, 3)).unwrap();
        assert!(!engine.build(&specs(3)).unwrap().is_valid());
    }

    #[test]
    fn test_no_factor() {
        let mut engine = DoeEngine::new(DoeConfig::default()).unwrap();
        let design = engine
            .build(&[FactorSpec::parameter("a", &[1.])])
            .unwrap();
        assert_eq!(design, Design::invalid());
    }

    /// Cancels once, after `at` rows
    struct CancelAt {
        flag: Arc<AtomicBool>,
        at: usize,
        fired: AtomicBool,
    }

    impl Progress for CancelAt {
        fn advance(&self, done: usize) {
            if done == self.at && !self.fired.swap(true, Ordering::SeqCst) {
                self.flag.store(true, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn test_cancelled_during_generation() {
        let flag = Arc::new(AtomicBool::new(false));
        let canceller = CancelAt {
            flag: Arc::clone(&flag),
            at: 3,
            fired: AtomicBool::new(false),
        };
        let monitor = Monitor::new()
            .with_cancel_flag(Arc::clone(&flag))
            .with_progress(Arc::new(canceller));
        let mut engine = DoeEngine::new(DoeConfig::default().random(10))
            .unwrap()
            .with_monitor(monitor);

        let design = engine.build(&specs(2)).unwrap();
        assert_eq!(design.status(), DesignStatus::Incomplete);
        assert_eq!(design.n(), 0);
        assert_eq!(design.k(), 2);
        assert!(flag.load(Ordering::SeqCst));

        let design = engine.build(&specs(2)).unwrap();
        assert_eq!(design.status(), DesignStatus::Complete);
        assert_eq!(design.n(), 10);
    }

    #[test]
    fn test_cancel_before_build_is_cleared() {
        let mut engine = DoeEngine::new(DoeConfig::default().random(4)).unwrap();
        engine.monitor().cancel();
        for _ in 0..2 {
            let design = engine.build(&specs(2)).unwrap();
            assert_eq!(design.status(), DesignStatus::Complete);
        }
        assert!(!engine.monitor().is_cancelled());
    }

    #[test]
    fn test_progress_logged_by_default() {
        let engine = DoeEngine::new(DoeConfig::default()).unwrap();
        assert!(format!("{:?}", engine.monitor()).contains("progress: true"));
    }

    #[test]
    fn test_generate_saves_file() {
        let dir = tempdir().unwrap();
        let config = DoeConfig::default()
            .random(3)
            .dest_path(dir.path())
            .base_name("model")
            .first_index(4);
        let mut engine = DoeEngine::new(config).unwrap();
        let design = engine.generate(&specs(2)).unwrap();
        let file = design.file().unwrap();
        assert_eq!(file, dir.path().join("model_4_6.csv"));
        let content = fs::read_to_string(file).unwrap();
        assert!(content.starts_with("x0,x1\n"));
        assert_eq!(content.lines().count(), 4);
    }
}
