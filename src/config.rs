//! DoE generation configuration.
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{DoeError, Result};
use serde::{Deserialize, Serialize};
use simdoe_sampling::NOLH_DEF_FILE;

/// Default base name of the design files
pub const DOE_DEF_BASE_NAME: &str = "doe";

/// Sampling method used to build the design
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamplingKind {
    /// Near Orthogonal Latin Hypercube
    Nolh {
        /// Use the extended sample size (n2) of the table instead of the basic one (n1)
        extended: bool,
        /// Number of factors used to select the table, 0 to use the number of factors
        factors: usize,
        /// External table to use whatever the number of factors
        table_file: Option<PathBuf>,
    },
    /// Uniform random sampling
    Random {
        /// Number of experiments
        samples: usize,
    },
    /// Elementary effects (Morris One-At-a-Time) trajectories
    Morris {
        /// Number of trajectories generated
        pool: usize,
        /// Number of trajectories kept
        trajectories: usize,
        /// Number of levels of the grid
        levels: usize,
        /// Step in grid levels
        jump: usize,
    },
}

impl Default for SamplingKind {
    fn default() -> Self {
        SamplingKind::Nolh {
            extended: false,
            factors: 0,
            table_file: None,
        }
    }
}

/// DoE generation configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoeConfig {
    /// Sampling method
    pub(crate) kind: SamplingKind,
    /// Seed of the random generator, reset at the start of each generation
    pub(crate) seed: u64,
    /// Folder of the design file, current folder if not set
    pub(crate) dest_path: Option<PathBuf>,
    /// Base name of the design file
    pub(crate) base_name: String,
    /// Index of the first experiment, used to name the design file
    pub(crate) first_index: usize,
    /// External NOLH table looked up when no built-in table fits
    pub(crate) nolh_file: String,
}

impl Default for DoeConfig {
    fn default() -> Self {
        DoeConfig {
            kind: SamplingKind::default(),
            seed: 1,
            dest_path: None,
            base_name: DOE_DEF_BASE_NAME.to_string(),
            first_index: 1,
            nolh_file: NOLH_DEF_FILE.to_string(),
        }
    }
}

impl DoeConfig {
    /// Sets the sampling method
    pub fn kind(mut self, kind: SamplingKind) -> Self {
        self.kind = kind;
        self
    }

    /// NOLH sampling with the basic or extended sample size
    pub fn nolh(self, extended: bool) -> Self {
        self.kind(SamplingKind::Nolh {
            extended,
            factors: 0,
            table_file: None,
        })
    }

    /// Random sampling of the given number of experiments
    pub fn random(self, samples: usize) -> Self {
        self.kind(SamplingKind::Random { samples })
    }

    /// Morris sampling of `trajectories` out of `pool` with 4 levels and a jump of 2
    pub fn morris(self, pool: usize, trajectories: usize) -> Self {
        self.kind(SamplingKind::Morris {
            pool,
            trajectories,
            levels: simdoe_sampling::MORRIS_DEF_LEVELS,
            jump: simdoe_sampling::MORRIS_DEF_JUMP,
        })
    }

    /// Allow to specify a seed for random number generator to allow
    /// reproducible designs.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the folder of the design file
    pub fn dest_path(mut self, dest_path: impl Into<PathBuf>) -> Self {
        self.dest_path = Some(dest_path.into());
        self
    }

    /// Sets the base name of the design file
    pub fn base_name(mut self, base_name: impl Into<String>) -> Self {
        self.base_name = base_name.into();
        self
    }

    /// Sets the index of the first experiment
    pub fn first_index(mut self, first_index: usize) -> Self {
        self.first_index = first_index;
        self
    }

    /// Sets the name of the external NOLH table looked up as fallback
    pub fn nolh_file(mut self, nolh_file: impl Into<String>) -> Self {
        self.nolh_file = nolh_file.into();
        self
    }

    /// Sampling method
    pub fn sampling(&self) -> &SamplingKind {
        &self.kind
    }

    /// Seed of the random generator
    pub fn get_seed(&self) -> u64 {
        self.seed
    }

    /// Index of the first experiment
    pub fn get_first_index(&self) -> usize {
        self.first_index
    }

    /// Base name of the design file, the default one if empty
    pub fn get_base_name(&self) -> &str {
        if self.base_name.is_empty() {
            DOE_DEF_BASE_NAME
        } else {
            &self.base_name
        }
    }

    /// Path of a file named `name` in the destination folder
    pub fn dest_file(&self, name: &str) -> PathBuf {
        match &self.dest_path {
            Some(dir) if !dir.as_os_str().is_empty() => dir.join(name),
            _ => PathBuf::from(name),
        }
    }

    /// Path of the fallback external NOLH table
    pub fn nolh_path(&self) -> PathBuf {
        self.dest_file(&self.nolh_file)
    }

    /// Rejects settings no design can be built with
    pub fn check(&self) -> Result<()> {
        if let SamplingKind::Morris { levels, jump, .. } = self.kind {
            if levels < 2 {
                return Err(DoeError::Config(format!(
                    "Morris levels should be at least 2, got {levels}"
                )));
            }
            if jump == 0 || jump >= levels {
                return Err(DoeError::Config(format!(
                    "Morris jump should be in [1, {}], got {jump}",
                    levels - 1
                )));
            }
        }
        if self.nolh_file.is_empty() {
            return Err(DoeError::Config("NOLH file name is empty".to_string()));
        }
        Ok(())
    }

    /// Reads a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: DoeConfig = serde_json::from_str(&content)?;
        config.check()?;
        Ok(config)
    }

    /// Writes the configuration to a JSON file
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = DoeConfig::default();
        assert_eq!(config.get_base_name(), "doe");
        assert_eq!(config.get_first_index(), 1);
        assert_eq!(config.nolh_path(), PathBuf::from("NOLH.csv"));
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_dest_file() {
        let config = DoeConfig::default().dest_path("out").base_name("");
        assert_eq!(config.dest_file("x.csv"), Path::new("out").join("x.csv"));
        assert_eq!(config.get_base_name(), "doe");
    }

    #[test]
    fn test_check_morris() {
        let config = DoeConfig::default().kind(SamplingKind::Morris {
            pool: 10,
            trajectories: 3,
            levels: 4,
            jump: 4,
        });
        assert!(matches!(config.check(), Err(DoeError::Config(_))));
        let config = DoeConfig::default().morris(10, 3);
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_json_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doe.json");
        let config = DoeConfig::default()
            .morris(20, 4)
            .seed(42)
            .dest_path(dir.path())
            .first_index(11);
        config.to_json_file(&path).unwrap();
        let loaded = DoeConfig::from_json_file(&path).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_json_partial() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doe.json");
        fs::write(&path, r#"{"kind": {"Random": {"samples": 5}}, "seed": 3}"#).unwrap();
        let loaded = DoeConfig::from_json_file(&path).unwrap();
        assert_eq!(loaded.sampling(), &SamplingKind::Random { samples: 5 });
        assert_eq!(loaded.get_seed(), 3);
        assert_eq!(loaded.get_base_name(), "doe");
    }
}
