//! This library generates Designs of Experiments (DoE) for the sensitivity analysis
//! of simulation models.
//!
//! Given factors (model parameters or lagged variables, possibly replicated over several
//! instances of their owning entity) each with a range of values per instance, the engine
//! produces a table of experiments, each experiment being one set of factor values to
//! simulate. Three sampling methods are available:
//! * Near Orthogonal Latin Hypercube (NOLH) from built-in or external level tables,
//! * uniform random sampling,
//! * Elementary Effects (Morris One-At-a-Time) trajectories selected for their spread.
//!
//! Designs are saved as CSV files and may be dispatched experiment by experiment to
//! an [ExperimentSink] writing the actual model configurations. A full factorial
//! [SensitivitySpace] of explicit factor values is also available.
//!
//! The sampling methods themselves live in the [simdoe_sampling] crate.
//!
//! # Example
//!
//! ```no_run
//! use simdoe::{DoeConfig, DoeEngine, FactorSpec};
//!
//! let factors = vec![
//!     FactorSpec::parameter("alpha", &[0., 1.]),
//!     FactorSpec::parameter("beta", &[10., 20., 30., 40.]).instances(2),
//!     FactorSpec::variable("stock", 1, &[0., 100.]).integer(true),
//! ];
//! let mut engine = DoeEngine::new(DoeConfig::default().nolh(true).seed(42))
//!     .expect("valid configuration");
//! let design = engine.generate(&factors).expect("design saved");
//! assert!(design.is_valid());
//! println!("{} experiments saved in {:?}", design.n(), design.file());
//! ```
//!
//! # Logging
//!
//! Progress of the generation is logged with the [log] facade. [init_logger] (called
//! by [DoeEngine::new]) sets up `env_logger` with the level given by the
//! `SIMDOE_LOG` environment variable, `info` by default.
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod assembler;
mod config;
mod design;
mod engine;
mod errors;
mod factor;
mod sensitivity;
mod writer;

pub use assembler::*;
pub use config::*;
pub use design::*;
pub use engine::*;
pub use errors::*;
pub use factor::*;
pub use sensitivity::*;
pub use writer::*;

pub use simdoe_sampling;

use env_logger::{Builder, Env};

/// Environment variable setting the log level
pub const SIMDOE_LOG: &str = "SIMDOE_LOG";

/// Initializes logging to stdout, the level being taken from `SIMDOE_LOG` (`info` by default).
///
/// Does nothing if a logger is already set.
pub fn init_logger() {
    let env = Env::new().filter_or(SIMDOE_LOG, "info");
    let mut builder = Builder::from_env(env);
    let builder = builder.target(env_logger::Target::Stdout);
    builder.try_init().ok();
}
