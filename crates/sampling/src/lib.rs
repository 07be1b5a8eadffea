/*!
This library implements the sampling methods used to build Design of Experiments (DoE)
for the sensitivity analysis of simulation models:

* [Near Orthogonal Latin Hypercube](crate::nolh::Nolh) sampling from integer level tables,
  either built-in or loaded from a delimited text file (see [NolhCatalogue]),
* [Random](crate::random::Random) uniform sampling,
* [Elementary Effects](crate::morris::MorrisOat) sampling (Morris One-At-a-Time) where a pool
  of trajectories is generated and the subset of trajectories with the largest spread
  is selected (see [optimizer]),
* [Full factorial](crate::full_factorial::FullFactorial) enumeration of explicit factor levels.

A DoE method is a way to generate a set of points (i.e. a DoE) within a design (or sample) space `xlimits`.
The design space is defined as a 2D ndarray `(nx, 2)`, specifying lower bound and upper bound
of each `nx` components of the samples `x`.

Example:
```
use simdoe_sampling::{MorrisOat, Nolh, NolhCatalogue, Random, SamplingMethod};
use ndarray::arr2;
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

// Design space is defined as [5., 10.] x [0., 1.], samples are 2-dimensional.
let xlimits = arr2(&[[5., 10.], [0., 1.]]);
// NOLH sampling using the smallest built-in table able to handle 2 factors
let catalogue = NolhCatalogue::new();
let table = catalogue.find(2).unwrap();
let samples = Nolh::new(&xlimits, table).sample(table.n1()).unwrap();
// or else randomly with random generator for reproducibility
let samples = Random::new(&xlimits).with_rng(Xoshiro256Plus::seed_from_u64(42)).sample(5).unwrap();
// or else 3 Morris trajectories selected among a pool of 10
let samples = MorrisOat::new(&xlimits)
    .levels(4)
    .jump(2)
    .pool_size(10)
    .with_rng(Xoshiro256Plus::seed_from_u64(42))
    .trajectories(3)
    .unwrap();
assert_eq!(samples.nrows(), 3 * (2 + 1));
```

Every sampler may share its random generator with the others (see [RngRef]) and honours
the cancellation flag of its [Monitor].
*/
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod errors;
mod full_factorial;
pub mod matrix;
mod morris;
mod nolh;
pub mod optimizer;
mod progress;
mod random;
mod traits;

pub use errors::*;
pub use full_factorial::*;
pub use morris::*;
pub use nolh::*;
pub use progress::*;
pub use random::*;
pub use traits::*;

use std::sync::{Arc, RwLock, RwLockWriteGuard};

/// A random generator shared between the samplers of a same generation
pub type RngRef<R> = Arc<RwLock<R>>;

pub(crate) fn lock_rng<R>(rng: &RngRef<R>) -> Result<RwLockWriteGuard<'_, R>> {
    rng.write()
        .map_err(|_| SamplingError::InvalidValue("random generator is poisoned".to_string()))
}
