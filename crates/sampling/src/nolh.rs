//! Near Orthogonal Latin Hypercube (NOLH) designs.
//!
//! A NOLH design is given by an integer table where each row is a sample, each column
//! a factor and each value a level (1-indexed). The [NolhCatalogue] holds a fixed ordered
//! list of built-in tables and one slot for an external table loaded from a text file.
//!
//! The built-in tables are the orthogonal Latin hypercubes of Ye (1998) for
//! `m = 3..=8`, handling up to 14 factors with 257 runs (513 extended). They use more
//! runs per factor than the Cioppa and Lucas tables, which are not shipped here.
//! Designs of more than 14 factors need an external table.
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{Result, SamplingError};
use crate::progress::Monitor;
use crate::SamplingMethod;
use linfa::Float;
use log::info;
use ndarray::{Array2, ArrayBase, Data, Ix2};
use ndarray_stats::QuantileExt;

#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Default file name of the external NOLH table
pub const NOLH_DEF_FILE: &str = "NOLH.csv";

/// Built-in tables are generated for m in this range, see [ye_olh]
const BUILTIN_ORDERS: std::ops::RangeInclusive<u32> = 3..=8;

/// Origin of a NOLH table
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum TableSource {
    /// Table shipped with the library
    BuiltIn,
    /// Table loaded from the given file
    External(PathBuf),
}

/// A NOLH table and the range of factor counts it supports
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct NolhTable {
    k_min: usize,
    k_max: usize,
    n1: usize,
    n2: usize,
    lo_level: u32,
    hi_level: u32,
    /// (n2, k_max) levels, the n1 first rows being the basic design
    table: Array2<u32>,
    source: TableSource,
}

impl NolhTable {
    /// Minimum number of factors handled by the table
    pub fn k_min(&self) -> usize {
        self.k_min
    }

    /// Maximum number of factors handled by the table
    pub fn k_max(&self) -> usize {
        self.k_max
    }

    /// Whether the table handles `k` factors
    pub fn covers(&self, k: usize) -> bool {
        k >= self.k_min && k <= self.k_max
    }

    /// Basic sample size
    pub fn n1(&self) -> usize {
        self.n1
    }

    /// Extended sample size
    pub fn n2(&self) -> usize {
        self.n2
    }

    /// Sample size for the basic (`extended = false`) or extended design
    pub fn n_samples(&self, extended: bool) -> usize {
        if extended {
            self.n2
        } else {
            self.n1
        }
    }

    /// Lowest level found in the table
    pub fn lo_level(&self) -> u32 {
        self.lo_level
    }

    /// Highest level found in the table
    pub fn hi_level(&self) -> u32 {
        self.hi_level
    }

    /// The (n2, k_max) integer levels
    pub fn levels(&self) -> &Array2<u32> {
        &self.table
    }

    /// Where the table comes from
    pub fn source(&self) -> &TableSource {
        &self.source
    }

    /// Level of the given sample and factor scaled to the unit interval
    pub fn normalized_level<F: Float>(&self, sample: usize, factor: usize) -> F {
        let range = self.hi_level - self.lo_level;
        if range == 0 {
            // single level table
            return F::zero();
        }
        F::cast(self.table[[sample, factor]] - 1) / F::cast(range)
    }

    fn builtin(m: u32, k_min: usize) -> NolhTable {
        let basic = ye_olh(m);
        let (n1, k_max) = basic.dim();
        let table = stack_rotated(&basic);
        NolhTable {
            k_min,
            k_max,
            n1,
            n2: table.nrows(),
            lo_level: 1,
            hi_level: n1 as u32,
            table,
            source: TableSource::BuiltIn,
        }
    }
}

impl fmt::Display for NolhTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\u{00D7}{}\u{00D7}{}", self.k_max, self.n1, self.n2)
    }
}

/// Ye (1998) orthogonal Latin hypercube with `2^m + 1` runs and `2m - 2` columns
///
/// Levels are `1..=2^m + 1`, the centre point being the middle row.
/// See Cioppa, T. M. and Lucas, T. W. (2007), "Efficient nearly orthogonal and
/// space-filling Latin hypercubes", Technometrics 49(1):45-55.
pub fn ye_olh(m: u32) -> Array2<u32> {
    assert!(m >= 2, "Ye construction requires m >= 2");
    let half = 1usize << (m - 1);
    let q = m - 1;
    let ncols = 2 * m as usize - 2;

    // A_k permutes e by flipping its k lowest binary digits
    let perm = |k: u32, i: usize| i ^ ((1usize << k) - 1);
    let e = |i: usize| (i + 1) as i64;
    // a_k sign vector: -1/+1 on binary digit (k - 1)
    let sign = |k: u32, i: usize| if (i >> (k - 1)) & 1 == 0 { -1i64 } else { 1 };

    let mut t = Array2::<i64>::zeros((half, ncols));
    for i in 0..half {
        t[[i, 0]] = e(i);
        for k in 1..m {
            t[[i, k as usize]] = e(perm(k, i)) * sign(k, i);
        }
        for j in 1..q {
            t[[i, (m + j - 1) as usize]] = e(perm(j, perm(q, i))) * sign(1, i) * sign(j + 1, i);
        }
    }

    let n = 2 * half + 1;
    let centre = half as i64 + 1;
    let mut olh = Array2::<u32>::zeros((n, ncols));
    for j in 0..ncols {
        for i in 0..half {
            olh[[i, j]] = (t[[i, j]] + centre) as u32;
            olh[[half + 1 + i, j]] = (centre - t[[i, j]]) as u32;
        }
        olh[[half, j]] = centre as u32;
    }
    olh
}

/// Extends a centred design with a copy of itself whose columns are rotated by one,
/// the duplicated centre point being dropped: `n` rows give `2n - 1` rows.
fn stack_rotated(basic: &Array2<u32>) -> Array2<u32> {
    let (n, k) = basic.dim();
    let centre = n / 2;
    let mut stacked = Array2::zeros((2 * n - 1, k));
    stacked.slice_mut(ndarray::s![..n, ..]).assign(basic);
    let mut row = n;
    for i in (0..n).filter(|&i| i != centre) {
        for j in 0..k {
            stacked[[row, j]] = basic[[i, (j + 1) % k]];
        }
        row += 1;
    }
    stacked
}

/// Ordered collection of NOLH tables.
///
/// Index 0 is reserved to an externally loaded table, built-in tables follow by
/// increasing supported factor counts.
#[derive(Clone, Debug)]
pub struct NolhCatalogue {
    external: Option<NolhTable>,
    builtin: Vec<NolhTable>,
}

impl Default for NolhCatalogue {
    fn default() -> Self {
        Self::new()
    }
}

impl NolhCatalogue {
    /// Catalogue of built-in tables with an empty external slot
    pub fn new() -> Self {
        let mut builtin = Vec::new();
        let mut k_min = 1;
        for m in BUILTIN_ORDERS {
            let table = NolhTable::builtin(m, k_min);
            k_min = table.k_max + 1;
            builtin.push(table);
        }
        NolhCatalogue {
            external: None,
            builtin,
        }
    }

    /// Number of table slots (external slot included)
    pub fn len(&self) -> usize {
        self.builtin.len() + 1
    }

    /// Always false: the catalogue has at least the external slot
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Largest number of factors handled by built-in tables
    pub fn builtin_ceiling(&self) -> usize {
        self.builtin.last().map_or(0, |t| t.k_max)
    }

    /// Index of the first table able to handle `k` factors, `None` if there is none
    pub fn select_table(&self, k: usize) -> Option<usize> {
        (0..self.len()).find(|&i| self.table(i).is_some_and(|t| t.covers(k)))
    }

    /// First table able to handle `k` factors
    pub fn find(&self, k: usize) -> Option<&NolhTable> {
        self.select_table(k).and_then(|i| self.table(i))
    }

    /// Table at the given index, slot 0 being the external table if loaded
    pub fn table(&self, index: usize) -> Option<&NolhTable> {
        match index {
            0 => self.external.as_ref(),
            i => self.builtin.get(i - 1),
        }
    }

    /// The externally loaded table if any
    pub fn external(&self) -> Option<&NolhTable> {
        self.external.as_ref()
    }

    /// Built-in tables able to handle `k` factors, smallest first.
    ///
    /// An empty list means that only an external table can be used.
    pub fn valid_tables(&self, k: usize) -> Vec<&NolhTable> {
        match self.builtin.iter().position(|t| t.covers(k)) {
            Some(first) => self.builtin[first..].iter().collect(),
            None => vec![],
        }
    }

    /// Human readable list of the built-in tables able to handle `k` factors
    /// as `kmax×n1×n2` items, or `External only`.
    pub fn describe_valid_tables(&self, k: usize) -> String {
        let tables = self.valid_tables(k);
        if tables.is_empty() {
            "External only".to_string()
        } else {
            tables
                .iter()
                .map(|t| format!("\"{t}\""))
                .collect::<Vec<_>>()
                .join(" ")
        }
    }

    /// Removes the external table
    pub fn clear_external(&mut self) {
        self.external = None;
    }

    /// Loads a table from a delimited text file into the external slot.
    ///
    /// Cells are separated by commas or semicolons, one sample per line. The number of
    /// factors is given by the first line, every other non empty line must have the same
    /// number of cells and every cell must be a positive integer.
    /// When `force` is set the table handles any number of factors up to its column count,
    /// otherwise a table wider than the built-in ones only extends them beyond their
    /// largest factor count. A table no wider than the built-in ones always handles
    /// `[1, columns]` and, sitting in the first slot, takes precedence over them.
    ///
    /// On failure the external slot is left as it was.
    pub fn load_external(&mut self, path: impl AsRef<Path>, force: bool) -> Result<&NolhTable> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SamplingError::NolhIo {
            path: path.to_path_buf(),
            source,
        })?;
        let table = parse_table(&content, path)?;
        let (n, k_file) = table.dim();
        let format_err = |reason: &str| SamplingError::NolhFormat {
            path: path.to_path_buf(),
            line: 1,
            reason: reason.to_string(),
        };
        let lo_level = *table.min().map_err(|_| format_err("empty table"))?;
        let hi_level = *table.max().map_err(|_| format_err("empty table"))?;

        let ceiling = self.builtin_ceiling();
        let k_min = if force || k_file <= ceiling {
            1
        } else {
            ceiling + 1
        };

        info!(
            "NOLH file loaded: {}, k = {k_file}, n = {n}, low level = {lo_level}, high level = {hi_level}",
            path.display()
        );
        Ok(self.external.insert(NolhTable {
            k_min,
            k_max: k_file,
            n1: n,
            n2: n,
            lo_level,
            hi_level,
            table,
            source: TableSource::External(path.to_path_buf()),
        }))
    }
}

fn parse_table(content: &str, path: &Path) -> Result<Array2<u32>> {
    let format_err = |line: usize, reason: String| SamplingError::NolhFormat {
        path: path.to_path_buf(),
        line,
        reason,
    };
    let mut ncols = 0;
    let mut values = Vec::new();
    let mut nrows = 0;
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        let lineno = idx + 1;
        if line.is_empty() {
            if nrows == 0 {
                return Err(format_err(lineno, "missing header line".to_string()));
            }
            continue;
        }
        let cells: Vec<&str> = line.split(|c| c == ',' || c == ';').map(str::trim).collect();
        if nrows == 0 {
            ncols = cells.len();
        } else if cells.len() != ncols {
            return Err(format_err(
                lineno,
                format!("expected {ncols} values, found {}", cells.len()),
            ));
        }
        for cell in cells {
            match cell.parse::<u32>() {
                Ok(0) => return Err(format_err(lineno, "zero level".to_string())),
                Ok(v) => values.push(v),
                Err(_) if cell.is_empty() => {
                    return Err(format_err(lineno, "missing value".to_string()))
                }
                Err(_) => return Err(format_err(lineno, format!("invalid level '{cell}'"))),
            }
        }
        nrows += 1;
    }
    if nrows == 0 {
        return Err(format_err(1, "empty table".to_string()));
    }
    Array2::from_shape_vec((nrows, ncols), values)
        .map_err(|e| format_err(1, e.to_string()))
}

/// The NOLH design maps the levels of a table to the sample space.
///
/// Factor `j` of the sample space uses column `j` of the table.
#[derive(Clone, Debug)]
pub struct Nolh<F: Float> {
    /// Sampling space definition as a (nx, 2) matrix
    /// The ith row is the [lower_bound, upper_bound] of xi, the ith component of x
    xlimits: Array2<F>,
    /// Levels table
    table: NolhTable,
    /// Cancellation and progress
    monitor: Monitor,
}

impl<F: Float> Nolh<F> {
    /// Constructor given a design space given a (nx, 2) matrix \[\[lower bound, upper bound\], ...\]
    /// and the table to use (see [NolhCatalogue::find]).
    ///
    /// **Panics** if xlimits number of columns is different from 2.
    pub fn new(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>, table: &NolhTable) -> Self {
        if xlimits.ncols() != 2 {
            panic!("xlimits must have 2 columns (lower, upper)");
        }
        Nolh {
            xlimits: xlimits.to_owned(),
            table: table.clone(),
            monitor: Monitor::default(),
        }
    }

    /// Sets the cancellation flag and progress reporter
    pub fn with_monitor(mut self, monitor: Monitor) -> Self {
        self.monitor = monitor;
        self
    }

    /// The levels table in use
    pub fn table(&self) -> &NolhTable {
        &self.table
    }
}

impl<F: Float> SamplingMethod<F> for Nolh<F> {
    fn sampling_space(&self) -> &Array2<F> {
        &self.xlimits
    }

    /// Takes the `ns` first rows of the table, `ns` being usually
    /// [NolhTable::n1] or [NolhTable::n2]
    fn normalized_sample(&self, ns: usize) -> Result<Array2<F>> {
        let nx = self.xlimits.nrows();
        if nx > self.table.k_max {
            return Err(SamplingError::InvalidValue(format!(
                "NOLH table {} cannot handle {nx} factors",
                self.table
            )));
        }
        if ns > self.table.table.nrows() {
            return Err(SamplingError::InvalidValue(format!(
                "NOLH table {} has less than {ns} samples",
                self.table
            )));
        }
        let mut doe = Array2::zeros((ns, nx));
        for (i, mut row) in doe.rows_mut().into_iter().enumerate() {
            self.monitor.check()?;
            for (j, v) in row.iter_mut().enumerate() {
                *v = self.table.normalized_level(i, j);
            }
        }
        Ok(doe)
    }
}
