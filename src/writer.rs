//! Serialization of a design table to a CSV file.
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::design::Design;
use crate::errors::{DoeError, Result};
use log::info;

/// Name of the design file of `n` experiments numbered from `first_index`:
/// `<base>_<first>_<last>.csv`
pub fn design_file_name(base_name: &str, first_index: usize, n: usize) -> String {
    let last = (first_index + n).saturating_sub(1);
    format!("{base_name}_{first_index}_{last}.csv")
}

/// Writes the design as CSV: a header of factor labels, suffixed by the instance
/// number from the second instance on, then one line per experiment with six decimals.
pub fn write_design<W: Write>(design: &Design, writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    let header: Vec<String> = design.factors().iter().flat_map(|f| f.headers()).collect();
    wtr.write_record(&header)?;
    for experiment in design.experiments() {
        wtr.write_record(experiment.flatten().map(|v| format!("{v:.6}")))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Saves the design to `path`.
///
/// The file is removed if it cannot be completely written.
pub fn save_design(design: &Design, path: &Path) -> Result<PathBuf> {
    let file = File::create(path).map_err(|source| DoeError::WriteDesign {
        path: path.to_path_buf(),
        source,
    })?;
    if let Err(err) = write_design(design, file) {
        fs::remove_file(path).ok();
        return Err(err);
    }
    info!("DoE configuration saved: {}", path.display());
    Ok(path.to_path_buf())
}
