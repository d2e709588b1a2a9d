//! Output file naming

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use crate::error::{Error, Result};

/// Segment inserted before the extension of the input file name
pub const OUTPUT_SUFFIX: &str = "out";

/// Sibling output path for an input file
///
/// - `scans/booklet.pdf` → `scans/booklet.out.pdf`
/// - `booklet` → `booklet.out`
/// - `a.b.pdf` → `a.b.out.pdf` (only the last extension is split off)
pub fn output_path_for(input: &Path) -> Result<PathBuf> {
    let stem = input.file_stem().ok_or_else(|| {
        Error::InvalidArgument(format!("input path has no file name: {}", input.display()))
    })?;

    let mut name = OsString::from(stem);
    name.push(".");
    name.push(OUTPUT_SUFFIX);
    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }

    Ok(input.with_file_name(name))
}
