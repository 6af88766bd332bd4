//! Part file naming: `<base>.part<N>`, N starting at 1, no padding.

use crate::constants::PART_TOKEN;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Path of the `index`-th part of `base`.
pub fn part_path(base: &Path, index: u64) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(format!(".{PART_TOKEN}{index}"));
    PathBuf::from(name)
}

/// Strip the trailing `.partN` segment from a part path.
///
/// Returns `None` when the last dot-separated segment of the file name does
/// not start with `part`, when the file name has no dot at all, or when
/// nothing would be left of the name after stripping.
pub fn derive_base_name(part: &Path) -> Option<PathBuf> {
    let file_name = part.file_name()?.to_str()?;
    let (stem, suffix) = file_name.rsplit_once('.')?;
    if !suffix.starts_with(PART_TOKEN) || stem.is_empty() {
        return None;
    }
    Some(part.with_file_name(stem))
}

/// Numeric index of a `.partN` file name, if it has one.
pub fn part_index(part: &Path) -> Option<u64> {
    let file_name = part.file_name()?.to_str()?;
    let (_, suffix) = file_name.rsplit_once('.')?;
    let digits = suffix.strip_prefix(PART_TOKEN)?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
