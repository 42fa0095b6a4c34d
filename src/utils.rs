//! Small filesystem and path helpers shared across the driver.

use std::{
    fs,
    io::BufWriter,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{DriverError, IoResultExt, Result};

/// Reads and deserializes a JSON file, attaching the path to any error.
pub fn read_json_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let content = fs::read(path).path_ctx(path)?;
    serde_json::from_slice(&content).map_err(|err| {
        DriverError::msg(format!("failed to parse JSON file `{}`: {err}", path.display()))
    })
}

/// Ensures the parent directory of `path` exists.
pub fn create_parent_dir_all(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).path_ctx(parent)?;
    }
    Ok(())
}

/// Writes `value` as pretty JSON (4-space indent, stable key order from `BTreeMap`/`serde_json`
/// object insertion order as produced by the caller) to `path`, creating parent directories first.
pub fn write_json_file(value: &impl Serialize, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    create_parent_dir_all(path)?;
    let file = fs::File::create(path).path_ctx(path)?;
    let mut writer = BufWriter::new(file);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut writer, formatter);
    value.serialize(&mut ser).map_err(DriverError::Serde)?;
    Ok(())
}

/// Returns the basename of `path` without its extension, e.g. `src/A.sol` -> `A`.
pub fn file_stem(path: &Path) -> Option<String> {
    path.file_stem().and_then(|s| s.to_str()).map(str::to_owned)
}

/// Canonicalizes `path`, attaching the path to any error.
pub fn canonicalize(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    dunce_canonicalize(path).path_ctx(path)
}

#[cfg(not(windows))]
fn dunce_canonicalize(path: &Path) -> std::io::Result<PathBuf> {
    fs::canonicalize(path)
}

#[cfg(windows)]
fn dunce_canonicalize(path: &Path) -> std::io::Result<PathBuf> {
    // Avoid Windows' `\\?\` UNC prefix in canonicalized paths, same rationale as the `dunce` crate.
    let canon = fs::canonicalize(path)?;
    Ok(PathBuf::from(canon.to_string_lossy().trim_start_matches(r"\\?\")))
}
