//! Error taxonomy for the build driver (see spec §7).
//!
//! Every fallible public API returns [`Result<T>`], a thin alias over
//! [`DriverError`]. Helpers that wrap [`std::io::Error`] attach the offending
//! path so a caller never has to guess which file an `IOError` refers to.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use semver::Version;

pub type Result<T, E = DriverError> = std::result::Result<T, E>;

/// An [`std::io::Error`] with the path that caused it attached.
#[derive(Debug)]
pub struct PathIoError {
    pub io: std::io::Error,
    pub path: PathBuf,
}

impl PathIoError {
    pub fn new(io: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self { io, path: path.into() }
    }
}

impl fmt::Display for PathIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.io)
    }
}

impl std::error::Error for PathIoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.io)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The configuration failed schema validation. Abort before any work (§7).
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// The resolver chain was exhausted for a logical name.
    #[error("could not resolve `{0}`: no resolver strategy applies")]
    NameResolutionError(String),

    /// No released version in the index satisfies the constraint.
    #[error("no released compiler version satisfies `{constraint}` for `{}`", .file.display())]
    UnsatisfiableVersionError { file: PathBuf, constraint: String },

    /// The normalized version does not match any known wrapper family.
    #[error("unsupported compiler version family: {0}")]
    UnsupportedVersionError(Version),

    /// The back-end returned diagnostics at `error` severity.
    #[error("compilation failed with {errors_count} error(s)")]
    CompilationError { errors_count: usize },

    /// `output.contracts[file][name]` (nor the legacy `contracts[""][name]`) was not found.
    #[error("contract `{name}` not found in compiler output for `{}`", .file.display())]
    MissingContractError { file: PathBuf, name: String },

    /// A compiler output mixed the legacy anonymous-key shape with the modern per-file shape.
    #[error("malformed compiler output: mixes legacy and modern `contracts` shapes")]
    MalformedOutput,

    /// Filesystem or network failure. Abort unless offline mode supplies a cached fallback.
    #[error(transparent)]
    IOError(#[from] PathIoError),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    SemVer(#[from] semver::Error),

    #[error("{0}")]
    Message(String),
}

impl DriverError {
    pub fn msg(msg: impl fmt::Display) -> Self {
        DriverError::Message(msg.to_string())
    }

    pub fn io(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        DriverError::IOError(PathIoError::new(err, path))
    }
}

/// Convenience extension for turning a bare [`std::io::Error`] into a [`DriverError`] with its
/// path attached, mirroring the pattern used throughout the resolver and writer.
pub(crate) trait IoResultExt<T> {
    fn path_ctx(self, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for std::result::Result<T, std::io::Error> {
    fn path_ctx(self, path: &Path) -> Result<T> {
        self.map_err(|err| DriverError::io(err, path))
    }
}
