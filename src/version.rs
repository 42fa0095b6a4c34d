//! Version constraints and the version selector (spec §4.D).

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};

use crate::error::{DriverError, Result};

/// An opaque, possibly-intersected semantic-version range expression extracted from one or more
/// `pragma` directives. Empty means "no constraint" (any released version satisfies it).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionConstraint(String);

impl VersionConstraint {
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn single(range: String) -> Self {
        Self(range)
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Intersects two constraints. Semver comparator lists are already an AND of their
    /// comparators, so intersection is simply concatenation by comma.
    pub fn intersect(&self, other: &Self) -> Self {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => Self::empty(),
            (true, false) => other.clone(),
            (false, true) => self.clone(),
            (false, false) => Self(format!("{},{}", self.0, other.0)),
        }
    }

    pub fn intersect_all<'a>(constraints: impl IntoIterator<Item = &'a Self>) -> Self {
        constraints.into_iter().fold(Self::empty(), |acc, c| acc.intersect(c))
    }

    /// Parses this constraint into a [`VersionReq`]. `None` when empty (matches anything).
    pub fn to_version_req(&self) -> Result<Option<VersionReq>> {
        if self.is_empty() {
            return Ok(None);
        }
        Ok(Some(VersionReq::parse(&self.0)?))
    }
}

/// The mapping from short version (e.g. `0.6.12`) to the fully qualified version-with-commit
/// string published by the back-end project (e.g. `0.6.12+commit.27d51765`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseIndex {
    pub releases: BTreeMap<String, String>,
}

/// Where the release index comes from: a local cache (offline mode) or a live fetch that
/// refreshes that same cache (online mode). See spec §4.D.
pub trait ReleaseIndexSource {
    fn load(&self) -> Result<ReleaseIndex>;
}

/// Reads the release index from a local JSON cache file. Used in offline mode.
pub struct CachedReleaseIndexSource {
    pub cache_path: PathBuf,
}

impl CachedReleaseIndexSource {
    pub fn new(cache_path: PathBuf) -> Self {
        Self { cache_path }
    }
}

impl ReleaseIndexSource for CachedReleaseIndexSource {
    fn load(&self) -> Result<ReleaseIndex> {
        trace!("reading release index cache at {}", self.cache_path.display());
        crate::utils::read_json_file(&self.cache_path)
    }
}

/// Fetches the release index from a remote endpoint, then writes it to `cache_path` so a
/// subsequent offline run can reuse it.
#[cfg(feature = "remote")]
pub struct RemoteReleaseIndexSource {
    pub url: url::Url,
    pub cache_path: PathBuf,
}

#[cfg(feature = "remote")]
impl RemoteReleaseIndexSource {
    pub fn new(url: url::Url, cache_path: PathBuf) -> Self {
        Self { url, cache_path }
    }
}

#[cfg(feature = "remote")]
impl ReleaseIndexSource for RemoteReleaseIndexSource {
    fn load(&self) -> Result<ReleaseIndex> {
        trace!("fetching release index from {}", self.url);
        let index: ReleaseIndex = reqwest::blocking::get(self.url.clone())
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json())
            .map_err(|err| DriverError::msg(format!("fetching release index: {err}")))?;
        crate::utils::write_json_file(&index, &self.cache_path)?;
        Ok(index)
    }
}

/// Strips a leading `v` from a pin, e.g. `v0.8.24+commit.e11b9ed9` -> `0.8.24+commit.e11b9ed9`.
fn normalize_pin(pin: &str) -> String {
    pin.strip_prefix('v').unwrap_or(pin).to_string()
}

/// Picks a concrete back-end version per file, honoring an optional pin (spec §4.D).
pub struct VersionSelector {
    index: ReleaseIndex,
    pin: Option<String>,
}

impl VersionSelector {
    pub fn new(index: ReleaseIndex, pin: Option<String>) -> Self {
        Self { index, pin }
    }

    /// Selects the version to use for `file` given its (possibly intersected) `constraint`.
    pub fn select(&self, file: &Path, constraint: &VersionConstraint) -> Result<String> {
        if let Some(pin) = &self.pin {
            let normalized = normalize_pin(pin);
            debug!(file = %file.display(), version = %normalized, "version pin dominates constraint");
            return Ok(normalized);
        }

        let req = constraint.to_version_req()?;
        let mut best: Option<(Version, &str)> = None;
        for (short, full) in &self.index.releases {
            let Ok(parsed) = Version::parse(short) else { continue };
            let matches = req.as_ref().map(|r| r.matches(&parsed)).unwrap_or(true);
            if !matches {
                continue;
            }
            if best.as_ref().map(|(v, _)| parsed > *v).unwrap_or(true) {
                best = Some((parsed, full.as_str()));
            }
        }

        best.map(|(_, full)| full.to_string()).ok_or_else(|| {
            DriverError::UnsatisfiableVersionError {
                file: file.to_path_buf(),
                constraint: constraint.as_str().to_string(),
            }
        })
    }
}
