//! Built-in resolver strategies (spec §4.A).

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{ContractSource, ResolveOutcome, ResolverStrategy, SOURCE_EXTENSIONS};
use crate::error::{DriverError, IoResultExt, Result};

fn read_source(absolute_path: PathBuf, logical_path: PathBuf) -> Result<ContractSource> {
    let source_text =
        std::fs::read_to_string(&absolute_path).path_ctx(&absolute_path)?;
    Ok(ContractSource { logical_path, absolute_path, source_text })
}

/// Strategy (1): fetches sources whose name is a `http(s)://` URL.
///
/// Downloading is a genuine network collaborator; without the `remote` feature a URL-shaped name
/// is a hard failure rather than a silent fallthrough, since this strategy clearly *does* apply to
/// it.
pub struct UrlResolver;

impl ResolverStrategy for UrlResolver {
    fn try_resolve(&self, name: &str) -> Result<ResolveOutcome> {
        if !(name.starts_with("http://") || name.starts_with("https://")) {
            return Ok(ResolveOutcome::NotApplicable);
        }

        #[cfg(feature = "remote")]
        {
            let body = reqwest::blocking::get(name)
                .and_then(|resp| resp.error_for_status())
                .and_then(|resp| resp.text())
                .map_err(|err| DriverError::msg(format!("fetching `{name}`: {err}")))?;
            Ok(ResolveOutcome::Resolved(ContractSource {
                logical_path: PathBuf::from(name),
                absolute_path: PathBuf::from(name),
                source_text: body,
            }))
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(DriverError::msg(format!(
                "`{name}` looks like a URL import but this build was compiled without the `remote` feature"
            )))
        }
    }
}

/// Strategy (2): looks under a dependency-registry root (e.g. an installed-packages directory)
/// for a bare import prefix such as `@foo/bar/Token.sol`.
pub struct RegistryResolver {
    root: PathBuf,
}

impl RegistryResolver {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl ResolverStrategy for RegistryResolver {
    fn try_resolve(&self, name: &str) -> Result<ResolveOutcome> {
        if !name.starts_with('@') && !name.starts_with("node_modules") {
            return Ok(ResolveOutcome::NotApplicable);
        }
        let candidate = self.root.join(name);
        if !candidate.is_file() {
            return Ok(ResolveOutcome::NotApplicable);
        }
        read_source(candidate, PathBuf::from(name)).map(ResolveOutcome::Resolved)
    }
}

/// Strategy (3): resolves `name` relative to the project's contracts directory.
pub struct RelativeFsResolver {
    contracts_dir: PathBuf,
}

impl RelativeFsResolver {
    pub fn new(contracts_dir: PathBuf) -> Self {
        Self { contracts_dir }
    }
}

impl ResolverStrategy for RelativeFsResolver {
    fn try_resolve(&self, name: &str) -> Result<ResolveOutcome> {
        let candidate = self.contracts_dir.join(name);
        if !candidate.is_file() {
            return Ok(ResolveOutcome::NotApplicable);
        }
        read_source(candidate, PathBuf::from(name)).map(ResolveOutcome::Resolved)
    }
}

/// Strategy (4): treats `name` as an absolute filesystem path.
pub struct AbsoluteFsResolver;

impl ResolverStrategy for AbsoluteFsResolver {
    fn try_resolve(&self, name: &str) -> Result<ResolveOutcome> {
        let path = Path::new(name);
        if !path.is_absolute() || !path.is_file() {
            return Ok(ResolveOutcome::NotApplicable);
        }
        read_source(path.to_path_buf(), path.to_path_buf()).map(ResolveOutcome::Resolved)
    }
}

/// Strategy (5): the project-wide name index. Walks `contracts_dir` once per call and matches by
/// basename (with or without extension). Also the only strategy that answers `get_all()`.
pub struct NameResolver {
    contracts_dir: PathBuf,
}

impl NameResolver {
    pub fn new(contracts_dir: PathBuf) -> Self {
        Self { contracts_dir }
    }

    fn all_source_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.contracts_dir).into_iter() {
            let entry = entry.map_err(|err| {
                DriverError::io(
                    err.into_io_error().unwrap_or_else(|| {
                        std::io::Error::new(std::io::ErrorKind::Other, "walk failed")
                    }),
                    &self.contracts_dir,
                )
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let is_source = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| SOURCE_EXTENSIONS.contains(&ext))
                .unwrap_or(false);
            if is_source {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }

    pub(super) fn try_resolve(&self, name: &str) -> Result<ResolveOutcome> {
        let target_stem = Path::new(name).file_stem().and_then(|s| s.to_str()).unwrap_or(name);
        for absolute_path in self.all_source_files()? {
            let stem = absolute_path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            if stem == target_stem {
                let logical_path = absolute_path
                    .strip_prefix(&self.contracts_dir)
                    .unwrap_or(&absolute_path)
                    .to_path_buf();
                return read_source(absolute_path, logical_path).map(ResolveOutcome::Resolved);
            }
        }
        Ok(ResolveOutcome::NotApplicable)
    }

    pub fn get_all(&self) -> Result<Vec<ContractSource>> {
        self.all_source_files()?
            .into_iter()
            .map(|absolute_path| {
                let logical_path = absolute_path
                    .strip_prefix(&self.contracts_dir)
                    .unwrap_or(&absolute_path)
                    .to_path_buf();
                read_source(absolute_path, logical_path)
            })
            .collect()
    }
}
