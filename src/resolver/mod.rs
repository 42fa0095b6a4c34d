//! Pluggable name/path resolution (spec §4.A).
//!
//! A [`Resolver`] maps a logical name (an import string, or a requested contract's basename) to a
//! [`ContractSource`]. The default chain is a [`FallthroughResolver`] trying strategies in order;
//! [`SpyResolver`] wraps any resolver and records every source it yields, which is how the planner
//! discovers a root's transitive import set without a second traversal.

mod spy;
mod strategies;

pub use spy::SpyResolver;
pub use strategies::{
    AbsoluteFsResolver, NameResolver, RegistryResolver, RelativeFsResolver, UrlResolver,
};

use std::path::PathBuf;

use crate::error::{DriverError, Result};

/// Default source file extensions recognized by the filesystem-based strategies.
pub const SOURCE_EXTENSIONS: &[&str] = &["sol"];

/// A resolved source record. Identity is `absolute_path`.
#[derive(Debug, Clone)]
pub struct ContractSource {
    /// Path relative to the project root, used for diagnostics and remapping computation.
    pub logical_path: PathBuf,
    /// Canonical on-disk path; this is the source's identity.
    pub absolute_path: PathBuf,
    pub source_text: String,
}

impl ContractSource {
    pub fn contract_name(&self) -> Option<String> {
        crate::utils::file_stem(&self.absolute_path)
    }
}

/// Outcome of a single strategy's attempt to resolve a name. Distinguishes "this strategy doesn't
/// apply to this kind of name" (triggers fallthrough) from a hard I/O failure (propagated).
pub enum ResolveOutcome {
    Resolved(ContractSource),
    NotApplicable,
}

/// A single strategy in the fallthrough chain.
pub trait ResolverStrategy: Send + Sync {
    fn try_resolve(&self, name: &str) -> Result<ResolveOutcome>;
}

/// The capability a consumer (the build planner, or a nested resolver) actually depends on.
pub trait Resolver {
    fn resolve(&self, name: &str) -> Result<ContractSource>;
    fn get_all(&self) -> Result<Vec<ContractSource>>;
}

/// The default resolver chain: strategies tried in order, falling back to the project-wide name
/// index which also answers `get_all()`.
pub struct FallthroughResolver {
    strategies: Vec<Box<dyn ResolverStrategy>>,
    name_resolver: NameResolver,
}

impl FallthroughResolver {
    /// Builds the standard chain: URL fetch, dependency registry, project-relative filesystem,
    /// absolute filesystem, then the name index.
    pub fn standard(contracts_dir: PathBuf, registry_root: Option<PathBuf>) -> Self {
        let name_resolver = NameResolver::new(contracts_dir.clone());
        let mut strategies: Vec<Box<dyn ResolverStrategy>> = vec![Box::new(UrlResolver)];
        if let Some(root) = registry_root {
            strategies.push(Box::new(RegistryResolver::new(root)));
        }
        strategies.push(Box::new(RelativeFsResolver::new(contracts_dir)));
        strategies.push(Box::new(AbsoluteFsResolver));
        Self { strategies, name_resolver }
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ResolverStrategy>>, name_resolver: NameResolver) -> Self {
        Self { strategies, name_resolver }
    }
}

impl Resolver for FallthroughResolver {
    fn resolve(&self, name: &str) -> Result<ContractSource> {
        for strategy in &self.strategies {
            match strategy.try_resolve(name)? {
                ResolveOutcome::Resolved(source) => return Ok(source),
                ResolveOutcome::NotApplicable => continue,
            }
        }
        match self.name_resolver.try_resolve(name)? {
            ResolveOutcome::Resolved(source) => Ok(source),
            ResolveOutcome::NotApplicable => {
                Err(DriverError::NameResolutionError(name.to_string()))
            }
        }
    }

    fn get_all(&self) -> Result<Vec<ContractSource>> {
        self.name_resolver.get_all()
    }
}
