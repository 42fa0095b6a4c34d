//! The build planner (spec §4.E).

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::{
    cache_gate::{self, GateDecision},
    config::{ContractSelector, DriverConfig},
    error::Result,
    hash,
    model::{CompilationPlan, ContractData, ImportRemappings},
    resolver::{ContractSource, Resolver, SpyResolver},
    version::{VersionConstraint, VersionSelector},
    wrapper::WrapperRegistry,
};

/// Everything the planner needs to build a [`CompilationPlan`] for one run.
pub struct PlanInput<'a> {
    pub config: &'a DriverConfig,
    pub resolver: &'a dyn Resolver,
    pub version_selector: &'a VersionSelector,
    pub wrappers: &'a mut WrapperRegistry,
}

/// Everything the planner produced, handed unchanged to the dispatcher and writer.
pub struct PlanResult {
    pub plan: CompilationPlan,
    pub remappings: ImportRemappings,
    /// `absolute_path -> ContractData`, consulted by the writer to know which files in a unit
    /// correspond to a contract this run actually cares about (spec §4.H).
    pub contract_data: HashMap<PathBuf, ContractData>,
    /// Requested names the cache gate decided to skip this run.
    pub skipped: Vec<String>,
}

fn artifact_path(artifacts_dir: &Path, requested_name: &str, contract_name: &str) -> PathBuf {
    artifacts_dir.join(format!("{requested_name}-{contract_name}.json"))
}

fn load_existing_artifact(path: &Path) -> Result<Option<crate::model::Artifact>> {
    if !path.is_file() {
        return Ok(None);
    }
    crate::utils::read_json_file(path).map(Some)
}

/// Computes the bare dependency prefix (`@scope/pkg`) and the directory that package was resolved
/// under, for sources whose logical path looks like a registry import. Returns `None` for
/// project-relative or absolute-path sources, which carry no remapping.
fn package_prefix_and_root(source: &ContractSource) -> Option<(String, PathBuf)> {
    let components: Vec<String> = source
        .logical_path
        .components()
        .filter_map(|c| c.as_os_str().to_str().map(str::to_string))
        .collect();
    if components.len() < 2 || !components[0].starts_with('@') {
        return None;
    }
    let prefix_len = components.len().min(3) - 1; // scope + package name, never the filename
    let prefix = components[..prefix_len].join("/");

    let mut root = source.absolute_path.clone();
    for _ in 0..(components.len() - prefix_len) {
        root.pop();
    }
    Some((prefix, root))
}

/// Resolves the root [`ContractSource`] for one requested name through a fresh spy resolver,
/// returning the spy so the same walk can drive the source-tree hasher afterward (spec §4.A/§4.C).
#[instrument(level = "debug", skip_all, fields(contract = %name))]
fn resolve_root<'r>(resolver: &'r dyn Resolver, name: &str) -> Result<(ContractSource, SpyResolver<'r>)> {
    let spy = SpyResolver::new(resolver);
    let root = spy.resolve(name)?;
    trace!(path = %root.absolute_path.display(), "resolved root");
    Ok((root, spy))
}

/// Computes the hex-encoded source-tree hash for one root (spec §4.C).
#[instrument(level = "debug", skip_all, fields(contract = %name))]
fn hash_root(name: &str, root: &ContractSource, spy: &SpyResolver<'_>) -> Result<String> {
    let tree_hash = hash::hash_source_tree(root, spy)?;
    Ok(hash::to_hex(&tree_hash))
}

/// Consults the cache gate for one [`ContractData`], building the wrapper for the existing
/// artifact's recorded version (not the not-yet-selected new one) if an artifact exists (spec §4.F).
#[instrument(level = "debug", skip_all, fields(contract = %name))]
fn consult_gate(name: &str, data: &ContractData, wrappers: &mut WrapperRegistry) -> Result<GateDecision> {
    let wrapper_for_existing_version = match &data.current_artifact_if_any {
        Some(artifact) => Some(wrappers.get_or_build(&artifact.compiler.version)?),
        None => None,
    };
    let decision = cache_gate::decide(data, wrapper_for_existing_version.as_deref());
    match decision {
        GateDecision::Skip => debug!("cache gate: skip"),
        GateDecision::Rebuild => debug!("cache gate: rebuild"),
    }
    Ok(decision)
}

/// Builds the [`CompilationPlan`] and [`ImportRemappings`] for one run (spec §4.E).
pub struct BuildPlanner;

impl BuildPlanner {
    pub fn plan(input: PlanInput) -> Result<PlanResult> {
        let requested_names = Self::requested_names(input.config, input.resolver)?;

        let mut plan = CompilationPlan::new();
        let mut contract_data = HashMap::new();
        let mut skipped = Vec::new();
        let mut all_sources: Vec<ContractSource> = Vec::new();

        for name in requested_names {
            let (root, spy) = resolve_root(input.resolver, &name)?;
            let tree_hash_hex = hash_root(&name, &root, &spy)?;

            let contract_name = root.contract_name().unwrap_or_else(|| name.clone());
            let path = artifact_path(&input.config.artifacts_dir, &name, &contract_name);
            let current_artifact_if_any = load_existing_artifact(&path)?;

            let data = ContractData {
                requested_name: name.clone(),
                contract_name: contract_name.clone(),
                absolute_path: root.absolute_path.clone(),
                current_artifact_if_any,
                source_tree_hash_hex: tree_hash_hex,
            };

            let decision = consult_gate(&name, &data, input.wrappers)?;
            if decision == GateDecision::Skip {
                skipped.push(name);
                continue;
            }

            let scan = crate::scanner::scan(&root.source_text);
            let version = input.version_selector.select(&root.absolute_path, &scan.version_constraint)?;

            let recorded = spy.into_recorded();
            all_sources.extend(recorded.iter().cloned());

            // The root gets the ContractData already built from the full closure hash; every
            // other file this root's closure touched (e.g. a shared library) is recorded too,
            // under the *first* requesting root's name, so the writer can still locate and emit
            // an artifact for it (spec §8 S4's cross-root dedup scenario writes one for a shared
            // import, not just the requested roots).
            contract_data.entry(data.absolute_path.clone()).or_insert(data);
            for source in &recorded {
                if source.absolute_path == root.absolute_path
                    || contract_data.contains_key(&source.absolute_path)
                {
                    continue;
                }
                let own_name = source.contract_name().unwrap_or_else(|| name.clone());
                let inner_spy = SpyResolver::new(input.resolver);
                let own_hash_hex = hash::to_hex(&hash::hash_source_tree(source, &inner_spy)?);
                let own_path = artifact_path(&input.config.artifacts_dir, &name, &own_name);
                contract_data.insert(
                    source.absolute_path.clone(),
                    ContractData {
                        requested_name: name.clone(),
                        contract_name: own_name,
                        absolute_path: source.absolute_path.clone(),
                        current_artifact_if_any: load_existing_artifact(&own_path)?,
                        source_tree_hash_hex: own_hash_hex,
                    },
                );
            }

            let files = recorded.into_iter().map(|s| (s.absolute_path, s.source_text));
            if input.config.should_compile_independently {
                plan.push_independent_unit(&version, files);
            } else {
                plan.merge_into_batched_unit(&version, files);
            }
        }

        let mut remappings = ImportRemappings::new();
        for source in &all_sources {
            if let Some((prefix, root)) = package_prefix_and_root(source) {
                remappings.entry(prefix).or_insert(root);
            }
        }

        Ok(PlanResult { plan, remappings, contract_data, skipped })
    }

    fn requested_names(config: &DriverConfig, resolver: &dyn Resolver) -> Result<Vec<String>> {
        match &config.contracts {
            ContractSelector::All(_) => resolver
                .get_all()?
                .into_iter()
                .filter_map(|source| source.contract_name())
                .map(Ok)
                .collect(),
            ContractSelector::Named(names) => Ok(names.clone()),
        }
    }
}

/// Intersects a `VersionConstraint` across every file of a standard-JSON bundle, used by the
/// parallel JSON driver (spec §6.5, §9 decision (b)) rather than the single-root constraint this
/// planner uses.
pub fn intersect_bundle_constraints<'a>(sources: impl IntoIterator<Item = &'a str>) -> VersionConstraint {
    let scans: Vec<_> = sources.into_iter().map(crate::scanner::scan).collect();
    VersionConstraint::intersect_all(scans.iter().map(|s| &s.version_constraint))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_prefix_is_extracted() {
        let source = ContractSource {
            logical_path: PathBuf::from("@foo/bar/Token.sol"),
            absolute_path: PathBuf::from("/deps/@foo/bar/Token.sol"),
            source_text: String::new(),
        };
        let (prefix, root) = package_prefix_and_root(&source).unwrap();
        assert_eq!(prefix, "@foo/bar");
        assert_eq!(root, PathBuf::from("/deps/@foo/bar"));
    }

    #[test]
    fn relative_source_has_no_prefix() {
        let source = ContractSource {
            logical_path: PathBuf::from("Token.sol"),
            absolute_path: PathBuf::from("/project/contracts/Token.sol"),
            source_text: String::new(),
        };
        assert!(package_prefix_and_root(&source).is_none());
    }
}
