//! Core data model (spec §3).

use std::{
    collections::{BTreeMap, HashMap},
    path::PathBuf,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::hash::Digest32;

/// The schema version stamped into every artifact this crate writes. Bumping it invalidates every
/// cached artifact on the next run (spec §4.F).
pub const SCHEMA_VERSION: u32 = 1;

/// Planner bookkeeping for one requested contract (spec §3).
///
/// `requested_name` is the name the caller asked to build (as opposed to `contract_name`, derived
/// from the resolved file's basename); spec §3 doesn't enumerate it explicitly among this record's
/// fields but §4.H's artifact filename (`<requested_name>-<contract_name>.json`) needs both, so it
/// travels alongside the rest of this bookkeeping rather than being re-derived by the writer (see
/// DESIGN.md).
#[derive(Debug, Clone)]
pub struct ContractData {
    pub requested_name: String,
    pub contract_name: String,
    pub absolute_path: PathBuf,
    pub current_artifact_if_any: Option<Artifact>,
    pub source_tree_hash_hex: String,
}

/// A single submission to a back-end compiler: absolute path -> source text.
pub type CompilationUnit = BTreeMap<PathBuf, String>;

/// Bare dependency prefix (e.g. `@foo/bar`) -> resolved filesystem root, shared by every unit of a
/// run.
pub type ImportRemappings = BTreeMap<String, PathBuf>;

/// Mapping from concrete compiler version string to an ordered sequence of units for that
/// version. In batched mode each version has exactly one unit; in independent mode, one unit per
/// requested root.
///
/// Preserves version-insertion order (spec §5 "version keys in insertion order") without pulling
/// in an indexmap dependency: `order` records first-seen order, `units` holds the actual units.
#[derive(Debug, Default)]
pub struct CompilationPlan {
    order: Vec<String>,
    units: HashMap<String, Vec<CompilationUnit>>,
}

impl CompilationPlan {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_version(&mut self, version: &str) {
        if !self.units.contains_key(version) {
            self.order.push(version.to_string());
            self.units.insert(version.to_string(), Vec::new());
        }
    }

    /// Batched mode: merges `files` into the single (possibly already-nonempty) unit for
    /// `version`, creating it if this is the first file seen for that version.
    pub fn merge_into_batched_unit(
        &mut self,
        version: &str,
        files: impl IntoIterator<Item = (PathBuf, String)>,
    ) {
        self.ensure_version(version);
        let units = self.units.get_mut(version).expect("just ensured");
        if units.is_empty() {
            units.push(CompilationUnit::new());
        }
        let unit = &mut units[0];
        for (path, source) in files {
            unit.insert(path, source);
        }
    }

    /// Independent mode: always allocates a new unit for `version` from `files`.
    pub fn push_independent_unit(
        &mut self,
        version: &str,
        files: impl IntoIterator<Item = (PathBuf, String)>,
    ) {
        self.ensure_version(version);
        let unit: CompilationUnit = files.into_iter().collect();
        self.units.get_mut(version).expect("just ensured").push(unit);
    }

    /// Iterates `(version, unit)` pairs in the deterministic order required by the writer: version
    /// keys in insertion order, units in index order within a version.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CompilationUnit)> {
        self.order.iter().flat_map(move |version| {
            self.units[version].iter().map(move |unit| (version.as_str(), unit))
        })
    }

    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn units_for(&self, version: &str) -> &[CompilationUnit] {
        self.units.get(version).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Per-file metadata recorded alongside a unit's compiled output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMetadata {
    pub content_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerInfo {
    pub name: String,
    pub version: String,
    pub settings: Value,
}

/// The persisted output for one contract (spec §3, §6.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub schema_version: u32,
    pub contract_name: String,
    /// The source-tree hash (hex, `0x`-prefixed) this artifact was built from; compared against
    /// the freshly computed hash by the cache gate (spec §4.F). Not enumerated among the
    /// back-end-facing keys in spec §6.4 but required by §4.F's gate logic, so it is carried as
    /// its own top-level field rather than folded into `sources` (see DESIGN.md).
    pub source_tree_hash_hex: String,
    pub compiler_output: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard_input: Option<Value>,
    pub sources: BTreeMap<PathBuf, SourceMetadata>,
    pub compiler: CompilerInfo,
    pub chains: BTreeMap<String, Value>,
}

/// Transient, per-run mapping `absolute_path -> unit_size`, owned exclusively by the writer, used
/// to decide whether to overwrite a previously written artifact with one produced from a smaller
/// unit (spec §4.H, "smallest-unit-wins").
#[derive(Debug, Default)]
pub struct PersistedArtifactCache {
    written_unit_size: HashMap<PathBuf, usize>,
}

impl PersistedArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` and records `unit_size` if `absolute_path` has not been written this run, or
    /// if `unit_size` is strictly smaller than the previously recorded size.
    pub fn should_write(&mut self, absolute_path: &PathBuf, unit_size: usize) -> bool {
        match self.written_unit_size.get(absolute_path) {
            Some(&existing) if unit_size >= existing => false,
            _ => {
                self.written_unit_size.insert(absolute_path.clone(), unit_size);
                true
            }
        }
    }
}

/// Internal helper used by the hasher/gate when a digest (not yet hex-encoded) needs to travel
/// alongside a path.
#[derive(Debug, Clone, Copy)]
pub struct TreeHash(pub Digest32);

impl TreeHash {
    pub fn to_hex(&self) -> String {
        crate::hash::to_hex(&self.0)
    }
}
