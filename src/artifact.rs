//! The artifact writer (spec §4.H).

use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
};

use serde_json::Value;

use crate::{
    dispatcher::DispatchedUnit,
    error::{DriverError, Result},
    hash,
    model::{Artifact, CompilationUnit, CompilerInfo, ContractData, PersistedArtifactCache, SourceMetadata, SCHEMA_VERSION},
};

/// Looks up `output.contracts[absolute_path][contract_name]`, falling back to the legacy
/// `output.contracts[""][contract_name]` shape used by the oldest back-end family (spec §4.H, §6.4).
/// An output that contains both shapes at once is rejected outright (spec §9 decision (a)).
fn find_contract_record<'v>(output: &'v Value, absolute_path: &Path, contract_name: &str) -> Result<&'v Value> {
    let contracts = output.get("contracts").and_then(Value::as_object).ok_or_else(|| {
        DriverError::MissingContractError { file: absolute_path.to_path_buf(), name: contract_name.to_string() }
    })?;

    let has_legacy = contracts.contains_key("");
    let has_modern = contracts.keys().any(|key| !key.is_empty());
    if has_legacy && has_modern {
        return Err(DriverError::MalformedOutput);
    }

    let key: &str = if has_legacy { "" } else { &absolute_path.to_string_lossy() };
    contracts
        .get(key)
        .and_then(|file_entry| file_entry.get(contract_name))
        .ok_or_else(|| DriverError::MissingContractError {
            file: absolute_path.to_path_buf(),
            name: contract_name.to_string(),
        })
}

fn source_metadata(unit: &CompilationUnit) -> BTreeMap<PathBuf, SourceMetadata> {
    unit.iter()
        .map(|(path, text)| {
            let digest = hash::to_hex(&hash::hash_bytes(text.as_bytes()));
            (path.clone(), SourceMetadata { content_hash: digest })
        })
        .collect()
}

/// Writes one artifact per contract, resolving cross-unit duplicates by unit size (spec §4.H).
pub struct ArtifactWriter {
    artifacts_dir: PathBuf,
    compiler_name: String,
    compiler_settings: Value,
    should_save_standard_input: bool,
    written: PersistedArtifactCache,
}

impl ArtifactWriter {
    pub fn new(
        artifacts_dir: PathBuf,
        compiler_name: impl Into<String>,
        compiler_settings: Value,
        should_save_standard_input: bool,
    ) -> Self {
        Self {
            artifacts_dir,
            compiler_name: compiler_name.into(),
            compiler_settings,
            should_save_standard_input,
            written: PersistedArtifactCache::new(),
        }
    }

    /// Writes artifacts for every `(version, unit)` the dispatcher ran, in plan order, honoring
    /// "smallest unit wins" (spec §8 property 4) for files that appear in more than one unit.
    pub fn write_all(
        &mut self,
        dispatched: &[DispatchedUnit],
        units_by_version: &HashMap<String, Vec<CompilationUnit>>,
        contract_data: &HashMap<PathBuf, ContractData>,
    ) -> Result<Vec<PathBuf>> {
        let mut written_paths = Vec::new();
        for dispatched_unit in dispatched {
            let Some(unit) = units_by_version
                .get(&dispatched_unit.version)
                .and_then(|units| units.get(dispatched_unit.unit_index))
            else {
                continue;
            };
            let unit_size = unit.len();

            for absolute_path in unit.keys() {
                let Some(data) = contract_data.get(absolute_path) else { continue };

                if !self.written.should_write(absolute_path, unit_size) {
                    trace!(path = %absolute_path.display(), "writer: larger or equal unit, keeping existing");
                    continue;
                }

                let record = find_contract_record(&dispatched_unit.output.output, absolute_path, &data.contract_name)?;

                let artifact = Artifact {
                    schema_version: SCHEMA_VERSION,
                    contract_name: data.contract_name.clone(),
                    source_tree_hash_hex: data.source_tree_hash_hex.clone(),
                    compiler_output: record.clone(),
                    standard_input: self.should_save_standard_input.then(|| dispatched_unit.output.input.clone()),
                    sources: source_metadata(unit),
                    compiler: CompilerInfo {
                        name: self.compiler_name.clone(),
                        version: dispatched_unit.version.clone(),
                        settings: self.compiler_settings.clone(),
                    },
                    chains: BTreeMap::new(),
                };

                let path = self
                    .artifacts_dir
                    .join(format!("{}-{}.json", data.requested_name, data.contract_name));
                crate::utils::write_json_file(&artifact, &path)?;
                debug!(path = %path.display(), unit_size, "writer: wrote artifact");
                written_paths.push(path);
            }
        }
        Ok(written_paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wrapper::WrapperOutput;
    use serde_json::json;

    fn unit(files: &[(&str, &str)]) -> CompilationUnit {
        files.iter().map(|(p, s)| (PathBuf::from(p), s.to_string())).collect()
    }

    fn data(requested_name: &str, contract_name: &str, absolute_path: &str) -> ContractData {
        ContractData {
            requested_name: requested_name.to_string(),
            contract_name: contract_name.to_string(),
            absolute_path: PathBuf::from(absolute_path),
            current_artifact_if_any: None,
            source_tree_hash_hex: "0xabc".to_string(),
        }
    }

    #[test]
    fn legacy_and_modern_mix_is_malformed() {
        let output = json!({
            "contracts": {
                "": {"A": {}},
                "A.sol": {"A": {}},
            }
        });
        let err = find_contract_record(&output, Path::new("A.sol"), "A").unwrap_err();
        assert!(matches!(err, DriverError::MalformedOutput));
    }

    #[test]
    fn legacy_fallback_is_used_when_only_shape_present() {
        let output = json!({"contracts": {"": {"A": {"abi": []}}}});
        let record = find_contract_record(&output, Path::new("A.sol"), "A").unwrap();
        assert_eq!(record, &json!({"abi": []}));
    }

    #[test]
    fn missing_contract_errors() {
        let output = json!({"contracts": {"A.sol": {}}});
        let err = find_contract_record(&output, Path::new("A.sol"), "A").unwrap_err();
        assert!(matches!(err, DriverError::MissingContractError { .. }));
    }

    #[test]
    fn smallest_unit_wins() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ArtifactWriter::new(dir.path().to_path_buf(), "solc", json!({}), false);

        let small_unit = unit(&[("/p/L.sol", "library L {}")]);
        let big_unit = unit(&[("/p/L.sol", "library L {}"), ("/p/A.sol", "contract A {}")]);

        let mut units_by_version: HashMap<String, Vec<CompilationUnit>> = HashMap::new();
        units_by_version.insert("0.6.12".to_string(), vec![big_unit.clone(), small_unit.clone()]);

        let mut contract_data: HashMap<PathBuf, ContractData> = HashMap::new();
        contract_data.insert(PathBuf::from("/p/L.sol"), data("A", "L", "/p/L.sol"));

        let output_big = json!({"contracts": {"/p/L.sol": {"L": {"marker": "big"}}}});
        let output_small = json!({"contracts": {"/p/L.sol": {"L": {"marker": "small"}}}});

        let dispatched = vec![
            DispatchedUnit {
                version: "0.6.12".to_string(),
                unit_index: 0,
                output: WrapperOutput { input: json!({}), output: output_big },
            },
            DispatchedUnit {
                version: "0.6.12".to_string(),
                unit_index: 1,
                output: WrapperOutput { input: json!({}), output: output_small },
            },
        ];

        writer.write_all(&dispatched, &units_by_version, &contract_data).unwrap();

        let written: Artifact = crate::utils::read_json_file(dir.path().join("A-L.json")).unwrap();
        assert_eq!(written.compiler_output, json!({"marker": "small"}));
    }
}
