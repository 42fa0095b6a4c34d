//! The artifact-cache gate (spec §4.F).

use crate::{model::ContractData, model::SCHEMA_VERSION, wrapper::CompilerWrapper};

/// Whether an existing artifact is still valid for the contract it was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Rebuild,
    Skip,
}

/// Decides, for one [`ContractData`], whether the existing artifact (if any) can be reused.
///
/// `wrapper_for_existing_version` is the back-end instance for the version the existing artifact
/// was built with (so its `settings_equal` can judge the cached settings against the currently
/// configured ones), and is only consulted, never invoked to compile. `None` when there is no
/// existing artifact to compare against.
pub fn decide(data: &ContractData, wrapper_for_existing_version: Option<&dyn CompilerWrapper>) -> GateDecision {
    let Some(artifact) = &data.current_artifact_if_any else {
        trace!(contract = %data.contract_name, "no existing artifact");
        return GateDecision::Rebuild;
    };

    if artifact.schema_version != SCHEMA_VERSION {
        debug!(
            contract = %data.contract_name,
            found = artifact.schema_version,
            current = SCHEMA_VERSION,
            "schema version mismatch"
        );
        return GateDecision::Rebuild;
    }

    let settings_equal = wrapper_for_existing_version
        .map(|wrapper| wrapper.settings_equal(&artifact.compiler.settings))
        .unwrap_or(false);
    if !settings_equal {
        debug!(contract = %data.contract_name, "compiler settings changed");
        return GateDecision::Rebuild;
    }

    if artifact.source_tree_hash_hex != data.source_tree_hash_hex {
        debug!(contract = %data.contract_name, "source tree hash changed");
        return GateDecision::Rebuild;
    }

    trace!(contract = %data.contract_name, "artifact up to date");
    GateDecision::Skip
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, path::PathBuf};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::{
        error::Result,
        model::{Artifact, CompilerInfo},
        wrapper::WrapperOutput,
    };

    struct FixedWrapper {
        settings: serde_json::Value,
    }

    #[async_trait]
    impl CompilerWrapper for FixedWrapper {
        fn name(&self) -> &str {
            "fixed"
        }
        fn version(&self) -> &str {
            "0.6.12+commit.27d51765"
        }
        async fn compile(
            &self,
            _unit_contents: &BTreeMap<PathBuf, String>,
            _remappings: &BTreeMap<String, PathBuf>,
        ) -> Result<WrapperOutput> {
            unreachable!("gate must not compile")
        }
        fn settings_equal(&self, other: &serde_json::Value) -> bool {
            &self.settings == other
        }
    }

    fn artifact(schema_version: u32, tree_hash: &str, settings: serde_json::Value) -> Artifact {
        Artifact {
            schema_version,
            contract_name: "A".to_string(),
            source_tree_hash_hex: tree_hash.to_string(),
            compiler_output: json!({}),
            standard_input: None,
            sources: BTreeMap::new(),
            compiler: CompilerInfo {
                name: "solc".to_string(),
                version: "0.6.12+commit.27d51765".to_string(),
                settings,
            },
            chains: BTreeMap::new(),
        }
    }

    fn data(current_artifact_if_any: Option<Artifact>, tree_hash: &str) -> ContractData {
        ContractData {
            requested_name: "A".to_string(),
            contract_name: "A".to_string(),
            absolute_path: PathBuf::from("A.sol"),
            current_artifact_if_any,
            source_tree_hash_hex: tree_hash.to_string(),
        }
    }

    #[test]
    fn no_artifact_rebuilds() {
        let data = data(None, "0xabc");
        assert_eq!(decide(&data, None), GateDecision::Rebuild);
    }

    #[test]
    fn matching_everything_skips() {
        let wrapper = FixedWrapper { settings: json!({"optimizer": true}) };
        let data = data(Some(artifact(SCHEMA_VERSION, "0xabc", json!({"optimizer": true}))), "0xabc");
        assert_eq!(decide(&data, Some(&wrapper)), GateDecision::Skip);
    }

    #[test]
    fn hash_mismatch_rebuilds() {
        let wrapper = FixedWrapper { settings: json!({}) };
        let data = data(Some(artifact(SCHEMA_VERSION, "0xabc", json!({}))), "0xdef");
        assert_eq!(decide(&data, Some(&wrapper)), GateDecision::Rebuild);
    }

    #[test]
    fn schema_mismatch_rebuilds() {
        let wrapper = FixedWrapper { settings: json!({}) };
        let data = data(Some(artifact(SCHEMA_VERSION + 1, "0xabc", json!({}))), "0xabc");
        assert_eq!(decide(&data, Some(&wrapper)), GateDecision::Rebuild);
    }

    #[test]
    fn settings_mismatch_rebuilds() {
        let wrapper = FixedWrapper { settings: json!({"optimizer": true}) };
        let data = data(Some(artifact(SCHEMA_VERSION, "0xabc", json!({"optimizer": false}))), "0xabc");
        assert_eq!(decide(&data, Some(&wrapper)), GateDecision::Rebuild);
    }
}
