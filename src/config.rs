//! Driver configuration (spec §6.1, §6.2, §6.9).

use std::{env, path::PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DriverError, Result};

/// Either every contract the name resolver can enumerate, or an explicit list of basenames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContractSelector {
    All(AllMarker),
    Named(Vec<String>),
}

/// Wrapper so `"*"` round-trips through serde's untagged enum matching instead of colliding with
/// `Named`'s string-vec shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllMarker;

impl Serialize for AllMarker {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str("*")
    }
}

impl<'de> Deserialize<'de> for AllMarker {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == "*" {
            Ok(AllMarker)
        } else {
            Err(serde::de::Error::custom("expected the literal string \"*\""))
        }
    }
}

impl Default for ContractSelector {
    fn default() -> Self {
        ContractSelector::All(AllMarker)
    }
}

/// The validated configuration surface (spec §6.1). Loaded either via [`DriverConfigBuilder`] or
/// by deserializing an external document with `deny_unknown_fields`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DriverConfig {
    pub contracts_dir: PathBuf,
    pub artifacts_dir: PathBuf,
    #[serde(default)]
    pub contracts: ContractSelector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solc_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiler_settings: Option<Value>,
    #[serde(default)]
    pub use_dockerised_solc: bool,
    #[serde(default)]
    pub is_offline_mode: bool,
    #[serde(default)]
    pub should_save_standard_input: bool,
    #[serde(default)]
    pub should_compile_independently: bool,
}

impl DriverConfig {
    pub fn builder() -> DriverConfigBuilder {
        DriverConfigBuilder::default()
    }

    /// Deserializes a config document (JSON), rejecting unknown fields (spec §6.9).
    pub fn from_json_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|err| DriverError::ConfigInvalid(err.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if let ContractSelector::Named(names) = &self.contracts {
            if names.iter().any(|n| n.trim().is_empty()) {
                return Err(DriverError::ConfigInvalid(
                    "`contracts` entries must be non-empty basenames".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Applies the environment overrides in spec §6.2 on top of an already-built config.
    ///
    /// `SOLCJS_PATH`'s filename encodes the pinned version and dominates `solc_version`;
    /// `SOLC_OFFLINE` (any non-empty value) forces offline mode.
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(path) = env::var("SOLCJS_PATH") {
            if let Some(version) = PathBuf::from(&path).file_stem().and_then(|s| s.to_str()) {
                debug!(version, "SOLCJS_PATH pins compiler version");
                self.solc_version = Some(version.to_string());
            }
        }
        if env::var("SOLC_OFFLINE").map(|v| !v.is_empty()).unwrap_or(false) {
            debug!("SOLC_OFFLINE forces offline mode");
            self.is_offline_mode = true;
        }
        self
    }
}

/// Builds a [`DriverConfig`], applying the defaults in spec §6.1.
#[derive(Debug, Default)]
pub struct DriverConfigBuilder {
    contracts_dir: Option<PathBuf>,
    artifacts_dir: Option<PathBuf>,
    contracts: Option<ContractSelector>,
    solc_version: Option<String>,
    compiler_settings: Option<Value>,
    use_dockerised_solc: bool,
    is_offline_mode: bool,
    should_save_standard_input: bool,
    should_compile_independently: bool,
}

impl DriverConfigBuilder {
    pub fn contracts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.contracts_dir = Some(dir.into());
        self
    }

    pub fn artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = Some(dir.into());
        self
    }

    pub fn contracts(mut self, selector: ContractSelector) -> Self {
        self.contracts = Some(selector);
        self
    }

    pub fn solc_version(mut self, version: impl Into<String>) -> Self {
        self.solc_version = Some(version.into());
        self
    }

    pub fn compiler_settings(mut self, settings: Value) -> Self {
        self.compiler_settings = Some(settings);
        self
    }

    pub fn use_dockerised_solc(mut self, value: bool) -> Self {
        self.use_dockerised_solc = value;
        self
    }

    pub fn is_offline_mode(mut self, value: bool) -> Self {
        self.is_offline_mode = value;
        self
    }

    pub fn should_save_standard_input(mut self, value: bool) -> Self {
        self.should_save_standard_input = value;
        self
    }

    pub fn should_compile_independently(mut self, value: bool) -> Self {
        self.should_compile_independently = value;
        self
    }

    pub fn build(self) -> Result<DriverConfig> {
        let contracts_dir = self.contracts_dir.unwrap_or_else(|| PathBuf::from("./contracts"));
        // Best-effort: a fresh project may not have created `contracts_dir` yet, in which case
        // there is nothing on disk to resolve and the relative path is kept as given.
        let contracts_dir = crate::utils::canonicalize(&contracts_dir).unwrap_or(contracts_dir);

        let config = DriverConfig {
            contracts_dir,
            artifacts_dir: self.artifacts_dir.unwrap_or_else(|| PathBuf::from("./artifacts")),
            contracts: self.contracts.unwrap_or_default(),
            solc_version: self.solc_version,
            compiler_settings: self.compiler_settings,
            use_dockerised_solc: self.use_dockerised_solc,
            is_offline_mode: self.is_offline_mode,
            should_save_standard_input: self.should_save_standard_input,
            should_compile_independently: self.should_compile_independently,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = DriverConfig::builder().build().unwrap();
        assert_eq!(config.contracts_dir, PathBuf::from("./contracts"));
        assert_eq!(config.artifacts_dir, PathBuf::from("./artifacts"));
        assert_eq!(config.contracts, ContractSelector::All(AllMarker));
        assert!(!config.is_offline_mode);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let value = serde_json::json!({
            "contractsDir": "./contracts",
            "artifactsDir": "./artifacts",
            "bogusField": true,
        });
        let err = DriverConfig::from_json_value(value).unwrap_err();
        assert!(matches!(err, DriverError::ConfigInvalid(_)));
    }

    #[test]
    fn named_selector_round_trips() {
        let value = serde_json::json!({
            "contractsDir": "./contracts",
            "artifactsDir": "./artifacts",
            "contracts": ["A", "B"],
        });
        let config = DriverConfig::from_json_value(value).unwrap();
        assert_eq!(config.contracts, ContractSelector::Named(vec!["A".into(), "B".into()]));
    }

    #[test]
    fn empty_named_entry_is_invalid() {
        let err = DriverConfig::builder()
            .contracts(ContractSelector::Named(vec!["".to_string()]))
            .build()
            .unwrap_err();
        assert!(matches!(err, DriverError::ConfigInvalid(_)));
    }
}
