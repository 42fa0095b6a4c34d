//! The back-end wrapper capability (spec §6.3) and its per-driver registry (spec §9).
//!
//! Concrete compiler adapters are out of scope for this crate (spec §1) — only the capability
//! interface, the version-family dispatch, and the lazily-populated registry live here. Embedders
//! provide a [`WrapperFactory`] that knows how to construct a real `solc`/`vyper`/etc. wrapper for
//! a given family; this crate ships only what's needed to exercise the planner/dispatcher/writer
//! against a test double.

mod family;
mod registry;

pub use family::VersionFamily;
pub use registry::WrapperRegistry;

use std::{collections::BTreeMap, path::PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// `{input, output}` as returned by a back-end invocation: `input` is the standard-JSON request
/// actually sent, `output` is the compiler's standard-JSON response, both kept opaque since the
/// wire format is owned by the concrete adapter, not this crate.
#[derive(Debug, Clone)]
pub struct WrapperOutput {
    pub input: Value,
    pub output: Value,
}

/// The capability one concrete back-end version presents to the dispatcher and cache gate.
#[async_trait]
pub trait CompilerWrapper: Send + Sync {
    /// Human-readable back-end name, e.g. `"solc"`.
    fn name(&self) -> &str;

    /// The normalized version string this instance was constructed for.
    fn version(&self) -> &str;

    /// Compiles one unit. `unit_contents` maps absolute file path to source text;
    /// `remappings` maps bare dependency prefixes to resolved filesystem roots.
    async fn compile(
        &self,
        unit_contents: &BTreeMap<PathBuf, String>,
        remappings: &BTreeMap<String, PathBuf>,
    ) -> Result<WrapperOutput>;

    /// Decides whether `other_settings` (as persisted in a cached artifact) are compatible with
    /// this wrapper's currently configured settings, i.e. whether compilation can be skipped.
    /// The wrapper owns this decision because it alone knows which fields are irrelevant (output
    /// selection, paths, normalized defaults) — see spec §4.F.
    fn settings_equal(&self, other_settings: &Value) -> bool;
}

/// Builds a [`CompilerWrapper`] for a given version family. Implemented by the embedder; this
/// crate only calls through it.
pub trait WrapperFactory: Send + Sync {
    fn build(&self, family: VersionFamily, version: &str) -> Result<std::sync::Arc<dyn CompilerWrapper>>;
}
