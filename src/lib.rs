//! Core of a build driver for a family of versioned source-to-bytecode smart-contract compilers.
//!
//! Given a set of source files in a project directory, this crate resolves each target plus its
//! transitive import closure, determines which back-end compiler version to invoke per file from
//! in-source version pragmas, groups files into compilation units, decides which units actually
//! need rebuilding via a content-addressed source-tree hash, and emits one artifact per contract —
//! preferring, among redundant compilations of the same file, the one with the smallest unit.
//!
//! Out of scope for this crate: CLI argument parsing, concrete compiler adapters (modeled only as
//! the [`wrapper::CompilerWrapper`] capability), and back-end binary management. Embedders supply a
//! [`wrapper::WrapperFactory`] and a [`version::ReleaseIndexSource`] and drive the pipeline through
//! [`Driver`].

#[macro_use]
extern crate tracing;

pub mod artifact;
pub mod cache_gate;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod hash;
pub mod json_driver;
pub mod model;
pub mod planner;
pub mod resolver;
pub mod scanner;
pub mod utils;
pub mod version;
pub mod watch;
pub mod wrapper;

use std::{collections::HashMap, path::PathBuf};

use serde_json::Value;

use crate::{
    artifact::ArtifactWriter,
    config::DriverConfig,
    error::Result,
    model::{CompilationPlan, CompilationUnit},
    planner::{BuildPlanner, PlanInput},
    resolver::FallthroughResolver,
    version::{ReleaseIndexSource, VersionSelector},
    wrapper::{WrapperFactory, WrapperRegistry},
};

/// Ties the resolver chain, version selector, build planner, dispatcher, and artifact writer into
/// the single entry point described in spec §1/§5.
pub struct Driver {
    config: DriverConfig,
    resolver: FallthroughResolver,
    wrappers: WrapperRegistry,
    release_index_source: Box<dyn ReleaseIndexSource>,
    compiler_name: String,
    last_planned_paths: Vec<PathBuf>,
}

impl Driver {
    pub fn new(
        config: DriverConfig,
        registry_root: Option<PathBuf>,
        release_index_source: Box<dyn ReleaseIndexSource>,
        wrapper_factory: Box<dyn WrapperFactory>,
        compiler_name: impl Into<String>,
    ) -> Self {
        let resolver = FallthroughResolver::standard(config.contracts_dir.clone(), registry_root);
        Self {
            config,
            resolver,
            wrappers: WrapperRegistry::new(wrapper_factory),
            release_index_source,
            compiler_name: compiler_name.into(),
            last_planned_paths: Vec::new(),
        }
    }

    /// Runs the full pipeline once — plan, dispatch, write — and returns the absolute paths of
    /// every artifact written. An empty plan (everything was up to date) is not an error.
    pub async fn run_once(&mut self) -> Result<Vec<PathBuf>> {
        let release_index = self.release_index_source.load()?;
        let pin = self.config.solc_version.clone();
        let version_selector = VersionSelector::new(release_index, pin);

        let plan_result = BuildPlanner::plan(PlanInput {
            config: &self.config,
            resolver: &self.resolver,
            version_selector: &version_selector,
            wrappers: &mut self.wrappers,
        })?;

        self.last_planned_paths = plan_result.contract_data.keys().cloned().collect();

        if plan_result.plan.is_empty() {
            debug!(skipped = plan_result.skipped.len(), "nothing to rebuild this run");
            return Ok(Vec::new());
        }

        let dispatched =
            dispatcher::dispatch(&plan_result.plan, &plan_result.remappings, &mut self.wrappers).await?;

        let units_by_version = Self::units_by_version(&plan_result.plan);
        let mut writer = ArtifactWriter::new(
            self.config.artifacts_dir.clone(),
            self.compiler_name.clone(),
            self.config.compiler_settings.clone().unwrap_or(Value::Null),
            self.config.should_save_standard_input,
        );
        writer.write_all(&dispatched, &units_by_version, &plan_result.contract_data)
    }

    /// The absolute paths touched by the most recent [`Self::run_once`] call — the watch-mode
    /// primitive named in spec §5/§9 ("list of absolute paths last planned").
    pub fn last_planned_paths(&self) -> &[PathBuf] {
        &self.last_planned_paths
    }

    fn units_by_version(plan: &CompilationPlan) -> HashMap<String, Vec<CompilationUnit>> {
        plan.versions().map(|version| (version.to_string(), plan.units_for(version).to_vec())).collect()
    }
}
