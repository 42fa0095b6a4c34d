//! Manual timing harness for the build planner over a project with many independent contracts.
//! `harness = false`: this is a plain binary, not a `criterion`-style benchmark, since the only
//! thing worth timing here is pure in-process planning (resolver + scanner + hasher), not an
//! external compiler invocation.

use std::{path::PathBuf, time::Instant};

use sc_build_core::{
    config::{ContractSelector, DriverConfig},
    planner::{BuildPlanner, PlanInput},
    resolver::FallthroughResolver,
    version::{ReleaseIndex, VersionSelector},
    wrapper::{VersionFamily, WrapperFactory, WrapperRegistry},
};

const CONTRACT_COUNT: usize = 500;

struct UnreachableWrapperFactory;

impl WrapperFactory for UnreachableWrapperFactory {
    fn build(
        &self,
        _family: VersionFamily,
        _version: &str,
    ) -> sc_build_core::error::Result<std::sync::Arc<dyn sc_build_core::wrapper::CompilerWrapper>> {
        unreachable!("planning never needs to build a wrapper unless a cached artifact exists")
    }
}

fn write_fixture(contracts_dir: &PathBuf) {
    std::fs::create_dir_all(contracts_dir).unwrap();
    for i in 0..CONTRACT_COUNT {
        let body = format!("pragma solidity ^0.8.0;\ncontract C{i} {{}}\n");
        std::fs::write(contracts_dir.join(format!("C{i}.sol")), body).unwrap();
    }
}

fn main() {
    let project = tempfile::tempdir().unwrap();
    let contracts_dir = project.path().join("contracts");
    let artifacts_dir = project.path().join("artifacts");
    write_fixture(&contracts_dir);

    let config = DriverConfig::builder()
        .contracts_dir(contracts_dir.clone())
        .artifacts_dir(artifacts_dir)
        .contracts(ContractSelector::default())
        .build()
        .unwrap();

    let resolver = FallthroughResolver::standard(contracts_dir, None);
    let index =
        ReleaseIndex { releases: [("0.8.0".to_string(), "0.8.0+commit.c7dfd78e".to_string())].into() };
    let version_selector = VersionSelector::new(index, None);
    let mut wrappers = WrapperRegistry::new(Box::new(UnreachableWrapperFactory));

    let started = Instant::now();
    let result = BuildPlanner::plan(PlanInput {
        config: &config,
        resolver: &resolver,
        version_selector: &version_selector,
        wrappers: &mut wrappers,
    })
    .unwrap();
    let elapsed = started.elapsed();

    println!(
        "planned {} contracts ({} units) in {:?}",
        result.contract_data.len(),
        result.plan.versions().count(),
        elapsed
    );
}
