//! The concurrent dispatcher (spec §4.G).

use std::collections::HashMap;

use crate::{
    error::Result,
    model::{CompilationPlan, ImportRemappings},
    wrapper::{WrapperOutput, WrapperRegistry},
};

/// The result of one back-end invocation, tagged with where it came from in the plan.
pub struct DispatchedUnit {
    pub version: String,
    pub unit_index: usize,
    pub output: WrapperOutput,
}

/// Invokes every unit in `plan` concurrently: across versions and, within a version, across units
/// (spec §4.G). A fatal error from any invocation fails the whole dispatch; in-flight invocations
/// are still allowed to finish (their results are simply discarded), matching the cancellation
/// policy in spec §5.
pub async fn dispatch(
    plan: &CompilationPlan,
    remappings: &ImportRemappings,
    wrappers: &mut WrapperRegistry,
) -> Result<Vec<DispatchedUnit>> {
    let mut built = HashMap::new();
    for version in plan.versions() {
        if !built.contains_key(version) {
            built.insert(version.to_string(), wrappers.get_or_build(version)?);
        }
    }

    let mut calls = Vec::new();
    for version in plan.versions() {
        for (unit_index, unit) in plan.units_for(version).iter().enumerate() {
            let wrapper = built[version].clone();
            let version = version.to_string();
            let unit_size = unit.len();
            calls.push(async move {
                let outcome = wrapper.compile(unit, remappings).await;
                (version, unit_index, unit_size, outcome)
            });
        }
    }

    let results = futures::future::join_all(calls).await;

    let mut dispatched = Vec::with_capacity(results.len());
    for (version, unit_index, unit_size, outcome) in results {
        let output = outcome?;
        debug!(version = %version, unit_index, unit_size, "dispatcher: invocation complete");
        dispatched.push(DispatchedUnit { version, unit_index, output });
    }
    Ok(dispatched)
}
