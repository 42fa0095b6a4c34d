//! The `CompilationUnit`-building half of the JSON driver (spec §6.5, §9 decision (b)).
//!
//! Unlike [`crate::planner::BuildPlanner`], this driver never walks an import closure: a
//! standard-JSON bundle already embeds every source it needs, so its only job is to intersect the
//! version constraint across *all* of the bundle's files (not just one root) and hand the bundle
//! straight to the version selector and dispatcher as a single unit.

use std::{collections::BTreeMap, path::PathBuf};

use crate::{
    error::Result,
    model::CompilationUnit,
    planner::intersect_bundle_constraints,
    version::VersionSelector,
};

/// A pre-parsed standard-JSON compilation bundle: absolute path -> embedded source text.
#[derive(Debug, Clone, Default)]
pub struct StandardJsonBundle {
    pub sources: BTreeMap<PathBuf, String>,
}

/// Selects the back-end version for `bundle` (constraints intersected across every file in it)
/// and returns it alongside the bundle's sources as a ready-to-dispatch [`CompilationUnit`].
pub fn build_unit(bundle: StandardJsonBundle, version_selector: &VersionSelector) -> Result<(String, CompilationUnit)> {
    let constraint = intersect_bundle_constraints(bundle.sources.values().map(String::as_str));

    // Any file in the bundle is an equally valid anchor for the "which file failed to satisfy
    // this constraint" error message; the first (by path order, since `sources` is a `BTreeMap`)
    // is as good as any other.
    let anchor = bundle
        .sources
        .keys()
        .next()
        .cloned()
        .unwrap_or_else(|| PathBuf::from("<empty bundle>"));

    let version = version_selector.select(&anchor, &constraint)?;
    Ok((version, bundle.sources))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::ReleaseIndex;

    fn index(pairs: &[(&str, &str)]) -> ReleaseIndex {
        ReleaseIndex { releases: pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect() }
    }

    #[test]
    fn intersects_across_every_file_in_the_bundle() {
        let mut sources = BTreeMap::new();
        sources.insert(PathBuf::from("A.sol"), "pragma solidity >=0.6.0;".to_string());
        sources.insert(PathBuf::from("B.sol"), "pragma solidity <0.7.0;".to_string());
        let bundle = StandardJsonBundle { sources };

        let idx = index(&[("0.6.12", "0.6.12+commit.27d51765"), ("0.7.0", "0.7.0+commit.9e61f92b")]);
        let selector = VersionSelector::new(idx, None);

        let (version, unit) = build_unit(bundle, &selector).unwrap();
        assert_eq!(version, "0.6.12+commit.27d51765");
        assert_eq!(unit.len(), 2);
    }
}
