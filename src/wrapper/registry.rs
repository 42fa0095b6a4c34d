//! Per-driver lazy wrapper registry (spec §5 "per-driver lazy-initialized map" and §9).

use std::{collections::HashMap, sync::Arc};

use super::{CompilerWrapper, VersionFamily, WrapperFactory};
use crate::error::Result;

/// Owns one [`CompilerWrapper`] instance per normalized version, created on first use. Not shared
/// across drivers — no process-wide mutable state.
pub struct WrapperRegistry {
    factory: Box<dyn WrapperFactory>,
    instances: HashMap<String, Arc<dyn CompilerWrapper>>,
}

impl WrapperRegistry {
    pub fn new(factory: Box<dyn WrapperFactory>) -> Self {
        Self { factory, instances: HashMap::new() }
    }

    /// Returns the wrapper for `version`, building (and caching) it on first use. Insertion is
    /// idempotent: a concurrent caller asking for the same version gets the same instance because
    /// the registry is owned, not shared, by the single-threaded planner/dispatcher sequencing.
    pub fn get_or_build(&mut self, version: &str) -> Result<Arc<dyn CompilerWrapper>> {
        if let Some(existing) = self.instances.get(version) {
            return Ok(existing.clone());
        }
        let family = VersionFamily::from_version(version)?;
        let wrapper = self.factory.build(family, version)?;
        self.instances.insert(version.to_string(), wrapper.clone());
        Ok(wrapper)
    }
}
