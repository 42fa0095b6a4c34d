//! The spy resolver (spec §4.A, §9 "explicit walker").
//!
//! Wraps any [`Resolver`] and records every [`ContractSource`] it yields during a planning walk.
//! The source-tree hasher drives all import resolution through a fresh spy per root, so the same
//! traversal both computes the tree hash and tells the planner which files the root depends on.

use std::{cell::RefCell, path::PathBuf};

use super::{ContractSource, Resolver};
use crate::error::Result;

pub struct SpyResolver<'r> {
    inner: &'r dyn Resolver,
    visited: RefCell<Vec<ContractSource>>,
}

impl<'r> SpyResolver<'r> {
    pub fn new(inner: &'r dyn Resolver) -> Self {
        Self { inner, visited: RefCell::new(Vec::new()) }
    }

    /// Consumes the spy, returning every source resolved through it, in resolution order.
    pub fn into_recorded(self) -> Vec<ContractSource> {
        self.visited.into_inner()
    }

    /// Every absolute path resolved through this spy so far, without consuming it.
    pub fn recorded_paths(&self) -> Vec<PathBuf> {
        self.visited.borrow().iter().map(|s| s.absolute_path.clone()).collect()
    }
}

impl<'r> Resolver for SpyResolver<'r> {
    fn resolve(&self, name: &str) -> Result<ContractSource> {
        let source = self.inner.resolve(name)?;
        self.visited.borrow_mut().push(source.clone());
        Ok(source)
    }

    fn get_all(&self) -> Result<Vec<ContractSource>> {
        self.inner.get_all()
    }
}
