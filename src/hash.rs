//! The source-tree hasher (spec §4.C).
//!
//! Performs a deterministic depth-first traversal starting at a root file, resolving each import
//! through the spy resolver so the same walk also tells the planner which files the root depends
//! on. Each unique file (by absolute path) is hashed exactly once; the final digest is taken over
//! the per-file hashes ordered by absolute path rather than by visit order, so that reordering
//! `import` statements inside a file never changes the tree hash — only the byte content of a file
//! in the closure can.

use std::{collections::BTreeMap, path::PathBuf};

use sha2::{Digest, Sha256};

use crate::{error::Result, resolver::Resolver, scanner};

pub type Digest32 = [u8; 32];

pub(crate) fn hash_bytes(bytes: &[u8]) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Hex-encodes a digest with a leading `0x`, as stored in `ContractData::source_tree_hash_hex`.
pub fn to_hex(digest: &Digest32) -> String {
    format!("0x{}", hex::encode(digest))
}

/// Walks `root`'s transitive import closure through `resolver`, returning the tree hash.
///
/// `resolver` is expected to be a [`crate::resolver::SpyResolver`] (or anything implementing
/// [`Resolver`]) so that every resolved import is recorded as a side effect of this call.
pub fn hash_source_tree(
    root: &crate::resolver::ContractSource,
    resolver: &dyn Resolver,
) -> Result<Digest32> {
    let mut visited: BTreeMap<PathBuf, Digest32> = BTreeMap::new();
    visit(root, resolver, &mut visited)?;

    let mut hasher = Sha256::new();
    for file_hash in visited.values() {
        hasher.update(file_hash);
    }
    Ok(hasher.finalize().into())
}

fn visit(
    source: &crate::resolver::ContractSource,
    resolver: &dyn Resolver,
    visited: &mut BTreeMap<PathBuf, Digest32>,
) -> Result<()> {
    if visited.contains_key(&source.absolute_path) {
        return Ok(());
    }
    visited.insert(source.absolute_path.clone(), hash_bytes(source.source_text.as_bytes()));

    for import in scanner::scan(&source.source_text).imports {
        let imported = resolver.resolve(&import)?;
        visit(&imported, resolver, visited)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{ContractSource, Resolver};
    use std::collections::HashMap;

    struct FakeResolver {
        sources: HashMap<String, String>,
    }

    impl Resolver for FakeResolver {
        fn resolve(&self, name: &str) -> Result<ContractSource> {
            let text = self.sources.get(name).expect("test fixture").clone();
            Ok(ContractSource {
                logical_path: name.into(),
                absolute_path: PathBuf::from(name),
                source_text: text,
            })
        }
        fn get_all(&self) -> Result<Vec<ContractSource>> {
            Ok(Vec::new())
        }
    }

    fn root(resolver: &FakeResolver, name: &str) -> ContractSource {
        resolver.resolve(name).unwrap()
    }

    #[test]
    fn determinism_across_runs() {
        let resolver = FakeResolver {
            sources: HashMap::from([
                ("A.sol".to_string(), r#"import "L.sol"; contract A {}"#.to_string()),
                ("L.sol".to_string(), "library L {}".to_string()),
            ]),
        };
        let a = root(&resolver, "A.sol");
        let h1 = hash_source_tree(&a, &resolver).unwrap();
        let h2 = hash_source_tree(&a, &resolver).unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn sensitivity_to_byte_change() {
        let resolver = FakeResolver {
            sources: HashMap::from([
                ("A.sol".to_string(), r#"import "L.sol"; contract A {}"#.to_string()),
                ("L.sol".to_string(), "library L {}".to_string()),
            ]),
        };
        let a = root(&resolver, "A.sol");
        let h1 = hash_source_tree(&a, &resolver).unwrap();

        let resolver2 = FakeResolver {
            sources: HashMap::from([
                ("A.sol".to_string(), r#"import "L.sol"; contract A {}"#.to_string()),
                ("L.sol".to_string(), "library L { }".to_string()),
            ]),
        };
        let a2 = root(&resolver2, "A.sol");
        let h2 = hash_source_tree(&a2, &resolver2).unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn reordering_imports_does_not_change_hash() {
        let resolver = FakeResolver {
            sources: HashMap::from([
                (
                    "A.sol".to_string(),
                    r#"import "L1.sol"; import "L2.sol"; contract A {}"#.to_string(),
                ),
                ("L1.sol".to_string(), "library L1 {}".to_string()),
                ("L2.sol".to_string(), "library L2 {}".to_string()),
            ]),
        };
        let resolver_reordered = FakeResolver {
            sources: HashMap::from([
                (
                    "A.sol".to_string(),
                    r#"import "L2.sol"; import "L1.sol"; contract A {}"#.to_string(),
                ),
                ("L1.sol".to_string(), "library L1 {}".to_string()),
                ("L2.sol".to_string(), "library L2 {}".to_string()),
            ]),
        };
        let a = root(&resolver, "A.sol");
        let a2 = root(&resolver_reordered, "A.sol");
        let h1 = hash_source_tree(&a, &resolver).unwrap();
        let h2 = hash_source_tree(&a2, &resolver_reordered).unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn cycles_are_broken() {
        let resolver = FakeResolver {
            sources: HashMap::from([
                ("A.sol".to_string(), r#"import "B.sol"; contract A {}"#.to_string()),
                ("B.sol".to_string(), r#"import "A.sol"; contract B {}"#.to_string()),
            ]),
        };
        let a = root(&resolver, "A.sol");
        // Must terminate.
        let _ = hash_source_tree(&a, &resolver).unwrap();
    }
}
