//! The source scanner (spec §4.B).
//!
//! Extracts the version-constraint pragma and the list of import strings from a source file's
//! text. Deliberately lexical: it tolerates arbitrary comments and does not require a full parser,
//! so it works across every back-end language family without first knowing which one applies.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::version::VersionConstraint;

static PRAGMA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"pragma\s+(\w+)\s+([^;]+);"#).expect("valid regex"));

static IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"import\s*(?:\{[^}]*\}\s*from\s*|\*\s*as\s+\w+\s*from\s*)?["']([^"']+)["']\s*(?:as\s+\w+)?\s*;"#,
    )
    .expect("valid regex")
});

/// Strips `//` line comments and `/* */` block comments from `text`.
///
/// This is intentionally simple: it does not special-case string literals containing comment-like
/// sequences, matching the scanner's "deliberately lexical" mandate rather than pulling in a full
/// parser to be byte-perfect.
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if c == '/' {
            match chars.peek() {
                Some((_, '/')) => {
                    for (_, c2) in chars.by_ref() {
                        if c2 == '\n' {
                            out.push('\n');
                            break;
                        }
                    }
                    continue;
                }
                Some((_, '*')) => {
                    chars.next();
                    let mut prev = '\0';
                    for (_, c2) in chars.by_ref() {
                        if prev == '*' && c2 == '/' {
                            break;
                        }
                        prev = c2;
                    }
                    continue;
                }
                _ => {}
            }
        }
        out.push(c);
    }
    out
}

/// The result of scanning one source file.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// The intersection of every `pragma` directive found in this file (spec: multiple pragmas
    /// within one file are intersected). Empty (no constraint) if no pragma is present.
    pub version_constraint: VersionConstraint,
    /// Raw import strings, in source order, each fed back to the resolver chain.
    pub imports: Vec<String>,
}

pub fn scan(source_text: &str) -> ScanResult {
    let stripped = strip_comments(source_text);

    let mut version_constraint = VersionConstraint::empty();
    for caps in PRAGMA_RE.captures_iter(&stripped) {
        let range = caps[2].trim().to_string();
        version_constraint = version_constraint.intersect(&VersionConstraint::single(range));
    }

    let imports = IMPORT_RE.captures_iter(&stripped).map(|caps| caps[1].to_string()).collect();

    ScanResult { version_constraint, imports }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_pragma_and_imports() {
        let src = r#"
            // a comment with import "fake.sol"; that must be ignored
            pragma solidity ^0.8.0;
            /* block comment
               pragma solidity ^0.1.0; */
            import "./Lib.sol";
            import {Foo} from "@foo/bar/Foo.sol";
            import * as Bar from "./Bar.sol";

            contract A {}
        "#;
        let result = scan(src);
        assert_eq!(result.version_constraint.as_str(), "^0.8.0");
        assert_eq!(
            result.imports,
            vec!["./Lib.sol".to_string(), "@foo/bar/Foo.sol".to_string(), "./Bar.sol".to_string()]
        );
    }

    #[test]
    fn no_pragma_means_empty_constraint() {
        let result = scan(r#"import "./A.sol";"#);
        assert!(result.version_constraint.is_empty());
    }

    #[test]
    fn intersects_multiple_pragmas() {
        let src = "pragma solidity >=0.6.0;\npragma solidity <0.7.0;\n";
        let result = scan(src);
        assert_eq!(result.version_constraint.as_str(), ">=0.6.0,<0.7.0");
    }
}
