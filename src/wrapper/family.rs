//! Version-family dispatch (spec §6.3, §9 "closed variant with one arm per supported prefix").

use crate::error::DriverError;

/// The back-end version families this driver core knows how to route to a wrapper. Adding a new
/// family is a variant extension, not a new dynamic-dispatch class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionFamily {
    V0_1,
    V0_2,
    V0_3,
    V0_4,
    V0_5,
    V0_6,
    V0_7,
    V0_8,
}

const FAMILIES: &[(&str, VersionFamily)] = &[
    ("0.1.", VersionFamily::V0_1),
    ("0.2.", VersionFamily::V0_2),
    ("0.3.", VersionFamily::V0_3),
    ("0.4.", VersionFamily::V0_4),
    ("0.5.", VersionFamily::V0_5),
    ("0.6", VersionFamily::V0_6),
    ("0.7", VersionFamily::V0_7),
    ("0.8", VersionFamily::V0_8),
];

impl VersionFamily {
    /// Matches `normalized_version` (e.g. `"0.6.12+commit.27d51765"`) by prefix against the
    /// supported families, in the order they're declared above.
    pub fn from_version(normalized_version: &str) -> Result<Self, DriverError> {
        FAMILIES
            .iter()
            .find(|(prefix, _)| normalized_version.starts_with(prefix))
            .map(|(_, family)| *family)
            .ok_or_else(|| {
                DriverError::UnsupportedVersionError(
                    // Best-effort short version for the error message; fall back to the raw
                    // string if it isn't parseable semver (e.g. a malformed pin).
                    semver::Version::parse(normalized_version.split('+').next().unwrap_or(normalized_version))
                        .unwrap_or_else(|_| semver::Version::new(0, 0, 0)),
                )
            })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VersionFamily::V0_1 => "0.1",
            VersionFamily::V0_2 => "0.2",
            VersionFamily::V0_3 => "0.3",
            VersionFamily::V0_4 => "0.4",
            VersionFamily::V0_5 => "0.5",
            VersionFamily::V0_6 => "0.6",
            VersionFamily::V0_7 => "0.7",
            VersionFamily::V0_8 => "0.8",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_known_families() {
        assert_eq!(VersionFamily::from_version("0.8.24+commit.e11b9ed9").unwrap(), VersionFamily::V0_8);
        assert_eq!(VersionFamily::from_version("0.6.12+commit.27d51765").unwrap(), VersionFamily::V0_6);
        assert_eq!(VersionFamily::from_version("0.1.7+commit.4cb486ee").unwrap(), VersionFamily::V0_1);
    }

    #[test]
    fn unknown_family_is_fatal() {
        assert!(VersionFamily::from_version("1.2.3+commit.deadbeef").is_err());
    }
}
