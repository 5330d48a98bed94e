//! Semantic version numbers for document versions.

use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{ChangeType, TypesError};

/// `major.minor.patch` triple. Pre-release and build metadata are never set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionNumber(Version);

impl VersionNumber {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(Version::new(major, minor, patch))
    }

    /// Version assigned to the first version of a document.
    pub fn initial() -> Self {
        Self::new(1, 0, 0)
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    pub fn patch(&self) -> u64 {
        self.0.patch
    }

    /// Apply the increment rule for `change_type`.
    pub fn bump(&self, change_type: ChangeType) -> Self {
        let v = &self.0;
        match change_type {
            ChangeType::Major => Self::new(v.major + 1, 0, 0),
            ChangeType::Minor => Self::new(v.major, v.minor + 1, 0),
            ChangeType::Patch | ChangeType::Emergency => Self::new(v.major, v.minor, v.patch + 1),
        }
    }
}

impl Default for VersionNumber {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VersionNumber {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let version =
            Version::parse(s.trim()).map_err(|e| TypesError::InvalidVersion(e.to_string()))?;
        if !version.pre.is_empty() || !version.build.is_empty() {
            return Err(TypesError::InvalidVersion(format!(
                "`{s}` carries pre-release or build metadata"
            )));
        }
        Ok(Self(version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn bump_rules() {
        let v = VersionNumber::new(1, 2, 3);
        assert_eq!(v.bump(ChangeType::Major).to_string(), "2.0.0");
        assert_eq!(v.bump(ChangeType::Minor).to_string(), "1.3.0");
        assert_eq!(v.bump(ChangeType::Patch).to_string(), "1.2.4");
        assert_eq!(v.bump(ChangeType::Emergency).to_string(), "1.2.4");
    }

    #[test]
    fn ordering_is_numeric_not_lexical() {
        assert!(VersionNumber::new(1, 10, 0) > VersionNumber::new(1, 9, 0));
        assert!(VersionNumber::new(2, 0, 0) > VersionNumber::new(1, 99, 99));
    }

    #[test]
    fn parse_rejects_prerelease() {
        assert_eq!("1.1.0".parse::<VersionNumber>().unwrap(), VersionNumber::new(1, 1, 0));
        assert!("1.1.0-rc.1".parse::<VersionNumber>().is_err());
        assert!("one".parse::<VersionNumber>().is_err());
    }

    fn change_type() -> impl Strategy<Value = ChangeType> {
        prop_oneof![
            Just(ChangeType::Major),
            Just(ChangeType::Minor),
            Just(ChangeType::Patch),
            Just(ChangeType::Emergency),
        ]
    }

    proptest! {
        #[test]
        fn repeated_bumps_strictly_increase(changes in proptest::collection::vec(change_type(), 1..64)) {
            let mut current = VersionNumber::initial();
            for change in changes {
                let next = current.bump(change);
                prop_assert!(next > current, "{} -> {}", current, next);
                current = next;
            }
        }
    }
}
