use super::{MigrationError, Result};
use semver::{BuildMetadata, Prerelease, Version};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Release version reported by a cluster node.
///
/// Wraps a [`semver::Version`] plus the optional fourth component DSE builds
/// carry (`4.0.0.2284`). Ordering is numeric on major, minor, patch, then the
/// DSE patch (present sorts above absent), then semver pre-release precedence
/// (`3.11.4-SNAPSHOT` sorts before `3.11.4`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeVersion {
    version: Version,
    dse_patch: Option<u64>,
}

impl NodeVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            version: Version::new(major, minor, patch),
            dse_patch: None,
        }
    }

    /// Parse a release string such as `3.0.9`, `3.11`, `4.0.0.2284` or `3.11.4-SNAPSHOT`.
    ///
    /// A missing patch component is read as `0`; `+build` metadata is dropped.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let invalid = |reason: &dyn fmt::Display| MigrationError::InvalidVersion(format!("'{}': {}", raw, reason));

        let without_build = trimmed.split('+').next().unwrap_or_default();
        let (numeric, pre_release) = match without_build.split_once('-') {
            Some((numeric, label)) => (numeric, Some(label)),
            None => (without_build, None),
        };

        let parts: Vec<&str> = numeric.split('.').collect();
        let (core, dse_patch) = match parts.as_slice() {
            [major, minor] => (format!("{}.{}.0", major, minor), None),
            [major, minor, patch] => (format!("{}.{}.{}", major, minor, patch), None),
            [major, minor, patch, dse] => {
                let dse = dse.parse::<u64>().map_err(|e| invalid(&e))?;
                (format!("{}.{}.{}", major, minor, patch), Some(dse))
            }
            _ => return Err(invalid(&"expected 2 to 4 numeric components")),
        };

        let mut version = Version::parse(&core).map_err(|e| invalid(&e))?;
        if let Some(label) = pre_release {
            if label.is_empty() {
                return Err(invalid(&"empty pre-release label"));
            }
            version.pre = Prerelease::new(label).map_err(|e| invalid(&e))?;
        }
        version.build = BuildMetadata::EMPTY;

        Ok(Self { version, dse_patch })
    }

    pub fn major(&self) -> u64 {
        self.version.major
    }

    pub fn minor(&self) -> u64 {
        self.version.minor
    }

    pub fn patch(&self) -> u64 {
        self.version.patch
    }

    pub fn dse_patch(&self) -> Option<u64> {
        self.dse_patch
    }

    pub fn pre_release(&self) -> Option<&str> {
        (!self.version.pre.is_empty()).then(|| self.version.pre.as_str())
    }
}

impl FromStr for NodeVersion {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Ord for NodeVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major()
            .cmp(&other.major())
            .then(self.minor().cmp(&other.minor()))
            .then(self.patch().cmp(&other.patch()))
            .then(self.dse_patch.cmp(&other.dse_patch))
            .then_with(|| self.version.pre.cmp(&other.version.pre))
    }
}

impl PartialOrd for NodeVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for NodeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.patch())?;
        if let Some(dse) = self.dse_patch {
            write!(f, ".{}", dse)?;
        }
        if let Some(label) = self.pre_release() {
            write!(f, "-{}", label)?;
        }
        Ok(())
    }
}

/// Inclusive version interval; `upper == None` is open ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    pub lower: NodeVersion,
    pub upper: Option<NodeVersion>,
}

impl VersionRange {
    pub const fn closed(lower: NodeVersion, upper: NodeVersion) -> Self {
        Self {
            lower,
            upper: Some(upper),
        }
    }

    pub const fn at_least(lower: NodeVersion) -> Self {
        Self { lower, upper: None }
    }

    pub fn contains(&self, version: &NodeVersion) -> bool {
        if *version < self.lower {
            return false;
        }
        match &self.upper {
            Some(upper) => version <= upper,
            None => true,
        }
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.upper {
            Some(upper) => write!(f, "[{}, {}]", self.lower, upper),
            None => write!(f, ">= {}", self.lower),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(raw: &str) -> NodeVersion {
        NodeVersion::parse(raw).unwrap()
    }

    #[test]
    fn test_parse_three_part() {
        assert_eq!(v("3.0.9"), NodeVersion::new(3, 0, 9));
        assert_eq!(v(" 3.11.4 "), NodeVersion::new(3, 11, 4));
    }

    #[test]
    fn test_parse_missing_patch_is_zero() {
        assert_eq!(v("3.8"), NodeVersion::new(3, 8, 0));
    }

    #[test]
    fn test_parse_dse_fourth_component() {
        let dse = v("4.0.0.2284");
        assert_eq!(dse.patch(), 0);
        assert_eq!(dse.dse_patch(), Some(2284));
        assert_eq!(dse.to_string(), "4.0.0.2284");
    }

    #[test]
    fn test_dse_patch_sorts_above_plain_release() {
        assert!(v("3.0.99.1") > v("3.0.99"));
        assert!(v("3.0.99.1") < v("3.0.100"));
        assert!(v("4.0.0.10") > v("4.0.0.9"));
    }

    #[test]
    fn test_parse_pre_release_and_build() {
        let snapshot = v("3.11.4-SNAPSHOT");
        assert_eq!(snapshot.pre_release(), Some("SNAPSHOT"));
        assert_eq!(v("3.11.4+build7"), NodeVersion::new(3, 11, 4));
        assert_eq!(v("3.11.4").pre_release(), None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(NodeVersion::parse("").is_err());
        assert!(NodeVersion::parse("3").is_err());
        assert!(NodeVersion::parse("3.x.1").is_err());
        assert!(NodeVersion::parse("3.0.1-").is_err());
        assert!(NodeVersion::parse("3.0.1.x").is_err());
        assert!(NodeVersion::parse("1.2.3.4.5").is_err());
    }

    #[test]
    fn test_numeric_not_lexicographic() {
        assert!(v("3.0.10") > v("3.0.9"));
        assert!(v("3.11.0") > v("3.8.0"));
    }

    #[test]
    fn test_pre_release_precedence() {
        assert!(v("3.8.0-beta1") < v("3.8.0"));
        assert!(v("3.8.0-beta1") > v("3.7.9"));
        assert!(v("3.8.0-beta.10") > v("3.8.0-beta.9"));
    }

    #[test]
    fn test_display() {
        assert_eq!(v("3.8").to_string(), "3.8.0");
        assert_eq!(v("4.0.0-rc1").to_string(), "4.0.0-rc1");
    }

    #[test]
    fn test_range_bounds_inclusive() {
        let range = VersionRange::closed(NodeVersion::new(3, 0, 8), NodeVersion::new(3, 0, 99));
        assert!(range.contains(&v("3.0.8")));
        assert!(range.contains(&v("3.0.99")));
        assert!(!range.contains(&v("3.0.99.1")));
        assert!(!range.contains(&v("3.0.7")));
        assert!(!range.contains(&v("3.0.100")));
        assert!(!range.contains(&v("3.1.0")));
    }

    #[test]
    fn test_open_range() {
        let range = VersionRange::at_least(NodeVersion::new(3, 8, 0));
        assert!(range.contains(&v("3.8")));
        assert!(range.contains(&v("5.0.2")));
        assert!(!range.contains(&v("3.7.9")));
        assert_eq!(range.to_string(), ">= 3.8.0");
    }
}
