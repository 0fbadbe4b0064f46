use crate::cluster::ClusterSession;
use crate::core::{MigrationError, NodeVersion, Result, VersionRange};

/// 3.0.x patch releases that backported TWCS.
pub const TWCS_PATCH_RANGE: VersionRange =
    VersionRange::closed(NodeVersion::new(3, 0, 8), NodeVersion::new(3, 0, 99));

/// Releases shipping TWCS natively.
pub const TWCS_MODERN_RANGE: VersionRange = VersionRange::at_least(NodeVersion::new(3, 8, 0));

pub fn supports_twcs(version: &NodeVersion) -> bool {
    TWCS_PATCH_RANGE.contains(version) || TWCS_MODERN_RANGE.contains(version)
}

/// Lowest of `versions`; `NoNodesAvailable` if there are none.
pub fn minimum_version<'a, I>(versions: I) -> Result<&'a NodeVersion>
where
    I: IntoIterator<Item = &'a NodeVersion>,
{
    versions
        .into_iter()
        .min()
        .ok_or(MigrationError::NoNodesAvailable)
}

/// True iff the least capable node of the cluster supports TWCS.
pub fn is_version_eligible<'a, I>(versions: I) -> Result<bool>
where
    I: IntoIterator<Item = &'a NodeVersion>,
{
    minimum_version(versions).map(supports_twcs)
}

/// Lowest release version across every host the session knows about.
pub fn lowest_node_version<S: ClusterSession + ?Sized>(session: &S) -> Result<NodeVersion> {
    let versions = session
        .hosts()?
        .into_iter()
        .map(|host| match host.version() {
            Some(version) => version,
            None => Err(MigrationError::VersionUnavailable { host: host.address }),
        })
        .collect::<Result<Vec<_>>>()?;

    minimum_version(&versions).cloned()
}
