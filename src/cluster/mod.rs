pub mod memory;
pub mod snapshot;

use crate::core::{NodeVersion, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cluster session handle
///
/// The slice of a driver session the migration needs: topology, schema
/// introspection and statement execution. Implement it over a real driver
/// session in production; `InMemoryCluster` implements it for tests and
/// offline runs.
pub trait ClusterSession {
    /// Every node currently known to the cluster metadata.
    fn hosts(&self) -> Result<Vec<HostInfo>>;

    /// Compaction options of `keyspace.table` as reported by schema metadata.
    ///
    /// Fails with `KeyspaceNotFound` / `TableNotFound` when the table is unknown.
    fn compaction_options(&self, keyspace: &str, table: &str) -> Result<CompactionOptions>;

    /// Execute a schema statement, blocking until the cluster answers.
    fn execute(&self, statement: &str) -> Result<()>;
}

/// A cluster member and the release version it advertises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfo {
    pub address: String,
    /// `None` when the node has not (yet) reported its version.
    #[serde(default)]
    pub release_version: Option<String>,
}

impl HostInfo {
    pub fn new(address: impl Into<String>, release_version: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            release_version: Some(release_version.into()),
        }
    }

    pub fn without_version(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            release_version: None,
        }
    }

    /// Parsed release version, or `None` if the node does not report one.
    pub fn version(&self) -> Option<Result<NodeVersion>> {
        self.release_version.as_deref().map(NodeVersion::parse)
    }
}

/// Compaction sub-options of a table (`{'class': ..., ...}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompactionOptions(BTreeMap<String, String>);

impl CompactionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options holding only a compaction class.
    pub fn with_class(class: impl Into<String>) -> Self {
        let mut options = Self::new();
        options.insert("class", class);
        options
    }

    pub fn class(&self) -> Option<&str> {
        self.get("class")
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for CompactionOptions {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
