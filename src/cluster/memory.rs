use super::snapshot::TopologySnapshot;
use super::{ClusterSession, CompactionOptions, HostInfo};
use crate::core::{MigrationError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::RwLock;

lazy_static! {
    static ref ALTER_COMPACTION: Regex = Regex::new(
        r#"(?is)^\s*ALTER\s+TABLE\s+"?(\w+)"?\s*\.\s*"?(\w+)"?\s+WITH\s+compaction\s*=\s*\{(.*)\}\s*;?\s*$"#
    )
    .unwrap();
    static ref OPTION_PAIR: Regex = Regex::new(r#"'([^']*)'\s*:\s*'([^']*)'"#).unwrap();
}

/// In-process stand-in for a live cluster
///
/// Holds a host list and per-keyspace compaction options, understands the
/// `ALTER TABLE ks.table WITH compaction = {...}` statement and keeps a log of
/// every statement it was asked to execute. Alterations of a table can be made
/// to fail on purpose with [`InMemoryCluster::fail_alter`].
#[derive(Debug, Default)]
pub struct InMemoryCluster {
    state: RwLock<ClusterState>,
}

#[derive(Debug, Default)]
struct ClusterState {
    hosts: Vec<HostInfo>,
    keyspaces: BTreeMap<String, BTreeMap<String, CompactionOptions>>,
    executed: Vec<String>,
    failures: BTreeMap<String, String>,
}

impl InMemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: TopologySnapshot) -> Self {
        Self {
            state: RwLock::new(ClusterState {
                hosts: snapshot.hosts,
                keyspaces: snapshot.keyspaces,
                ..ClusterState::default()
            }),
        }
    }

    /// Add a host reporting `release_version`.
    pub fn with_host(self, address: &str, release_version: &str) -> Self {
        self.with_host_info(HostInfo::new(address, release_version))
    }

    pub fn with_host_info(mut self, host: HostInfo) -> Self {
        self.state_mut().hosts.push(host);
        self
    }

    /// Add (or replace) a table whose compaction class is `class`.
    pub fn with_table(self, keyspace: &str, table: &str, class: &str) -> Self {
        self.with_table_options(keyspace, table, CompactionOptions::with_class(class))
    }

    pub fn with_table_options(mut self, keyspace: &str, table: &str, options: CompactionOptions) -> Self {
        self.state_mut()
            .keyspaces
            .entry(keyspace.to_string())
            .or_default()
            .insert(table.to_string(), options);
        self
    }

    /// Make every later ALTER of `table` fail with `message`.
    pub fn fail_alter(&self, table: &str, message: &str) -> Result<()> {
        let mut state = self.state.write()?;
        state.failures.insert(table.to_string(), message.to_string());
        Ok(())
    }

    pub fn clear_failures(&self) -> Result<()> {
        self.state.write()?.failures.clear();
        Ok(())
    }

    /// Statements passed to `execute`, in order, including rejected ones.
    pub fn executed_statements(&self) -> Result<Vec<String>> {
        Ok(self.state.read()?.executed.clone())
    }

    pub fn snapshot(&self) -> Result<TopologySnapshot> {
        let state = self.state.read()?;
        Ok(TopologySnapshot {
            hosts: state.hosts.clone(),
            keyspaces: state.keyspaces.clone(),
        })
    }

    // Builder methods own `self`, so the lock cannot be contended or poisoned here.
    fn state_mut(&mut self) -> &mut ClusterState {
        match self.state.get_mut() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl ClusterSession for InMemoryCluster {
    fn hosts(&self) -> Result<Vec<HostInfo>> {
        Ok(self.state.read()?.hosts.clone())
    }

    fn compaction_options(&self, keyspace: &str, table: &str) -> Result<CompactionOptions> {
        let state = self.state.read()?;
        lookup_table(&state.keyspaces, keyspace, table).cloned()
    }

    fn execute(&self, statement: &str) -> Result<()> {
        let mut state = self.state.write()?;
        state.executed.push(statement.to_string());

        let captures = ALTER_COMPACTION
            .captures(statement)
            .ok_or_else(|| MigrationError::UnsupportedStatement(statement.trim().to_string()))?;
        let keyspace = &captures[1];
        let table = &captures[2];

        let options: CompactionOptions = OPTION_PAIR
            .captures_iter(&captures[3])
            .map(|pair| (pair[1].to_string(), pair[2].to_string()))
            .collect();
        if options.class().is_none() {
            return Err(MigrationError::ExecutionError(
                "Missing sub-option 'class' for the 'compaction' option".to_string(),
            ));
        }

        lookup_table(&state.keyspaces, keyspace, table)?;
        if let Some(message) = state.failures.get(table) {
            return Err(MigrationError::ExecutionError(message.clone()));
        }

        state
            .keyspaces
            .entry(keyspace.to_string())
            .or_default()
            .insert(table.to_string(), options);
        Ok(())
    }
}

fn lookup_table<'a>(
    keyspaces: &'a BTreeMap<String, BTreeMap<String, CompactionOptions>>,
    keyspace: &str,
    table: &str,
) -> Result<&'a CompactionOptions> {
    keyspaces
        .get(keyspace)
        .ok_or_else(|| MigrationError::KeyspaceNotFound(keyspace.to_string()))?
        .get(table)
        .ok_or_else(|| MigrationError::TableNotFound {
            keyspace: keyspace.to_string(),
            table: table.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const STCS: &str = "org.apache.cassandra.db.compaction.SizeTieredCompactionStrategy";

    fn cluster() -> InMemoryCluster {
        InMemoryCluster::new()
            .with_host("10.0.0.1", "3.11.4")
            .with_table("reaper_db", "node_metrics_v1", STCS)
    }

    #[test]
    fn test_hosts_and_lookup() {
        let cluster = cluster();
        assert_eq!(cluster.hosts().unwrap().len(), 1);

        let options = cluster.compaction_options("reaper_db", "node_metrics_v1").unwrap();
        assert_eq!(options.class(), Some(STCS));
    }

    #[test]
    fn test_lookup_errors() {
        let cluster = cluster();
        assert_eq!(
            cluster.compaction_options("other", "node_metrics_v1").unwrap_err(),
            MigrationError::KeyspaceNotFound("other".into())
        );
        assert!(matches!(
            cluster.compaction_options("reaper_db", "missing").unwrap_err(),
            MigrationError::TableNotFound { .. }
        ));
    }

    #[test]
    fn test_alter_replaces_compaction_options() {
        let cluster = cluster();
        cluster
            .execute(
                "ALTER TABLE \"reaper_db\".\"node_metrics_v1\" WITH compaction = {'class': 'TimeWindowCompactionStrategy', \
                 'compaction_window_size': '2', 'compaction_window_unit': 'MINUTES'}",
            )
            .unwrap();

        let options = cluster.compaction_options("reaper_db", "node_metrics_v1").unwrap();
        assert_eq!(options.class(), Some("TimeWindowCompactionStrategy"));
        assert_eq!(options.get("compaction_window_size"), Some("2"));
        assert_eq!(options.len(), 3);
        assert_eq!(cluster.executed_statements().unwrap().len(), 1);
    }

    #[test]
    fn test_alter_unqualified_or_unknown_statement_rejected() {
        let cluster = cluster();
        let err = cluster
            .execute("ALTER TABLE node_metrics_v1 WITH compaction = {'class': 'X'}")
            .unwrap_err();
        assert!(matches!(err, MigrationError::UnsupportedStatement(_)));

        let err = cluster.execute("DROP TABLE reaper_db.node_metrics_v1").unwrap_err();
        assert!(matches!(err, MigrationError::UnsupportedStatement(_)));

        // Rejected statements are still recorded.
        assert_eq!(cluster.executed_statements().unwrap().len(), 2);
    }

    #[test]
    fn test_alter_requires_class() {
        let cluster = cluster();
        let err = cluster
            .execute("ALTER TABLE reaper_db.node_metrics_v1 WITH compaction = {'compaction_window_size': '1'}")
            .unwrap_err();
        assert!(matches!(err, MigrationError::ExecutionError(_)));
    }

    #[test]
    fn test_alter_missing_table() {
        let cluster = cluster();
        let err = cluster
            .execute("ALTER TABLE reaper_db.node_operations WITH compaction = {'class': 'X'}")
            .unwrap_err();
        assert!(matches!(err, MigrationError::TableNotFound { .. }));
    }

    #[test]
    fn test_injected_failure_leaves_table_untouched() {
        let cluster = cluster();
        cluster.fail_alter("node_metrics_v1", "Operation timed out").unwrap();

        let err = cluster
            .execute("ALTER TABLE reaper_db.node_metrics_v1 WITH compaction = {'class': 'X'}")
            .unwrap_err();
        assert_eq!(err, MigrationError::ExecutionError("Operation timed out".into()));

        let options = cluster.compaction_options("reaper_db", "node_metrics_v1").unwrap();
        assert_eq!(options.class(), Some(STCS));

        cluster.clear_failures().unwrap();
        cluster
            .execute("ALTER TABLE reaper_db.node_metrics_v1 WITH compaction = {'class': 'X'}")
            .unwrap();
    }
}
