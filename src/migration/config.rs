use super::plan::{TWCS_TABLES, TableMigrationSpec};
use crate::core::{MigrationError, Result};
use std::collections::HashSet;

/// Keyspace the repair scheduler stores its tables in by default.
pub const DEFAULT_KEYSPACE: &str = "reaper_db";

/// How the migrator decides that the alteration already ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProbePolicy {
    /// Inspect only the first table of the plan and treat its state as the
    /// state of the whole plan.
    #[default]
    FirstTable,
    /// Inspect every table and alter only those not on TWCS yet. Stricter
    /// than `FirstTable`: a plan that was interrupted halfway gets completed.
    EveryTable,
}

/// Migration configuration
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Keyspace holding the tables
    pub keyspace: String,

    /// Idempotency probe strategy
    pub probe_policy: ProbePolicy,

    /// Log the statements instead of executing them
    pub dry_run: bool,

    /// Tables to alter, in order
    pub tables: Vec<TableMigrationSpec>,
}

impl MigrationConfig {
    pub fn new(keyspace: &str) -> Self {
        Self {
            keyspace: keyspace.to_string(),
            probe_policy: ProbePolicy::default(),
            dry_run: false,
            tables: TWCS_TABLES.to_vec(),
        }
    }

    pub fn keyspace(mut self, keyspace: &str) -> Self {
        self.keyspace = keyspace.to_string();
        self
    }

    pub fn probe_policy(mut self, policy: ProbePolicy) -> Self {
        self.probe_policy = policy;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Replace the table plan.
    pub fn tables(mut self, tables: Vec<TableMigrationSpec>) -> Self {
        self.tables = tables;
        self
    }

    /// Check the table plan. The keyspace is checked when the migration runs,
    /// see [`normalize_keyspace`].
    pub fn validate(&self) -> Result<()> {
        if self.tables.is_empty() {
            return Err(MigrationError::ConfigError("Table plan cannot be empty".to_string()));
        }

        let mut seen = HashSet::new();
        for spec in &self.tables {
            if !is_identifier(spec.table()) {
                return Err(MigrationError::ConfigError(format!(
                    "Invalid table name '{}'",
                    spec.table()
                )));
            }
            if spec.window_size == 0 {
                return Err(MigrationError::ConfigError(format!(
                    "compaction_window_size of '{}' must be > 0",
                    spec.table()
                )));
            }
            if !seen.insert(spec.table()) {
                return Err(MigrationError::ConfigError(format!(
                    "Table '{}' listed twice",
                    spec.table()
                )));
            }
        }

        Ok(())
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self::new(DEFAULT_KEYSPACE)
    }
}

/// Fold an unquoted keyspace name the way CQL does: lowercase it.
///
/// Names that are not plain identifiers cannot name a keyspace unquoted and
/// are rejected with `ConfigError`.
pub fn normalize_keyspace(keyspace: &str) -> Result<String> {
    if !is_identifier(keyspace) {
        return Err(MigrationError::ConfigError(format!(
            "Keyspace name '{}' must be 1-48 alphanumeric or underscore characters",
            keyspace
        )));
    }
    Ok(keyspace.to_ascii_lowercase())
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 48
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
