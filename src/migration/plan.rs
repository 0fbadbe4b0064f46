use crate::cluster::CompactionOptions;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Compaction class the tables are moved to.
pub const TWCS_CLASS: &str = "TimeWindowCompactionStrategy";

pub const METRICS_V1_TABLE: &str = "node_metrics_v1";
pub const METRICS_V2_TABLE: &str = "node_metrics_v2";
pub const OPERATIONS_TABLE: &str = "node_operations";

/// Tables moved to TWCS, in alteration order. The first entry doubles as the
/// idempotency probe.
pub const TWCS_TABLES: [TableMigrationSpec; 3] = [
    TableMigrationSpec::new(METRICS_V1_TABLE, 2, WindowUnit::Minutes),
    TableMigrationSpec::new(METRICS_V2_TABLE, 1, WindowUnit::Days),
    TableMigrationSpec::new(OPERATIONS_TABLE, 1, WindowUnit::Days),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WindowUnit {
    Minutes,
    Hours,
    Days,
}

impl WindowUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minutes => "MINUTES",
            Self::Hours => "HOURS",
            Self::Days => "DAYS",
        }
    }
}

impl fmt::Display for WindowUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target compaction window of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMigrationSpec {
    pub table: Cow<'static, str>,
    pub window_size: u32,
    pub window_unit: WindowUnit,
}

impl TableMigrationSpec {
    pub const fn new(table: &'static str, window_size: u32, window_unit: WindowUnit) -> Self {
        Self {
            table: Cow::Borrowed(table),
            window_size,
            window_unit,
        }
    }

    pub fn owned(table: impl Into<String>, window_size: u32, window_unit: WindowUnit) -> Self {
        Self {
            table: Cow::Owned(table.into()),
            window_size,
            window_unit,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// `ALTER TABLE` statement switching this table to TWCS in `keyspace`.
    pub fn alter_statement(&self, keyspace: &str) -> String {
        format!(
            "ALTER TABLE \"{}\".\"{}\" WITH compaction = {{'class': '{}', \
             'unchecked_tombstone_compaction': 'true', \
             'compaction_window_size': '{}', \
             'compaction_window_unit': '{}'}}",
            keyspace, self.table, TWCS_CLASS, self.window_size, self.window_unit
        )
    }
}

/// Whether `options` already name TWCS. Matches both the short and the
/// fully-qualified class name.
pub fn uses_twcs(options: &CompactionOptions) -> bool {
    options.class().is_some_and(|class| class.contains(TWCS_CLASS))
}
