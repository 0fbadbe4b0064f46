// ============================================================================
// twcs-migrate Library
// ============================================================================

pub mod cluster;
pub mod core;
pub mod migration;

// Re-export main types for convenience
pub use cluster::{
    ClusterSession, CompactionOptions, HostInfo,
    memory::InMemoryCluster,
    snapshot::{SnapshotStore, TopologySnapshot},
};
pub use crate::core::{MigrationError, NodeVersion, Result, VersionRange};
pub use migration::{
    Migration019, migrate,
    config::{DEFAULT_KEYSPACE, MigrationConfig, ProbePolicy, normalize_keyspace},
    gate::{TWCS_MODERN_RANGE, TWCS_PATCH_RANGE, is_version_eligible, lowest_node_version},
    log::{LogEvent, LogLevel, MigrationLog, RecordingLog, TracingLog},
    migrator::CompactionMigrator,
    outcome::{FailureDetails, FailureStage, MigrationOutcome},
    plan::{TWCS_CLASS, TWCS_TABLES, TableMigrationSpec, WindowUnit},
};
