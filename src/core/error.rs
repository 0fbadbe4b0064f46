use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MigrationError {
    #[error("No nodes available: cluster metadata reports no hosts")]
    NoNodesAvailable,

    #[error("Host '{host}' does not report a release version")]
    VersionUnavailable { host: String },

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Keyspace '{0}' not found")]
    KeyspaceNotFound(String),

    #[error("Table '{table}' not found in keyspace '{keyspace}'")]
    TableNotFound { keyspace: String, table: String },

    #[error("Table '{0}' has no compaction class configured")]
    MissingCompactionClass(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("Unsupported statement: {0}")]
    UnsupportedStatement(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

impl MigrationError {
    /// Errors that mean the cluster could not be inspected at all.
    ///
    /// These are propagated to the caller; everything else is contained by
    /// the migrator and reported through its outcome.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NoNodesAvailable | Self::VersionUnavailable { .. } | Self::InvalidVersion(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MigrationError>;

impl<T> From<std::sync::PoisonError<T>> for MigrationError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<std::io::Error> for MigrationError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}
