use crate::core::{MigrationError, NodeVersion};
use std::fmt;

/// Where a contained failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// Reading the current compaction class.
    Probe,
    /// Issuing the `ALTER TABLE` statement.
    Alter,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Probe => f.write_str("probe"),
            Self::Alter => f.write_str("alter"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureDetails {
    pub stage: FailureStage,
    /// Table whose probe or alteration failed.
    pub table: String,
    pub error: MigrationError,
    /// Tables altered before the failure. They stay altered.
    pub altered: Vec<String>,
    /// Tables not attempted because the loop stopped.
    pub skipped: Vec<String>,
}

/// Result of one invocation of the migration.
///
/// Every variant is a normal return: failures while probing or altering are
/// reported here instead of as an `Err`, so a runner sequencing several
/// migrations can carry on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// The least capable node does not support TWCS; nothing was touched.
    Ineligible { lowest: NodeVersion },
    AlreadyApplied,
    Applied { tables: Vec<String> },
    /// Statements that would have been executed.
    DryRun { statements: Vec<String> },
    PartiallyFailed(FailureDetails),
}

impl MigrationOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::PartiallyFailed(_))
    }

    /// Tables whose compaction was changed by this invocation.
    pub fn altered_tables(&self) -> &[String] {
        match self {
            Self::Applied { tables } => tables,
            Self::PartiallyFailed(details) => &details.altered,
            _ => &[],
        }
    }

    /// Number of `ALTER TABLE` statements sent to the cluster, the rejected
    /// one included. Dry runs send none.
    pub fn statements_issued(&self) -> usize {
        match self {
            Self::Applied { tables } => tables.len(),
            Self::PartiallyFailed(details) if details.stage == FailureStage::Alter => details.altered.len() + 1,
            _ => 0,
        }
    }
}

impl fmt::Display for MigrationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ineligible { lowest } => {
                write!(f, "skipped: lowest node version {} does not support TWCS", lowest)
            }
            Self::AlreadyApplied => f.write_str("already applied"),
            Self::Applied { tables } => write!(f, "applied to {}", tables.join(", ")),
            Self::DryRun { statements } => write!(f, "dry run: {} statement(s)", statements.len()),
            Self::PartiallyFailed(details) => write!(
                f,
                "failed during {} of {}: {} (altered: [{}], skipped: [{}])",
                details.stage,
                details.table,
                details.error,
                details.altered.join(", "),
                details.skipped.join(", ")
            ),
        }
    }
}
