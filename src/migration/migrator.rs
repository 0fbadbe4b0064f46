use super::config::{MigrationConfig, ProbePolicy, normalize_keyspace};
use super::log::{LogEvent, MigrationLog, TracingLog};
use super::outcome::{FailureDetails, FailureStage, MigrationOutcome};
use super::plan::{TableMigrationSpec, uses_twcs};
use crate::cluster::ClusterSession;
use crate::core::{MigrationError, Result};
use std::sync::Arc;

/// Moves the configured tables to TimeWindowCompactionStrategy.
///
/// Run it only once the version gate has passed. Probe and alteration errors
/// never escape [`CompactionMigrator::migrate`]; they are logged and returned
/// as [`MigrationOutcome::PartiallyFailed`].
pub struct CompactionMigrator {
    config: MigrationConfig,
    log: Arc<dyn MigrationLog>,
}

impl CompactionMigrator {
    pub fn new(config: MigrationConfig) -> Self {
        Self {
            config,
            log: Arc::new(TracingLog),
        }
    }

    pub fn with_log(mut self, log: Arc<dyn MigrationLog>) -> Self {
        self.log = log;
        self
    }

    /// `keyspace` is folded to lowercase before use; a name that is not a
    /// plain identifier fails at the probe stage like a missing keyspace.
    pub fn migrate<S: ClusterSession + ?Sized>(&self, session: &S, keyspace: &str) -> MigrationOutcome {
        let keyspace = match normalize_keyspace(keyspace) {
            Ok(keyspace) => keyspace,
            Err(error) => {
                let table = self.config.tables.first().map(|s| s.table().to_string()).unwrap_or_default();
                self.log.error(
                    LogEvent::new("Failed reading compaction settings of metrics tables")
                        .keyspace(keyspace)
                        .table(&table)
                        .error(&error),
                );
                return MigrationOutcome::PartiallyFailed(FailureDetails {
                    stage: FailureStage::Probe,
                    table,
                    error,
                    altered: Vec::new(),
                    skipped: self.config.tables.iter().map(|s| s.table().to_string()).collect(),
                });
            }
        };
        let keyspace = keyspace.as_str();

        let pending = match self.probe(session, keyspace) {
            Ok(pending) => pending,
            Err(failure) => {
                self.log.error(
                    LogEvent::new("Failed reading compaction settings of metrics tables")
                        .keyspace(keyspace)
                        .table(&failure.table)
                        .error(&failure.error),
                );
                return MigrationOutcome::PartiallyFailed(failure);
            }
        };

        if pending.is_empty() {
            self.log.info(
                LogEvent::new("Metrics tables already use TWCS, nothing to alter").keyspace(keyspace),
            );
            return MigrationOutcome::AlreadyApplied;
        }

        if self.config.dry_run {
            let statements = pending
                .iter()
                .map(|spec| {
                    let statement = spec.alter_statement(keyspace);
                    self.log.info(
                        LogEvent::new(format!("Dry run, would execute: {}", statement))
                            .keyspace(keyspace)
                            .table(spec.table()),
                    );
                    statement
                })
                .collect();
            return MigrationOutcome::DryRun { statements };
        }

        self.alter_all(session, keyspace, &pending)
    }

    /// Specs still to alter; empty when the migration already ran.
    fn probe<S: ClusterSession + ?Sized>(
        &self,
        session: &S,
        keyspace: &str,
    ) -> std::result::Result<Vec<&TableMigrationSpec>, FailureDetails> {
        let probe_failure = |spec: &TableMigrationSpec, error: MigrationError| FailureDetails {
            stage: FailureStage::Probe,
            table: spec.table().to_string(),
            error,
            altered: Vec::new(),
            skipped: self.config.tables.iter().map(|s| s.table().to_string()).collect(),
        };

        match self.config.probe_policy {
            ProbePolicy::FirstTable => {
                let Some(first) = self.config.tables.first() else {
                    return Ok(Vec::new());
                };
                match is_on_twcs(session, keyspace, first) {
                    Ok(true) => Ok(Vec::new()),
                    Ok(false) => Ok(self.config.tables.iter().collect()),
                    Err(error) => Err(probe_failure(first, error)),
                }
            }
            ProbePolicy::EveryTable => {
                let mut pending = Vec::new();
                for spec in &self.config.tables {
                    match is_on_twcs(session, keyspace, spec) {
                        Ok(true) => {}
                        Ok(false) => pending.push(spec),
                        Err(error) => return Err(probe_failure(spec, error)),
                    }
                }
                Ok(pending)
            }
        }
    }

    // Stops at the first rejected statement; earlier alterations are kept.
    fn alter_all<S: ClusterSession + ?Sized>(
        &self,
        session: &S,
        keyspace: &str,
        pending: &[&TableMigrationSpec],
    ) -> MigrationOutcome {
        let mut altered = Vec::with_capacity(pending.len());

        for (index, spec) in pending.iter().enumerate() {
            let table = spec.table();
            self.log.info(
                LogEvent::new(format!("Altering {} to use TWCS...", table))
                    .keyspace(keyspace)
                    .table(table),
            );

            if let Err(error) = session.execute(&spec.alter_statement(keyspace)) {
                self.log.error(
                    LogEvent::new("Failed altering metrics tables to TWCS")
                        .keyspace(keyspace)
                        .table(table)
                        .error(&error),
                );
                return MigrationOutcome::PartiallyFailed(FailureDetails {
                    stage: FailureStage::Alter,
                    table: table.to_string(),
                    error,
                    altered,
                    skipped: pending[index + 1..]
                        .iter()
                        .map(|s| s.table().to_string())
                        .collect(),
                });
            }

            self.log.info(
                LogEvent::new(format!("{} was successfully altered to use TWCS.", table))
                    .keyspace(keyspace)
                    .table(table),
            );
            altered.push(table.to_string());
        }

        MigrationOutcome::Applied { tables: altered }
    }
}

fn is_on_twcs<S: ClusterSession + ?Sized>(
    session: &S,
    keyspace: &str,
    spec: &TableMigrationSpec,
) -> Result<bool> {
    let options = session.compaction_options(keyspace, spec.table())?;
    if options.class().is_none() {
        return Err(MigrationError::MissingCompactionClass(spec.table().to_string()));
    }
    Ok(uses_twcs(&options))
}
