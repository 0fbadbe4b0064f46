pub mod config;
pub mod gate;
pub mod log;
pub mod migrator;
pub mod outcome;
pub mod plan;

use crate::cluster::ClusterSession;
use crate::core::Result;
use config::MigrationConfig;
use gate::{lowest_node_version, supports_twcs};
use log::{LogEvent, MigrationLog, TracingLog};
use migrator::CompactionMigrator;
use outcome::MigrationOutcome;
use std::sync::Arc;

/// Schema migration 19: metrics and operations tables move to TWCS.
///
/// Gate on the lowest node version, then hand over to [`CompactionMigrator`].
/// Only precondition failures (no hosts, unknown or unparsable versions, an
/// invalid table plan) come back as `Err`; a bad keyspace name is contained
/// like any other probe failure.
pub struct Migration019 {
    config: MigrationConfig,
    log: Arc<dyn MigrationLog>,
}

impl Migration019 {
    pub const ID: u32 = 19;
    pub const NAME: &'static str = "metrics_tables_twcs";

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

    pub fn run<S: ClusterSession + ?Sized>(&self, session: &S) -> Result<MigrationOutcome> {
        self.config.validate()?;
        let keyspace = self.config.keyspace.as_str();

        let lowest = lowest_node_version(session)?;
        if !supports_twcs(&lowest) {
            self.log.info(
                LogEvent::new(format!(
                    "Lowest node version {} does not support TWCS, skipping migration {}",
                    lowest,
                    Self::ID
                ))
                .keyspace(keyspace),
            );
            return Ok(MigrationOutcome::Ineligible { lowest });
        }

        let migrator = CompactionMigrator::new(self.config.clone()).with_log(Arc::clone(&self.log));
        Ok(migrator.migrate(session, keyspace))
    }
}

/// Run the migration against `keyspace` with the default table plan.
pub fn migrate<S: ClusterSession + ?Sized>(session: &S, keyspace: &str) -> Result<MigrationOutcome> {
    Migration019::new(MigrationConfig::new(keyspace)).run(session)
}
