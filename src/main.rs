use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use twcs_migrate::{
    DEFAULT_KEYSPACE, InMemoryCluster, Migration019, MigrationConfig, MigrationOutcome,
    ProbePolicy, SnapshotStore, TWCS_MODERN_RANGE, TWCS_PATCH_RANGE, lowest_node_version,
    migration::gate::supports_twcs, normalize_keyspace,
};

#[derive(Parser)]
#[command(name = "twcs-migrate")]
#[command(about = "Move repair metrics tables to TimeWindowCompactionStrategy")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the ALTER statements for a keyspace
    Plan {
        #[arg(long, default_value = DEFAULT_KEYSPACE)]
        keyspace: String,
    },
    /// Report the lowest node version of a topology snapshot and whether it supports TWCS
    Check {
        #[arg(long)]
        topology: PathBuf,
    },
    /// Run the migration against a topology snapshot
    Run {
        #[arg(long)]
        topology: PathBuf,
        #[arg(long, default_value = DEFAULT_KEYSPACE)]
        keyspace: String,
        #[arg(long)]
        dry_run: bool,
        /// Probe every table instead of only the first one
        #[arg(long)]
        strict_probe: bool,
        /// Save the altered schema back into the snapshot file
        #[arg(long)]
        write_back: bool,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Plan { keyspace } => plan(&keyspace),
        Command::Check { topology } => check(&topology),
        Command::Run {
            topology,
            keyspace,
            dry_run,
            strict_probe,
            write_back,
        } => run(&topology, &keyspace, dry_run, strict_probe, write_back),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("twcs_migrate=info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn plan(keyspace: &str) -> Result<()> {
    let config = MigrationConfig::new(keyspace);
    config.validate().context("invalid migration configuration")?;
    let keyspace = normalize_keyspace(&config.keyspace).context("invalid keyspace")?;

    for spec in &config.tables {
        println!("{};", spec.alter_statement(&keyspace));
    }
    Ok(())
}

fn check(topology: &Path) -> Result<()> {
    let cluster = load_cluster(topology)?;
    let lowest = lowest_node_version(&cluster).context("cannot determine cluster version")?;

    println!("lowest node version: {}", lowest);
    println!(
        "supports TWCS ({} or {}): {}",
        TWCS_PATCH_RANGE,
        TWCS_MODERN_RANGE,
        if supports_twcs(&lowest) { "yes" } else { "no" }
    );
    Ok(())
}

fn run(topology: &Path, keyspace: &str, dry_run: bool, strict_probe: bool, write_back: bool) -> Result<()> {
    let store = SnapshotStore::new(topology);
    let cluster = load_cluster(topology)?;

    let probe_policy = if strict_probe {
        ProbePolicy::EveryTable
    } else {
        ProbePolicy::FirstTable
    };
    let config = MigrationConfig::new(keyspace)
        .probe_policy(probe_policy)
        .dry_run(dry_run);

    let outcome = Migration019::new(config)
        .run(&cluster)
        .context("migration precondition failed")?;

    if let MigrationOutcome::DryRun { statements } = &outcome {
        for statement in statements {
            println!("{};", statement);
        }
    }
    println!("{}", outcome);

    if write_back && !outcome.altered_tables().is_empty() {
        let snapshot = cluster.snapshot().context("failed to read back cluster state")?;
        store
            .save(&snapshot)
            .with_context(|| format!("failed to write {}", store.path().display()))?;
        println!("Updated {}", store.path().display());
    }
    Ok(())
}

fn load_cluster(topology: &Path) -> Result<InMemoryCluster> {
    let snapshot = SnapshotStore::new(topology)
        .load()
        .with_context(|| format!("failed to load topology {}", topology.display()))?;
    Ok(InMemoryCluster::from_snapshot(snapshot))
}
