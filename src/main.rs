//! # termsync Main Entry Point
//!
//! Command-line entry point for the termsync service. The `sync` command
//! performs exactly one synchronization run; recurring execution is left to
//! an external scheduler (cron, systemd timers).

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use termsync::config::ConfigLoader;
use termsync::db;
use termsync::engine::{RunOutcome, SyncEngine};
use termsync::importer::DbImporter;
use termsync::ledger::DbLedger;
use termsync::migration::{Migrator, MigratorTrait};
use termsync::remote::HttpDeltaSource;
use termsync::repositories::{ItemRepository, SyncRunRepository};
use termsync::seeds::seed_subscription;
use termsync::telemetry;

#[derive(Parser)]
#[command(name = "termsync", about = "Incremental terminology dictionary synchronization")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending database migrations
    Migrate,
    /// Seed the subscription from configuration
    Seed,
    /// Execute one synchronization run
    Sync,
    /// Report recent runs with their item summaries
    Status {
        /// Number of runs to report
        #[arg(long, default_value_t = 5)]
        limit: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration from layered env files and variables
    let config = ConfigLoader::new().load().context("loading configuration")?;
    telemetry::init_tracing(&config).context("initializing telemetry")?;

    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;

    match cli.command {
        Command::Migrate => {
            Migrator::up(&db, None).await.context("applying migrations")?;
            println!("Migrations applied");
        }
        Command::Seed => match seed_subscription(&db, &config).await? {
            Some(subscription) => println!("Subscription configured for {}", subscription.url),
            None => println!("No subscription URL configured; nothing seeded"),
        },
        Command::Sync => {
            let source = HttpDeltaSource::new(Duration::from_secs(config.fetch_timeout_seconds))
                .context("building delta source")?;
            let engine = SyncEngine::new(
                Arc::new(source),
                Arc::new(DbLedger::new(db.clone())),
                Arc::new(DbImporter::new(db.clone())),
            );

            match engine.run().await? {
                RunOutcome::NotConfigured => {
                    println!("No subscription configured; nothing to do");
                }
                RunOutcome::Completed(report) => {
                    println!(
                        "Run {}: {} records, {} items saved, {} errors, updated to {}",
                        report.run_id,
                        report.record_count,
                        report.items_saved,
                        report.errors,
                        report.updated_to
                    );
                }
            }
        }
        Command::Status { limit } => {
            let runs = SyncRunRepository::new(db.clone());
            let items = ItemRepository::new(db.clone());

            for run in runs.recent(limit).await? {
                let checkpoint = run
                    .remote_updated_to
                    .map(|dt| dt.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{} {} started={} updated_to={}",
                    run.id, run.status, run.started_at, checkpoint
                );
                for (state, count) in items.count_by_state(run.id).await? {
                    println!("  {state}: {count}");
                }
                for item in items.errors_for_run(run.id).await? {
                    println!(
                        "  ! {} {}: {}",
                        item.kind,
                        item.external_id,
                        item.error_message.as_deref().unwrap_or("unknown reason")
                    );
                }
            }
        }
    }

    Ok(())
}
