//! Synchronization engine
//!
//! Drives one synchronization run end to end: resolves the subscription and
//! the resume point, fetches the delta, routes records through the importer
//! in two ordered passes (all concepts before any mapping), persists each
//! resulting item, and finalizes the run ledger. Partial progress is never
//! rolled back; a failed run leaves its items as audit trail and the next run
//! resumes from the last successful checkpoint.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use metrics::{counter, histogram};
use serde_json::{Value as JsonValue, json};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{RepositoryError, SyncError, is_unique_violation};
use crate::importer::RecordImporter;
use crate::ledger::UpdateLedger;
use crate::models::item::{self, RecordKind};
use crate::models::sync_run::RunStatus;
use crate::remote::DeltaSource;
use crate::remote::records::{external_id_of, kind_of};

/// Outcome of one engine invocation.
#[derive(Debug)]
pub enum RunOutcome {
    /// No subscription is configured; nothing was attempted.
    NotConfigured,
    /// A run executed to completion.
    Completed(RunReport),
}

/// Summary of a completed run.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    /// Records the remote delivered in the delta.
    pub record_count: usize,
    /// Items persisted to the ledger.
    pub items_saved: usize,
    /// Records rejected or lost to store failures.
    pub errors: usize,
    /// Checkpoint recorded for this run.
    pub updated_to: chrono::DateTime<Utc>,
}

/// The synchronization orchestrator.
pub struct SyncEngine {
    source: Arc<dyn DeltaSource>,
    ledger: Arc<dyn UpdateLedger>,
    importer: Arc<dyn RecordImporter>,
}

impl SyncEngine {
    /// Create an engine over the given collaborators.
    pub fn new(
        source: Arc<dyn DeltaSource>,
        ledger: Arc<dyn UpdateLedger>,
        importer: Arc<dyn RecordImporter>,
    ) -> Self {
        Self {
            source,
            ledger,
            importer,
        }
    }

    /// Execute one synchronization run.
    #[instrument(skip_all)]
    pub async fn run(&self) -> Result<RunOutcome, SyncError> {
        let Some(subscription) = self.ledger.subscription().await? else {
            info!("No subscription configured; nothing to synchronize");
            return Ok(RunOutcome::NotConfigured);
        };

        if self.ledger.active_run().await?.is_some() {
            return Err(SyncError::AlreadyInProgress);
        }

        // Only a successful run's checkpoint may seed the window; a failed
        // run's partial work is re-fetched wholesale.
        let since = self
            .ledger
            .last_successful_run()
            .await?
            .and_then(|run| run.remote_updated_to)
            .map(|dt| dt.with_timezone(&Utc));

        let run = match self.ledger.create_run(Utc::now()).await {
            Ok(run) => run,
            Err(RepositoryError::Database { source }) if is_unique_violation(&source) => {
                return Err(SyncError::AlreadyInProgress);
            }
            Err(err) => return Err(SyncError::Ledger(err)),
        };

        info!(run_id = %run.id, url = %subscription.url, since = ?since, "Starting synchronization run");
        let timer = Instant::now();

        let response = match self
            .source
            .fetch_updates(&subscription.url, subscription.token.as_deref(), since)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(run_id = %run.id, error = %err, "Delta fetch failed");
                self.fail_run(run.id, &err.to_string()).await?;
                counter!("sync_runs_total", "outcome" => "failed").increment(1);
                return Err(err.into());
            }
        };

        if let Err(err) = self
            .ledger
            .set_remote_updated_to(run.id, response.updated_to)
            .await
        {
            let _ = self.fail_run(run.id, "failed to record remote checkpoint").await;
            return Err(SyncError::Ledger(err));
        }

        // The wire interleaves record types; partition once, preserving
        // encounter order within each kind, so no persisted mapping item
        // precedes a concept item of this run.
        let mut concepts = Vec::new();
        let mut mappings = Vec::new();
        let mut unknown = Vec::new();
        for raw in &response.records {
            match kind_of(raw) {
                RecordKind::Concept => concepts.push(raw),
                RecordKind::Mapping => mappings.push(raw),
                RecordKind::Unknown => unknown.push(raw),
            }
        }

        let mut report = RunReport {
            run_id: run.id,
            record_count: response.record_count,
            items_saved: 0,
            errors: 0,
            updated_to: response.updated_to,
        };

        for raw in concepts {
            self.import_one(run.id, raw, RecordKind::Concept, &mut report)
                .await;
        }
        for raw in mappings {
            self.import_one(run.id, raw, RecordKind::Mapping, &mut report)
                .await;
        }
        for raw in unknown {
            let item = item::Model::rejected(
                run.id,
                external_id_of(raw).unwrap_or_else(Uuid::new_v4),
                RecordKind::Unknown,
                "record carries no recognizable type tag",
            );
            self.save_item(item, &mut report).await;
        }

        self.ledger
            .finish_run(run.id, Utc::now(), RunStatus::Succeeded, None)
            .await?;

        histogram!("sync_run_duration_ms").record(timer.elapsed().as_secs_f64() * 1_000.0);
        counter!("sync_runs_total", "outcome" => "succeeded").increment(1);

        info!(
            run_id = %run.id,
            records = report.record_count,
            items = report.items_saved,
            errors = report.errors,
            updated_to = %report.updated_to,
            "Synchronization run completed"
        );

        Ok(RunOutcome::Completed(report))
    }

    async fn import_one(
        &self,
        run_id: Uuid,
        raw: &JsonValue,
        kind: RecordKind,
        report: &mut RunReport,
    ) {
        let imported = match kind {
            RecordKind::Concept => self.importer.import_concept(run_id, raw).await,
            RecordKind::Mapping => self.importer.import_mapping(run_id, raw).await,
            RecordKind::Unknown => unreachable!("unknown records never reach the importer"),
        };

        match imported {
            Ok(item) => self.save_item(item, report).await,
            // Store trouble for one record is a per-record failure, not a run
            // failure; the re-fetch after the next checkpoint retries it.
            Err(err) => {
                warn!(run_id = %run_id, kind = %kind, error = %err, "Import failed for record");
                let fallback = item::Model::rejected(
                    run_id,
                    external_id_of(raw).unwrap_or_else(Uuid::new_v4),
                    kind,
                    format!("import failed: {err}"),
                );
                self.save_item(fallback, report).await;
            }
        }
    }

    async fn save_item(&self, item: item::Model, report: &mut RunReport) {
        let state = item.state.clone();
        let is_error = item.is_error();
        match self.ledger.save_item(item).await {
            Ok(()) => {
                report.items_saved += 1;
                if is_error {
                    report.errors += 1;
                }
                counter!("sync_items_total", "state" => state).increment(1);
            }
            Err(err) => {
                warn!(error = %err, "Failed to persist item; continuing run");
                report.errors += 1;
            }
        }
    }

    async fn fail_run(&self, run_id: Uuid, message: &str) -> Result<(), SyncError> {
        self.ledger
            .finish_run(
                run_id,
                Utc::now(),
                RunStatus::Failed,
                Some(json!({ "message": message })),
            )
            .await
            .map_err(SyncError::Ledger)
    }
}
