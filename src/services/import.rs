//! Import orchestration.
//!
//! Drives the per-record pipeline: resolve an icon, build the payload,
//! upsert against the record store, classify the outcome, and keep the
//! aggregate counters. Records are processed strictly sequentially in
//! source order. Separated from UI concerns - emits events for progress
//! tracking.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::auth::AuthContext;
use crate::favicon::IconResolver;
use crate::models::{ImportOutcome, ImportSummary, LinkPayload, LinkRecord};
use crate::store::{is_unique_violation, CreateResponse, RecordStore};

/// Events emitted during an import run.
#[derive(Debug, Clone)]
pub enum ImportEvent {
    /// Processing started for a record.
    Started { index: usize, name: String },
    /// Record dispatched and classified.
    Finished {
        index: usize,
        name: String,
        outcome: ImportOutcome,
    },
    /// Health probe performed after accumulated failures.
    HealthCheck { healthy: bool },
    /// Run stopped early because the store is unreachable.
    Stopped { failed: usize },
}

/// Knobs for one import run.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Skip favicon resolution entirely; payloads carry an empty icon.
    pub skip_icons: bool,
    /// Pause between records, giving favicon probes and the store room to
    /// breathe. No backoff beyond this fixed delay.
    pub record_delay: Duration,
    /// Failure count at which (and at every multiple of which) a health
    /// probe runs.
    pub failure_probe_interval: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            skip_icons: false,
            record_delay: Duration::from_millis(200),
            failure_probe_interval: 5,
        }
    }
}

/// Sequential import loop over extracted records.
pub struct ImportService<S, R> {
    store: S,
    resolver: R,
}

impl<S: RecordStore, R: IconResolver> ImportService<S, R> {
    pub fn new(store: S, resolver: R) -> Self {
        Self { store, resolver }
    }

    /// Run the import, returning aggregate counters.
    ///
    /// Per-record failures never abort the run; the only early exit is a
    /// failed health probe after repeated failures, which returns the
    /// partial aggregate with `stopped_early` set. Exactly one outcome is
    /// emitted per dispatched record, so `processed` always matches the
    /// event stream.
    pub async fn run(
        &self,
        records: &[LinkRecord],
        auth: &AuthContext,
        options: &ImportOptions,
        events: mpsc::Sender<ImportEvent>,
    ) -> ImportSummary {
        let mut summary = ImportSummary {
            total: records.len(),
            ..ImportSummary::default()
        };

        for (index, record) in records.iter().enumerate() {
            let _ = events
                .send(ImportEvent::Started {
                    index,
                    name: record.name.clone(),
                })
                .await;

            let favicon = if options.skip_icons {
                String::new()
            } else {
                self.resolver.resolve(&record.url).await
            };
            let icon_resolved = !favicon.trim().is_empty();

            let payload = LinkPayload::from_record(record, &auth.owner_user_id, favicon);
            let outcome = self.dispatch(&payload, &auth.bearer_token, icon_resolved).await;

            summary.processed += 1;
            if outcome.succeeded {
                summary.succeeded += 1;
                if outcome.icon_attached {
                    summary.with_icon += 1;
                }
            } else {
                summary.failed += 1;
            }

            let failed_now = !outcome.succeeded;
            let _ = events
                .send(ImportEvent::Finished {
                    index,
                    name: record.name.clone(),
                    outcome,
                })
                .await;

            // After a run of failures, check whether the store itself is
            // down before burning through the rest of the records.
            if failed_now
                && summary.failed >= options.failure_probe_interval
                && summary.failed % options.failure_probe_interval == 0
            {
                let healthy = self.store.health_check().await;
                let _ = events.send(ImportEvent::HealthCheck { healthy }).await;
                if !healthy {
                    summary.stopped_early = true;
                    let _ = events
                        .send(ImportEvent::Stopped {
                            failed: summary.failed,
                        })
                        .await;
                    break;
                }
            }

            tokio::time::sleep(options.record_delay).await;
        }

        summary
    }

    /// One create call plus outcome classification.
    async fn dispatch(
        &self,
        payload: &LinkPayload,
        bearer_token: &str,
        icon_resolved: bool,
    ) -> ImportOutcome {
        match self.store.create_link(payload, bearer_token).await {
            Ok(CreateResponse::Created(echo)) => ImportOutcome {
                succeeded: true,
                // The store may reject or silently drop the favicon field;
                // only the echoed record proves it was persisted.
                icon_attached: !echo.favicon.trim().is_empty(),
                reason: None,
            },
            Ok(CreateResponse::Rejected { status, body }) => {
                if is_unique_violation(status, &body) {
                    // Already imported; rerunning the pipeline is idempotent.
                    ImportOutcome {
                        succeeded: true,
                        icon_attached: icon_resolved,
                        reason: None,
                    }
                } else {
                    ImportOutcome {
                        succeeded: false,
                        icon_attached: false,
                        reason: Some(format!("HTTP {status}: {body}")),
                    }
                }
            }
            Err(e) => ImportOutcome {
                succeeded: false,
                icon_attached: false,
                reason: Some(e.to_string()),
            },
        }
    }
}
