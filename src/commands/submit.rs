use serde::Serialize;
use std::sync::Arc;

use crate::commands::config::BugdeskConfig;
use crate::commands::report::{compose, validate, BugReport, BugReportForm, SubmissionContext};
use crate::error::{ReportError, Result};
use crate::queue::{FilePendingQueue, PendingQueue};
use crate::store::{HttpRecordStore, RecordStore, UnconfiguredStore, BUGS_COLLECTION};

/// Where an accepted report ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Delivery {
    Remote,
    Queued,
}

/// A report was accepted. `reference` is the store's document reference for
/// remote delivery, or the report's own id when it was queued locally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    pub reference: String,
    pub delivery: Delivery,
}

/// What the report form gets back: `{"ok":true,"id":..}` or `{"ok":false,"reason":..}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubmitOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SubmitOutcome {
    pub fn accepted(id: impl Into<String>) -> Self {
        Self {
            ok: true,
            id: Some(id.into()),
            reason: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            reason: Some(reason.into()),
        }
    }
}

/// Sends composed reports to the record store, falling back to the pending queue.
pub struct Submitter {
    store: Arc<dyn RecordStore>,
    queue: Arc<dyn PendingQueue>,
    collection: String,
}

impl Submitter {
    pub fn new(store: Arc<dyn RecordStore>, queue: Arc<dyn PendingQueue>) -> Self {
        Self {
            store,
            queue,
            collection: BUGS_COLLECTION.to_string(),
        }
    }

    /// HTTP store plus file-backed queue, as configured. Without a store URL
    /// every report goes straight to the queue.
    pub fn from_config(config: &BugdeskConfig) -> Result<Self> {
        let store: Arc<dyn RecordStore> = match config.store_url.as_deref() {
            Some(url) if !url.trim().is_empty() => {
                Arc::new(HttpRecordStore::new(url, config.api_key.clone()))
            }
            _ => {
                log::warn!("no store URL configured, reports will be queued locally");
                Arc::new(UnconfiguredStore)
            }
        };
        let queue = FilePendingQueue::new(config.resolved_queue_path()?);
        Ok(Self::new(store, Arc::new(queue)).with_collection(&config.collection))
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// One remote write attempt; on failure, one local append. No retries.
    ///
    /// A queued report is acknowledged like a delivered one. Callers that need
    /// to tell the two apart can check [`Ack::delivery`].
    pub async fn submit(&self, report: &BugReport) -> Result<Ack> {
        log::debug!("[{}] submitting via {}", report.id, self.store.backend_tag());
        let document = serde_json::to_value(report)?;

        let transport = match self.store.add_document(&self.collection, &document).await {
            Ok(reference) => {
                log::info!("[{}] delivered as {reference}", report.id);
                return Ok(Ack {
                    reference,
                    delivery: Delivery::Remote,
                });
            }
            Err(e) => e,
        };

        log::warn!("[{}] remote write failed, queueing locally: {transport}", report.id);
        match self.queue.enqueue(report).await {
            Ok(pending) => {
                log::info!("[{}] queued locally ({pending} pending)", report.id);
                Ok(Ack {
                    reference: report.id.clone(),
                    delivery: Delivery::Queued,
                })
            }
            Err(local) => {
                log::error!("[{}] local queue write failed: {local}", report.id);
                Err(ReportError::Persistence {
                    transport,
                    local: Box::new(local),
                })
            }
        }
    }

    /// Compose, validate, and submit a report from raw form values.
    pub async fn submit_bug_report(
        &self,
        form: &BugReportForm,
        context: &SubmissionContext,
    ) -> SubmitOutcome {
        let report = match compose(form, context) {
            Ok(report) => report,
            Err(ReportError::Validation(e)) => {
                log::debug!("report rejected on {}: {}", e.field, e.reason);
                return SubmitOutcome::rejected(e.reason);
            }
            Err(e) => {
                log::error!("could not compose report: {e}");
                return SubmitOutcome::rejected(e.to_string());
            }
        };
        log::debug!("[{}] validated", report.id);

        match self.submit(&report).await {
            Ok(ack) => SubmitOutcome::accepted(ack.reference),
            Err(e) => SubmitOutcome::rejected(e.to_string()),
        }
    }
}

/// The `bugdesk submit` path: always yields an outcome, never an error.
pub async fn submit_with_config(
    config: &BugdeskConfig,
    form: &BugReportForm,
    context: &SubmissionContext,
) -> SubmitOutcome {
    match Submitter::from_config(config) {
        Ok(submitter) => submitter.submit_bug_report(form, context).await,
        Err(e) => {
            // Form problems are still the more useful thing to report.
            if let Err(invalid) = validate(form) {
                return SubmitOutcome::rejected(invalid.reason);
            }
            log::error!("cannot set up submission: {e}");
            SubmitOutcome::rejected(e.to_string())
        }
    }
}
