use async_trait::async_trait;

use crate::entities::{Alert, Enrichment, IngestReport, RunReport};
use crate::value_objects::BatchId;

/// Loads every configured feed; failures are recorded in the report, never returned.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    async fn ingest(&self, batch_id: &BatchId) -> IngestReport;
    /// Identifies the input set so concurrent runs over it can be detected.
    fn dataset_key(&self) -> String;
}

#[async_trait]
pub trait EnrichmentService: Send + Sync {
    async fn enrich(&self, alert: &Alert, history: &[Alert]) -> anyhow::Result<Enrichment>;
}

#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn publish(&self, report: &RunReport, metrics: &str) -> anyhow::Result<String>;
}
