use std::collections::HashSet;

use async_trait::async_trait;

use crate::entities::{ActivityBatch, Alert, AlertQuery, ClientDirectory, TravelPolicy};

#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn ensure_schema(&self) -> anyhow::Result<()>;
    async fn save_batch(&self, batch: &ActivityBatch) -> anyhow::Result<()>;
    async fn ping(&self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait AlertRepository: Send + Sync {
    async fn insert_alerts(&self, alerts: &[Alert]) -> anyhow::Result<()>;
    async fn fetch_alert(&self, external_id: &str) -> anyhow::Result<Option<Alert>>;
    async fn fetch_alerts(&self, query: &AlertQuery) -> anyhow::Result<Vec<Alert>>;
    /// Stores a new version of an existing alert.
    async fn update_alert(&self, alert: &Alert) -> anyhow::Result<()>;
    async fn fetch_fingerprints(&self) -> anyhow::Result<HashSet<String>>;
    /// Removes every alert written by `run_id`.
    async fn discard_run(&self, run_id: &str) -> anyhow::Result<()>;
}

#[async_trait]
pub trait ConfigRepository: Send + Sync {
    async fn load_travel_policy(&self, path: &str) -> anyhow::Result<TravelPolicy>;
    async fn load_client_directory(&self, path: &str) -> anyhow::Result<ClientDirectory>;
}
