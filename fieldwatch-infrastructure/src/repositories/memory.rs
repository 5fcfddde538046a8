// In-process store used when no ClickHouse server is configured

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use fieldwatch_domain::ports::{ActivityRepository, AlertRepository};
use fieldwatch_domain::{Activity, ActivityBatch, Alert, AlertQuery, Technician};

#[derive(Default)]
pub struct MemoryRepository {
    activities: RwLock<BTreeMap<(String, String), Activity>>,
    technicians: RwLock<BTreeMap<String, Technician>>,
    alerts: RwLock<Vec<Alert>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn activity_count(&self) -> usize {
        self.activities.read().await.len()
    }

    pub async fn technician_names(&self) -> Vec<String> {
        self.technicians.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl ActivityRepository for MemoryRepository {
    async fn ensure_schema(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn save_batch(&self, batch: &ActivityBatch) -> anyhow::Result<()> {
        let mut activities = self.activities.write().await;
        for activity in &batch.activities {
            activities.insert(
                (activity.ticket_id.clone(), activity.technician.clone()),
                activity.clone(),
            );
        }
        let mut technicians = self.technicians.write().await;
        for technician in &batch.technicians {
            technicians.insert(technician.name.clone(), technician.clone());
        }
        Ok(())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl AlertRepository for MemoryRepository {
    async fn insert_alerts(&self, alerts: &[Alert]) -> anyhow::Result<()> {
        self.alerts.write().await.extend(alerts.iter().cloned());
        Ok(())
    }

    async fn fetch_alert(&self, external_id: &str) -> anyhow::Result<Option<Alert>> {
        Ok(self
            .alerts
            .read()
            .await
            .iter()
            .find(|alert| alert.external_id == external_id)
            .cloned())
    }

    async fn fetch_alerts(&self, query: &AlertQuery) -> anyhow::Result<Vec<Alert>> {
        let alerts = self.alerts.read().await;
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(alerts
            .iter()
            .rev()
            .filter(|alert| query.matches(alert))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn update_alert(&self, alert: &Alert) -> anyhow::Result<()> {
        let mut alerts = self.alerts.write().await;
        match alerts
            .iter_mut()
            .find(|stored| stored.external_id == alert.external_id)
        {
            Some(stored) => *stored = alert.clone(),
            None => alerts.push(alert.clone()),
        }
        Ok(())
    }

    async fn fetch_fingerprints(&self) -> anyhow::Result<HashSet<String>> {
        Ok(self
            .alerts
            .read()
            .await
            .iter()
            .filter(|alert| !alert.fingerprint.is_empty())
            .map(|alert| alert.fingerprint.clone())
            .collect())
    }

    async fn discard_run(&self, run_id: &str) -> anyhow::Result<()> {
        self.alerts.write().await.retain(|alert| alert.run_id != run_id);
        Ok(())
    }
}
