// In-process port fakes for application tests

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use fieldwatch_domain::ports::{
    ActivityRepository, ActivitySource, AlertRepository, ConfigRepository, EnrichmentService,
    ReportSink,
};
use fieldwatch_domain::{
    Activity, ActivityBatch, Alert, AlertQuery, BatchId, Client, ClientDirectory, DedupPolicy,
    Enrichment, FeedKind, FeedReport, IngestReport, RunReport, RuntimeConfig, TravelPolicy,
};
use tokio::sync::{Mutex, RwLock};

use crate::{AppState, Metrics, RunCache};

pub fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 4)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .expect("valid datetime")
}

pub fn activity(ticket: &str, technician: &str, client: &str, start: NaiveDateTime, end: NaiveDateTime) -> Activity {
    Activity {
        ticket_id: ticket.to_string(),
        technician: technician.to_string(),
        client: Some(client.to_string()),
        started_at: Some(start),
        ended_at: Some(end),
        activity_type: None,
        contract: None,
        description: None,
        duration_hours: 0.0,
        source_file: "attivita.csv".to_string(),
        batch_id: BatchId("batch_test".to_string()),
        confidence_score: None,
        validated: false,
    }
}

/// Overlap for one technician and a short hop to a 20 km client for another.
pub fn scenario_activities() -> Vec<Activity> {
    vec![
        activity("1", "Alex Ferrario", "Cliente A", at(9, 0), at(11, 0)),
        activity("2", "Alex Ferrario", "Cliente B", at(10, 30), at(12, 30)),
        activity("3", "Matteo Signo", "Cliente A", at(10, 0), at(12, 0)),
        activity("4", "Matteo Signo", "Cliente C", at(12, 10), at(14, 0)),
    ]
}

pub fn scenario_directory() -> ClientDirectory {
    let mut a = Client::named("Cliente A");
    a.latitude = Some(45.46);
    a.longitude = Some(9.19);
    let mut c = Client::named("Cliente C");
    c.latitude = Some(45.46 + 0.17987);
    c.longitude = Some(9.19);
    ClientDirectory::new(vec![a, c])
}

pub struct FixedSource {
    pub activities: Vec<Activity>,
}

#[async_trait]
impl ActivitySource for FixedSource {
    async fn ingest(&self, batch_id: &BatchId) -> IngestReport {
        let activities: Vec<Activity> = self
            .activities
            .iter()
            .cloned()
            .map(|mut activity| {
                activity.batch_id = batch_id.clone();
                activity
            })
            .collect();
        IngestReport {
            batch_id: batch_id.clone(),
            feeds: vec![FeedReport {
                feed: FeedKind::Activities,
                path: Some("attivita.csv".to_string()),
                rows: activities.len(),
                encoding: Some("UTF-8".to_string()),
                delimiter: Some(';'),
                missing_columns: Vec::new(),
                failure: None,
            }],
            activities,
            skipped_rows: 0,
        }
    }

    fn dataset_key(&self) -> String {
        "test-dataset".to_string()
    }
}

#[derive(Default)]
pub struct FakeActivities {
    pub batches: Mutex<Vec<ActivityBatch>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl ActivityRepository for FakeActivities {
    async fn ensure_schema(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn save_batch(&self, batch: &ActivityBatch) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("storage offline"));
        }
        self.batches.lock().await.push(batch.clone());
        Ok(())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeAlerts {
    pub alerts: Mutex<Vec<Alert>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl AlertRepository for FakeAlerts {
    async fn insert_alerts(&self, alerts: &[Alert]) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("alert store offline"));
        }
        self.alerts.lock().await.extend_from_slice(alerts);
        Ok(())
    }

    async fn fetch_alert(&self, external_id: &str) -> anyhow::Result<Option<Alert>> {
        let alerts = self.alerts.lock().await;
        Ok(alerts.iter().find(|a| a.external_id == external_id).cloned())
    }

    async fn fetch_alerts(&self, query: &AlertQuery) -> anyhow::Result<Vec<Alert>> {
        let alerts = self.alerts.lock().await;
        let mut rows: Vec<Alert> = alerts.iter().filter(|a| query.matches(a)).cloned().collect();
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn update_alert(&self, alert: &Alert) -> anyhow::Result<()> {
        let mut alerts = self.alerts.lock().await;
        if let Some(existing) = alerts.iter_mut().find(|a| a.external_id == alert.external_id) {
            *existing = alert.clone();
        }
        Ok(())
    }

    async fn fetch_fingerprints(&self) -> anyhow::Result<HashSet<String>> {
        let alerts = self.alerts.lock().await;
        Ok(alerts.iter().map(|a| a.fingerprint.clone()).collect())
    }

    async fn discard_run(&self, run_id: &str) -> anyhow::Result<()> {
        self.alerts.lock().await.retain(|a| a.run_id != run_id);
        Ok(())
    }
}

pub struct FakeConfig;

#[async_trait]
impl ConfigRepository for FakeConfig {
    async fn load_travel_policy(&self, _path: &str) -> anyhow::Result<TravelPolicy> {
        Ok(TravelPolicy::default())
    }

    async fn load_client_directory(&self, _path: &str) -> anyhow::Result<ClientDirectory> {
        Ok(scenario_directory())
    }
}

pub struct UnavailableEnrichment;

#[async_trait]
impl EnrichmentService for UnavailableEnrichment {
    async fn enrich(&self, _alert: &Alert, _history: &[Alert]) -> anyhow::Result<Enrichment> {
        Err(anyhow!("enrichment not configured"))
    }
}

#[derive(Default)]
pub struct FakeSink {
    pub published: Mutex<Vec<String>>,
}

#[async_trait]
impl ReportSink for FakeSink {
    async fn publish(&self, report: &RunReport, _metrics: &str) -> anyhow::Result<String> {
        self.published.lock().await.push(report.run_id.clone());
        Ok(format!("reports/{}.json", report.run_id))
    }
}

pub fn runtime_config(dedup_policy: DedupPolicy) -> RuntimeConfig {
    RuntimeConfig {
        input_dirs: vec!["data".to_string()],
        max_file_bytes: 100 * 1024 * 1024,
        technician_roster: Vec::new(),
        rules_path: "rules.yaml".to_string(),
        clients_path: "clients.yaml".to_string(),
        overlap_min_confidence: 70.0,
        travel_min_confidence: 60.0,
        dedup_policy,
        result_cache_ttl_seconds: 300,
        report_dir: "reports".to_string(),
        enrichment_url: None,
        enrichment_token: None,
        enrichment_model: "test".to_string(),
        enrichment_history_limit: 10,
        request_timeout_seconds: 5,
        schedule_hour: 6,
        schedule_minute: 0,
    }
}

pub struct Harness {
    pub state: AppState,
    pub activities: Arc<FakeActivities>,
    pub alerts: Arc<FakeAlerts>,
    pub sink: Arc<FakeSink>,
}

pub fn harness(dedup_policy: DedupPolicy) -> Harness {
    let activities = Arc::new(FakeActivities::default());
    let alerts = Arc::new(FakeAlerts::default());
    let sink = Arc::new(FakeSink::default());
    let state = AppState {
        config: runtime_config(dedup_policy),
        source: Arc::new(FixedSource {
            activities: scenario_activities(),
        }),
        activity_repo: activities.clone(),
        alert_repo: alerts.clone(),
        config_repo: Arc::new(FakeConfig),
        enrichment: Arc::new(UnavailableEnrichment),
        report_sink: sink.clone(),
        travel_policy: Arc::new(RwLock::new(TravelPolicy::default())),
        client_directory: Arc::new(RwLock::new(scenario_directory())),
        metrics: Arc::new(Metrics::default()),
        run_cache: Arc::new(RunCache::new(Duration::from_secs(300))),
    };
    Harness {
        state,
        activities,
        alerts,
        sink,
    }
}
