use chrono::Utc;
use fieldwatch_domain::{
    ActivityBatch, Alert, AlertFactory, BatchId, DedupPolicy, OverlapDetector, RulesEngine,
    RunId, RunReport, RunSummary, TravelTimeValidator,
};
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};

use crate::{AppError, AppState};

#[derive(Debug, Clone)]
pub enum RunResponse {
    Fresh(RunReport),
    /// A previous result, returned because this run could not produce one.
    Cached { report: RunReport, reason: String },
}

impl RunResponse {
    pub fn report(&self) -> &RunReport {
        match self {
            RunResponse::Fresh(report) => report,
            RunResponse::Cached { report, .. } => report,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, RunResponse::Cached { .. })
    }
}

pub async fn run_audit(state: &AppState) -> Result<RunResponse, AppError> {
    let dataset = state.source.dataset_key();
    let Some(_guard) = state.run_cache.try_begin(&dataset) else {
        return match state.run_cache.fresh(&dataset) {
            Some(report) => {
                info!(dataset = %dataset, "run in progress, returning cached result");
                Ok(RunResponse::Cached {
                    report: (*report).clone(),
                    reason: "run in progress".to_string(),
                })
            }
            None => Err(AppError::RunInProgress(dataset)),
        };
    };

    match execute_run(state, &dataset).await {
        Ok(report) => {
            state.run_cache.store(&dataset, report.clone());
            Ok(RunResponse::Fresh(report))
        }
        Err(err) => {
            state.metrics.record_run_failure();
            error!(dataset = %dataset, error = %err, "audit run failed");
            match state.run_cache.fresh(&dataset) {
                Some(report) => Ok(RunResponse::Cached {
                    report: (*report).clone(),
                    reason: err.to_string(),
                }),
                None => Err(err),
            }
        }
    }
}

async fn execute_run(state: &AppState, dataset: &str) -> Result<RunReport, AppError> {
    let started_at = Utc::now();
    let run_id = RunId::generate();
    let batch_id = BatchId::generate();
    info!(run_id = %run_id, batch_id = %batch_id, "audit run started");

    let ingest = state.source.ingest(&batch_id).await;
    state.metrics.record_ingest(
        ingest.loaded_feeds(),
        ingest.failed_feeds(),
        ingest.total_rows(),
        ingest.activities.len(),
    );

    let policy = { state.travel_policy.read().await.clone() };
    let directory = { state.client_directory.read().await.clone() };
    let engine = RulesEngine::new(
        OverlapDetector::new(state.config.overlap_min_confidence),
        TravelTimeValidator::new(policy, directory, state.config.travel_min_confidence),
    );
    let mut factory =
        AlertFactory::new(run_id.clone(), started_at).with_data_sources(ingest.data_sources());
    let outcome = engine.evaluate(&ingest.activities, &mut factory);

    let mut alerts = outcome.alerts;
    for alert in alerts.iter_mut() {
        alert.fingerprint = alert_fingerprint(alert);
    }
    let before = alerts.len();
    if state.config.dedup_policy == DedupPolicy::ContentHash {
        let mut seen = state
            .alert_repo
            .fetch_fingerprints()
            .await
            .map_err(AppError::Persistence)?;
        alerts.retain(|alert| seen.insert(alert.fingerprint.clone()));
    }
    let dedup_skipped = before - alerts.len();

    let mut summary = RunSummary {
        files_loaded: ingest.loaded_feeds(),
        files_failed: ingest.failed_feeds(),
        rows: ingest.total_rows(),
        activities: ingest.activities.len(),
        skipped_rows: ingest.skipped_rows,
        dedup_skipped,
        ..RunSummary::default()
    };
    summary.count_alerts(&alerts);

    let batch = ActivityBatch::new(batch_id.clone(), ingest.activities);
    persist_run(state, &run_id, &batch, &alerts).await?;
    state.metrics.record_run(alerts.len(), dedup_skipped);

    let report = RunReport {
        run_id: run_id.to_string(),
        batch_id: batch_id.to_string(),
        dataset: dataset.to_string(),
        started_at,
        finished_at: Utc::now(),
        dedup_policy: state.config.dedup_policy,
        summary,
        feeds: ingest.feeds,
        alerts,
    };
    match state
        .report_sink
        .publish(&report, &state.metrics.render_prometheus())
        .await
    {
        Ok(location) => info!(location = %location, "run report written"),
        Err(err) => warn!("failed to write run report: {}", err),
    }

    info!(
        run_id = %report.run_id,
        activities = report.summary.activities,
        alerts = report.summary.alerts,
        dedup_skipped,
        duration_ms = report.duration_ms(),
        "audit run finished"
    );
    Ok(report)
}

/// Alerts first, then the batch; a failed batch write withdraws the run's alerts.
async fn persist_run(
    state: &AppState,
    run_id: &RunId,
    batch: &ActivityBatch,
    alerts: &[Alert],
) -> Result<(), AppError> {
    if !alerts.is_empty() {
        state
            .alert_repo
            .insert_alerts(alerts)
            .await
            .map_err(AppError::Persistence)?;
    }
    if let Err(err) = state.activity_repo.save_batch(batch).await {
        if !alerts.is_empty() {
            if let Err(undo) = state.alert_repo.discard_run(run_id.as_str()).await {
                error!(run_id = %run_id, error = %undo, "failed to withdraw alerts of failed run");
            }
        }
        return Err(AppError::Persistence(err));
    }
    Ok(())
}

/// SHA-256 over technician, category and details; stable across runs.
pub fn alert_fingerprint(alert: &Alert) -> String {
    let details = serde_json::to_string(&alert.details).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(alert.technician.trim().to_lowercase().as_bytes());
    hasher.update(b"|");
    hasher.update(alert.category.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(details.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::harness;
    use fieldwatch_domain::AlertCategory;
    use std::collections::HashSet;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn run_persists_alerts_and_batch() {
        let h = harness(DedupPolicy::Snapshot);
        let response = run_audit(&h.state).await.expect("run");
        assert!(!response.is_stale());
        let report = response.report();

        assert_eq!(report.summary.activities, 4);
        assert_eq!(report.summary.alerts, 3);
        assert_eq!(report.summary.temporal_overlap, 1);
        assert_eq!(report.summary.insufficient_travel_time, 2);
        assert_eq!(h.activities.batches.lock().await.len(), 1);
        assert_eq!(h.alerts.alerts.lock().await.len(), 3);
        assert_eq!(h.sink.published.lock().await.len(), 1);
        assert!(report
            .alerts
            .iter()
            .all(|alert| alert.fingerprint.len() == 64 && alert.run_id == report.run_id));
    }

    #[tokio::test]
    async fn snapshot_policy_keeps_every_run() {
        let h = harness(DedupPolicy::Snapshot);
        let first = run_audit(&h.state).await.expect("first run");
        let second = run_audit(&h.state).await.expect("second run");
        assert_eq!(first.report().alerts.len(), second.report().alerts.len());
        assert_ne!(first.report().run_id, second.report().run_id);
        assert_eq!(h.alerts.alerts.lock().await.len(), 6);

        let ids: HashSet<String> = h
            .alerts
            .alerts
            .lock()
            .await
            .iter()
            .map(|alert| alert.external_id.clone())
            .collect();
        assert_eq!(ids.len(), 6);
    }

    #[tokio::test]
    async fn content_hash_policy_skips_stored_alerts() {
        let h = harness(DedupPolicy::ContentHash);
        run_audit(&h.state).await.expect("first run");
        let second = run_audit(&h.state).await.expect("second run");
        assert_eq!(second.report().alerts.len(), 0);
        assert_eq!(second.report().summary.dedup_skipped, 3);
        assert_eq!(h.alerts.alerts.lock().await.len(), 3);
    }

    #[tokio::test]
    async fn concurrent_run_gets_cache_or_error() {
        let h = harness(DedupPolicy::Snapshot);
        let dataset = h.state.source.dataset_key();

        let guard = h.state.run_cache.try_begin(&dataset).expect("guard");
        match run_audit(&h.state).await {
            Err(AppError::RunInProgress(key)) => assert_eq!(key, dataset),
            other => panic!("unexpected result: {:?}", other.map(|r| r.is_stale())),
        }
        drop(guard);

        let fresh = run_audit(&h.state).await.expect("run");
        let _guard = h.state.run_cache.try_begin(&dataset).expect("guard");
        let cached = run_audit(&h.state).await.expect("cached");
        assert!(cached.is_stale());
        assert_eq!(cached.report().run_id, fresh.report().run_id);
    }

    #[tokio::test]
    async fn persistence_failure_fails_run() {
        let h = harness(DedupPolicy::Snapshot);
        h.activities.fail.store(true, Ordering::SeqCst);
        match run_audit(&h.state).await {
            Err(AppError::Persistence(err)) => assert!(err.to_string().contains("offline")),
            other => panic!("unexpected result: {:?}", other.map(|r| r.is_stale())),
        }
        assert!(h.alerts.alerts.lock().await.is_empty());
        assert!(h.state.metrics.render_prometheus().contains("fieldwatch_run_failures_total 1\n"));
    }

    #[tokio::test]
    async fn alert_write_failure_leaves_no_batch() {
        let h = harness(DedupPolicy::Snapshot);
        h.alerts.fail.store(true, Ordering::SeqCst);
        assert!(matches!(
            run_audit(&h.state).await,
            Err(AppError::Persistence(_))
        ));
        assert!(h.activities.batches.lock().await.is_empty());
        assert!(h.alerts.alerts.lock().await.is_empty());
        assert!(h.sink.published.lock().await.is_empty());
    }

    #[tokio::test]
    async fn batch_failure_withdraws_only_this_runs_alerts() {
        let h = harness(DedupPolicy::Snapshot);
        let first = run_audit(&h.state).await.expect("first run");
        h.activities.fail.store(true, Ordering::SeqCst);
        let second = run_audit(&h.state).await.expect("stale result");
        assert!(second.is_stale());

        let stored = h.alerts.alerts.lock().await;
        assert_eq!(stored.len(), 3);
        assert!(stored
            .iter()
            .all(|alert| alert.run_id == first.report().run_id));
        assert_eq!(h.activities.batches.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn failure_after_success_returns_stale_result() {
        let h = harness(DedupPolicy::Snapshot);
        let fresh = run_audit(&h.state).await.expect("run");
        h.activities.fail.store(true, Ordering::SeqCst);
        let response = run_audit(&h.state).await.expect("stale result");
        match response {
            RunResponse::Cached { report, reason } => {
                assert_eq!(report.run_id, fresh.report().run_id);
                assert!(reason.contains("persistence failed"));
            }
            RunResponse::Fresh(_) => panic!("expected cached result"),
        }
    }

    #[test]
    fn fingerprint_ignores_run_identity() {
        let activities = crate::testing::scenario_activities();
        let engine = RulesEngine::with_defaults(
            fieldwatch_domain::TravelPolicy::default(),
            crate::testing::scenario_directory(),
        );
        let mut a = AlertFactory::new(RunId::generate(), Utc::now());
        let mut b = AlertFactory::new(RunId::generate(), Utc::now());
        let first = engine.evaluate(&activities, &mut a).alerts;
        let second = engine.evaluate(&activities, &mut b).alerts;
        assert_eq!(first[0].category, AlertCategory::TemporalOverlap);
        assert_eq!(alert_fingerprint(&first[0]), alert_fingerprint(&second[0]));
        assert_ne!(alert_fingerprint(&first[0]), alert_fingerprint(&first[1]));
    }
}
