use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, NaiveTime, TimeZone};
use tokio::fs;
use tracing::{error, info, warn};

use fieldwatch_application::commands::audit_commands::run_audit;
use fieldwatch_application::AppState;
use fieldwatch_domain::ports::ReportSink;
use fieldwatch_domain::{RunReport, RuntimeConfig};

pub const METRICS_FILE: &str = "metrics.prom";

/// Writes `<report_dir>/<YYYY-MM-DD>/<run_id>.json` and refreshes the day's metrics snapshot.
pub struct FileReportSink {
    report_dir: PathBuf,
}

impl FileReportSink {
    pub fn new(report_dir: impl Into<PathBuf>) -> Self {
        Self {
            report_dir: report_dir.into(),
        }
    }

    pub fn report_path(&self, report: &RunReport) -> PathBuf {
        self.day_dir(report).join(format!("{}.json", report.run_id))
    }

    fn day_dir(&self, report: &RunReport) -> PathBuf {
        self.report_dir
            .join(report.started_at.format("%Y-%m-%d").to_string())
    }
}

#[async_trait]
impl ReportSink for FileReportSink {
    async fn publish(&self, report: &RunReport, metrics: &str) -> Result<String> {
        let day_dir = self.day_dir(report);
        fs::create_dir_all(&day_dir).await?;

        let path = self.report_path(report);
        let body = serde_json::to_vec_pretty(report)?;
        fs::write(&path, body).await?;
        fs::write(day_dir.join(METRICS_FILE), metrics).await?;

        let location = path.to_string_lossy().to_string();
        info!(path = %location, alerts = report.alerts.len(), "run report written");
        Ok(location)
    }
}

/// Runs the audit once a day at the configured local time, forever.
pub async fn schedule_runs(state: AppState) {
    loop {
        let next = next_run_time(&state.config, Local::now());
        let duration = next.signed_duration_since(Local::now());
        let sleep_ms = duration.num_milliseconds().max(0) as u64;
        info!(next = %next, "next scheduled audit run");
        tokio::time::sleep(std::time::Duration::from_millis(sleep_ms)).await;

        match run_audit(&state).await {
            Ok(response) if response.is_stale() => {
                warn!(run_id = %response.report().run_id, "scheduled run returned a cached result")
            }
            Ok(response) => {
                info!(run_id = %response.report().run_id, "scheduled run finished")
            }
            Err(err) => error!("scheduled run failed: {}", err),
        }
    }
}

pub fn next_run_time(config: &RuntimeConfig, now: DateTime<Local>) -> DateTime<Local> {
    let at = NaiveTime::from_hms_opt(config.schedule_hour, config.schedule_minute, 0)
        .unwrap_or(NaiveTime::MIN);
    let today = now.date_naive().and_time(at);
    let candidate = if today > now.naive_local() {
        today
    } else {
        today + Duration::days(1)
    };
    // A local time skipped by a DST jump resolves to an hour later.
    Local
        .from_local_datetime(&candidate)
        .earliest()
        .or_else(|| {
            Local
                .from_local_datetime(&(candidate + Duration::hours(1)))
                .earliest()
        })
        .unwrap_or_else(|| now + Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Timelike, Utc};
    use fieldwatch_domain::{DedupPolicy, RunSummary};
    use tempfile::tempdir;

    fn runtime_config(hour: u32, minute: u32) -> RuntimeConfig {
        RuntimeConfig {
            input_dirs: vec!["./upload_csv".to_string()],
            max_file_bytes: 1024,
            technician_roster: Vec::new(),
            rules_path: "rules.yaml".to_string(),
            clients_path: "clients.yaml".to_string(),
            overlap_min_confidence: 70.0,
            travel_min_confidence: 60.0,
            dedup_policy: DedupPolicy::Snapshot,
            result_cache_ttl_seconds: 300,
            report_dir: "./reports".to_string(),
            enrichment_url: None,
            enrichment_token: None,
            enrichment_model: "model".to_string(),
            enrichment_history_limit: 10,
            request_timeout_seconds: 5,
            schedule_hour: hour,
            schedule_minute: minute,
        }
    }

    fn empty_report() -> RunReport {
        let started_at = Utc.with_ymd_and_hms(2025, 3, 4, 6, 30, 0).single().expect("time");
        RunReport {
            run_id: "run1".to_string(),
            batch_id: "batch_1".to_string(),
            dataset: "./upload_csv".to_string(),
            started_at,
            finished_at: started_at + Duration::seconds(2),
            dedup_policy: DedupPolicy::Snapshot,
            summary: RunSummary::default(),
            feeds: Vec::new(),
            alerts: Vec::new(),
        }
    }

    #[tokio::test]
    async fn publish_writes_report_and_metrics() {
        let dir = tempdir().expect("tempdir");
        let sink = FileReportSink::new(dir.path());
        let report = empty_report();

        let location = sink
            .publish(&report, "fieldwatch_runs_total 1\n")
            .await
            .expect("publish");
        let expected = dir.path().join("2025-03-04").join("run1.json");
        assert_eq!(PathBuf::from(&location), expected);

        let written: RunReport =
            serde_json::from_slice(&std::fs::read(&expected).expect("read report")).expect("json");
        assert_eq!(written.run_id, "run1");
        let metrics = std::fs::read_to_string(dir.path().join("2025-03-04").join(METRICS_FILE))
            .expect("metrics");
        assert!(metrics.contains("fieldwatch_runs_total 1"));
    }

    #[test]
    fn next_run_is_later_today_or_tomorrow() {
        let now = Local
            .with_ymd_and_hms(2025, 3, 4, 5, 0, 0)
            .earliest()
            .expect("now");
        let later = next_run_time(&runtime_config(6, 30), now);
        assert_eq!(later.date_naive(), now.date_naive());
        assert_eq!((later.hour(), later.minute()), (6, 30));

        let passed = next_run_time(&runtime_config(4, 0), now);
        assert_eq!(passed.date_naive(), now.date_naive() + Duration::days(1));
        assert!(passed > now);
    }
}
