use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    runs: AtomicU64,
    run_failures: AtomicU64,
    files_loaded: AtomicU64,
    files_failed: AtomicU64,
    rows: AtomicU64,
    activities: AtomicU64,
    alerts: AtomicU64,
    dedup_skipped: AtomicU64,
    enrichment_fallbacks: AtomicU64,
}

impl Metrics {
    pub fn record_ingest(&self, loaded: usize, failed: usize, rows: usize, activities: usize) {
        self.files_loaded.fetch_add(loaded as u64, Ordering::Relaxed);
        self.files_failed.fetch_add(failed as u64, Ordering::Relaxed);
        self.rows.fetch_add(rows as u64, Ordering::Relaxed);
        self.activities
            .fetch_add(activities as u64, Ordering::Relaxed);
    }

    pub fn record_run(&self, alerts: usize, dedup_skipped: usize) {
        self.runs.fetch_add(1, Ordering::Relaxed);
        self.alerts.fetch_add(alerts as u64, Ordering::Relaxed);
        self.dedup_skipped
            .fetch_add(dedup_skipped as u64, Ordering::Relaxed);
    }

    pub fn record_run_failure(&self) {
        self.run_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_enrichment_fallback(&self) {
        self.enrichment_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn render_prometheus(&self) -> String {
        let counters = [
            ("fieldwatch_runs_total", &self.runs),
            ("fieldwatch_run_failures_total", &self.run_failures),
            ("fieldwatch_files_loaded_total", &self.files_loaded),
            ("fieldwatch_files_failed_total", &self.files_failed),
            ("fieldwatch_rows_total", &self.rows),
            ("fieldwatch_activities_total", &self.activities),
            ("fieldwatch_alerts_total", &self.alerts),
            ("fieldwatch_dedup_skipped_total", &self.dedup_skipped),
            ("fieldwatch_enrichment_fallbacks_total", &self.enrichment_fallbacks),
        ];
        let mut out = String::new();
        for (name, counter) in counters {
            out.push_str(&format!(
                "# TYPE {name} counter\n{name} {}\n",
                counter.load(Ordering::Relaxed)
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_counters() {
        let metrics = Metrics::default();
        metrics.record_ingest(6, 1, 120, 40);
        metrics.record_run(3, 1);
        let rendered = metrics.render_prometheus();
        assert!(rendered.contains("fieldwatch_runs_total 1\n"));
        assert!(rendered.contains("fieldwatch_files_failed_total 1\n"));
        assert!(rendered.contains("fieldwatch_alerts_total 3\n"));
        assert!(rendered.contains("# TYPE fieldwatch_rows_total counter\n"));
    }
}
