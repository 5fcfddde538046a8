// Run report entity
// What a completed audit run publishes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{Alert, AlertCategory, DedupPolicy, FeedReport};
use crate::value_objects::Severity;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub files_loaded: usize,
    pub files_failed: usize,
    pub rows: usize,
    pub activities: usize,
    pub skipped_rows: usize,
    pub alerts: usize,
    pub dedup_skipped: usize,
    pub critical: usize,
    pub temporal_overlap: usize,
    pub insufficient_travel_time: usize,
}

impl RunSummary {
    pub fn count_alerts(&mut self, alerts: &[Alert]) {
        self.alerts = alerts.len();
        self.critical = alerts
            .iter()
            .filter(|alert| alert.severity == Severity::Critico)
            .count();
        self.temporal_overlap = alerts
            .iter()
            .filter(|alert| alert.category == AlertCategory::TemporalOverlap)
            .count();
        self.insufficient_travel_time = alerts
            .iter()
            .filter(|alert| alert.category == AlertCategory::InsufficientTravelTime)
            .count();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub batch_id: String,
    pub dataset: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dedup_policy: DedupPolicy,
    pub summary: RunSummary,
    pub feeds: Vec<FeedReport>,
    pub alerts: Vec<Alert>,
}

impl RunReport {
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
