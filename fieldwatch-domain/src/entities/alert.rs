// Alert entity
// Produced by the rules engine; mutated only through resolve / false-positive

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::Activity;
use crate::value_objects::{Confidence, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    TemporalOverlap,
    InsufficientTravelTime,
}

impl AlertCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCategory::TemporalOverlap => "temporal_overlap",
            AlertCategory::InsufficientTravelTime => "insufficient_travel_time",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "temporal_overlap" => Some(AlertCategory::TemporalOverlap),
            "insufficient_travel_time" => Some(AlertCategory::InsufficientTravelTime),
            _ => None,
        }
    }
}

impl std::fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessImpact {
    Billing,
    Operational,
}

impl BusinessImpact {
    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessImpact::Billing => "billing",
            BusinessImpact::Operational => "operational",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "billing" => Some(BusinessImpact::Billing),
            "operational" => Some(BusinessImpact::Operational),
            _ => None,
        }
    }
}

/// The slice of an activity that an alert keeps as evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySnapshot {
    pub ticket_id: String,
    pub client: String,
    pub started_at: Option<NaiveDateTime>,
    pub ended_at: Option<NaiveDateTime>,
}

impl From<&Activity> for ActivitySnapshot {
    fn from(activity: &Activity) -> Self {
        Self {
            ticket_id: activity.ticket_id.clone(),
            client: activity.client_name().to_string(),
            started_at: activity.started_at,
            ended_at: activity.ended_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertDetails {
    TemporalOverlap {
        first: ActivitySnapshot,
        second: ActivitySnapshot,
        overlap_minutes: i64,
    },
    InsufficientTravelTime {
        previous: ActivitySnapshot,
        next: ActivitySnapshot,
        travel_minutes: i64,
        required_minutes: i64,
        distance_km: f64,
    },
}

impl AlertDetails {
    pub fn category(&self) -> AlertCategory {
        match self {
            AlertDetails::TemporalOverlap { .. } => AlertCategory::TemporalOverlap,
            AlertDetails::InsufficientTravelTime { .. } => AlertCategory::InsufficientTravelTime,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub external_id: String,
    pub run_id: String,
    pub severity: Severity,
    pub confidence: Confidence,
    pub technician: String,
    pub message: String,
    pub category: AlertCategory,
    pub details: AlertDetails,
    pub business_impact: BusinessImpact,
    pub suggested_actions: Vec<String>,
    pub data_sources: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub false_positive: bool,
    #[serde(default)]
    pub fingerprint: String,
}

impl Alert {
    pub fn resolve(&mut self, by: Option<String>, now: DateTime<Utc>) {
        self.resolved = true;
        self.resolved_by = by;
        self.resolved_at = Some(now);
    }

    /// A false positive is also resolved.
    pub fn mark_false_positive(&mut self, by: Option<String>, now: DateTime<Utc>) {
        self.false_positive = true;
        self.resolve(by, now);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertQuery {
    pub technician: Option<String>,
    pub category: Option<AlertCategory>,
    pub unresolved_only: bool,
    pub limit: Option<usize>,
}

impl AlertQuery {
    pub fn matches(&self, alert: &Alert) -> bool {
        if let Some(technician) = &self.technician {
            if !alert.technician.eq_ignore_ascii_case(technician.trim()) {
                return false;
            }
        }
        if let Some(category) = self.category {
            if alert.category != category {
                return false;
            }
        }
        !(self.unresolved_only && alert.resolved)
    }
}
