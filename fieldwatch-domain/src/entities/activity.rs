// Activity entity
// One normalized row of the activities feed

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::utils::minutes_between;
use crate::value_objects::BatchId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub ticket_id: String,
    pub technician: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub duration_hours: f64,
    pub source_file: String,
    pub batch_id: BatchId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub validated: bool,
}

impl Activity {
    /// Both endpoints, or `None` when either timestamp failed to parse.
    pub fn interval(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    pub fn is_timed(&self) -> bool {
        self.interval().is_some()
    }

    pub fn client_name(&self) -> &str {
        self.client.as_deref().map(str::trim).unwrap_or_default()
    }

    /// Half-open interval intersection; touching endpoints do not overlap.
    pub fn overlaps(&self, other: &Activity) -> bool {
        match (self.interval(), other.interval()) {
            (Some((start1, end1)), Some((start2, end2))) => !(end1 <= start2 || end2 <= start1),
            _ => false,
        }
    }

    pub fn overlap_minutes(&self, other: &Activity) -> f64 {
        match (self.interval(), other.interval()) {
            (Some((start1, end1)), Some((start2, end2))) if self.overlaps(other) => {
                minutes_between(start1.max(start2), end1.min(end2))
            }
            _ => 0.0,
        }
    }

    /// Signed gap from the end of this activity to the start of `next`.
    pub fn minutes_until(&self, next: &Activity) -> Option<f64> {
        match (self.ended_at, next.started_at) {
            (Some(end), Some(start)) => Some(minutes_between(end, start)),
            _ => None,
        }
    }

    pub fn same_day_as(&self, other: &Activity) -> bool {
        match (self.started_at, other.started_at) {
            (Some(a), Some(b)) => a.date() == b.date(),
            _ => false,
        }
    }

    /// Both endpoints must fall in the 9-13 or 14-18 hour windows.
    pub fn is_during_working_hours(&self) -> bool {
        match self.interval() {
            Some((start, end)) => in_working_window(start.hour()) && in_working_window(end.hour()),
            None => false,
        }
    }

    pub fn is_remote(&self) -> bool {
        self.activity_type
            .as_deref()
            .map(|kind| kind.to_lowercase().contains("remot"))
            .unwrap_or(false)
    }

    pub fn mark_validated(&mut self) {
        self.validated = true;
    }
}

fn in_working_window(hour: u32) -> bool {
    (9..=13).contains(&hour) || (14..=18).contains(&hour)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technician {
    pub name: String,
    pub active: bool,
}

impl Technician {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityBatch {
    pub batch_id: BatchId,
    pub activities: Vec<Activity>,
    pub technicians: Vec<Technician>,
}

impl ActivityBatch {
    pub fn new(batch_id: BatchId, activities: Vec<Activity>) -> Self {
        let mut names: Vec<String> = activities.iter().map(|a| a.technician.clone()).collect();
        names.sort();
        names.dedup();
        Self {
            batch_id,
            activities,
            technicians: names.into_iter().map(Technician::new).collect(),
        }
    }
}
