use std::collections::BTreeMap;

use tracing::debug;

use crate::entities::{Activity, Alert, ClientDirectory, TravelPolicy};
use crate::services::{
    AlertFactory, OverlapDetector, TravelTimeValidator, DEFAULT_OVERLAP_MIN_CONFIDENCE,
    DEFAULT_TRAVEL_MIN_CONFIDENCE,
};

#[derive(Debug, Clone, Default)]
pub struct RulesOutcome {
    pub alerts: Vec<Alert>,
    pub technicians: usize,
    pub timed_activities: usize,
    pub untimed_activities: usize,
}

/// Runs the fixed rule sequence over one activity set.
#[derive(Debug, Clone)]
pub struct RulesEngine {
    overlap: OverlapDetector,
    travel: TravelTimeValidator,
}

impl RulesEngine {
    pub fn new(overlap: OverlapDetector, travel: TravelTimeValidator) -> Self {
        Self { overlap, travel }
    }

    pub fn with_defaults(policy: TravelPolicy, directory: ClientDirectory) -> Self {
        Self::new(
            OverlapDetector::new(DEFAULT_OVERLAP_MIN_CONFIDENCE),
            TravelTimeValidator::new(policy, directory, DEFAULT_TRAVEL_MIN_CONFIDENCE),
        )
    }

    pub fn evaluate(&self, activities: &[Activity], factory: &mut AlertFactory) -> RulesOutcome {
        let by_technician = group_by_technician(activities);
        let timed_activities = activities.iter().filter(|a| a.is_timed()).count();

        let mut alerts = Vec::new();
        for (technician, list) in &by_technician {
            for finding in self.overlap.scan(list) {
                alerts.push(factory.overlap_alert(technician, &finding));
            }
        }
        for (technician, list) in &by_technician {
            for finding in self.travel.scan(list) {
                alerts.push(factory.travel_alert(technician, &finding));
            }
        }
        alerts.extend(self.validate_activity_type(&by_technician));
        alerts.extend(self.validate_vehicle_usage(&by_technician));

        RulesOutcome {
            alerts,
            technicians: by_technician.len(),
            timed_activities,
            untimed_activities: activities.len() - timed_activities,
        }
    }

    // Cross-check of declared activity type against remote sessions; no rule defined yet.
    fn validate_activity_type(&self, by_technician: &BTreeMap<&str, Vec<&Activity>>) -> Vec<Alert> {
        let remote = by_technician
            .values()
            .flatten()
            .filter(|activity| activity.is_remote())
            .count();
        debug!(remote, "activity type validation produced no findings");
        Vec::new()
    }

    fn validate_vehicle_usage(&self, by_technician: &BTreeMap<&str, Vec<&Activity>>) -> Vec<Alert> {
        debug!(
            technicians = by_technician.len(),
            "vehicle usage validation produced no findings"
        );
        Vec::new()
    }
}

fn group_by_technician(activities: &[Activity]) -> BTreeMap<&str, Vec<&Activity>> {
    let mut grouped: BTreeMap<&str, Vec<&Activity>> = BTreeMap::new();
    for activity in activities {
        let technician = activity.technician.trim();
        if technician.is_empty() {
            continue;
        }
        grouped.entry(technician).or_default().push(activity);
    }
    grouped
}
