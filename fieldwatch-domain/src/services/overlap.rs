// Temporal overlap detection for a single technician

use crate::entities::Activity;
use crate::value_objects::Confidence;

pub const DEFAULT_OVERLAP_MIN_CONFIDENCE: f64 = 70.0;

#[derive(Debug, Clone)]
pub struct OverlapFinding<'a> {
    pub first: &'a Activity,
    pub second: &'a Activity,
    pub overlap_minutes: f64,
    pub confidence: Confidence,
}

impl OverlapFinding<'_> {
    pub fn same_client(&self) -> bool {
        self.first.client_name() == self.second.client_name()
    }
}

#[derive(Debug, Clone)]
pub struct OverlapDetector {
    min_confidence: f64,
}

impl Default for OverlapDetector {
    fn default() -> Self {
        Self::new(DEFAULT_OVERLAP_MIN_CONFIDENCE)
    }
}

impl OverlapDetector {
    pub fn new(min_confidence: f64) -> Self {
        Self { min_confidence }
    }

    /// Pairwise scan; untimed activities are ignored.
    pub fn scan<'a>(&self, activities: &[&'a Activity]) -> Vec<OverlapFinding<'a>> {
        let mut timed: Vec<&'a Activity> = activities
            .iter()
            .copied()
            .filter(|activity| activity.is_timed())
            .collect();
        timed.sort_by_key(|activity| activity.started_at);

        let mut findings = Vec::new();
        for (i, &first) in timed.iter().enumerate() {
            for &second in timed.iter().skip(i + 1) {
                if !first.overlaps(second) {
                    continue;
                }
                let overlap_minutes = first.overlap_minutes(second);
                let confidence = overlap_confidence(first, second, overlap_minutes);
                if confidence.meets(self.min_confidence) {
                    findings.push(OverlapFinding {
                        first,
                        second,
                        overlap_minutes,
                        confidence,
                    });
                }
            }
        }
        findings
    }
}

pub fn overlap_confidence(first: &Activity, second: &Activity, overlap_minutes: f64) -> Confidence {
    let mut score: f64 = 50.0;
    score += if overlap_minutes > 60.0 {
        40.0
    } else if overlap_minutes > 30.0 {
        30.0
    } else if overlap_minutes > 15.0 {
        20.0
    } else {
        10.0
    };
    if first.client_name() != second.client_name() {
        score += 20.0;
    }
    if first.same_day_as(second) {
        score += 10.0;
    }
    if first.is_during_working_hours() && second.is_during_working_hours() {
        score += 10.0;
    }
    Confidence::new(score.min(100.0))
}
