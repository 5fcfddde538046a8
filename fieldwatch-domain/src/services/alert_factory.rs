// Alert construction for rule findings

use chrono::{DateTime, Utc};

use crate::entities::{
    ActivitySnapshot, Alert, AlertCategory, AlertDetails, BusinessImpact, FeedKind,
};
use crate::services::{OverlapFinding, TravelFinding};
use crate::value_objects::{Confidence, RunId, Severity};

pub struct AlertFactory {
    run_id: RunId,
    date_stamp: String,
    created_at: DateTime<Utc>,
    data_sources: Vec<String>,
    sequence: u64,
}

impl AlertFactory {
    pub fn new(run_id: RunId, created_at: DateTime<Utc>) -> Self {
        Self {
            date_stamp: created_at.format("%Y%m%d").to_string(),
            run_id,
            created_at,
            data_sources: vec![FeedKind::Activities.source_label().to_string()],
            sequence: 0,
        }
    }

    pub fn with_data_sources(mut self, sources: Vec<String>) -> Self {
        if !sources.is_empty() {
            self.data_sources = sources;
        }
        self
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn issued(&self) -> u64 {
        self.sequence
    }

    /// `FW_<YYYYMMDD>_<run uuid>_<sequence>`, unique across runs through the run uuid.
    pub fn next_external_id(&mut self) -> String {
        self.sequence += 1;
        format!("FW_{}_{}_{}", self.date_stamp, self.run_id, self.sequence)
    }

    pub fn overlap_alert(&mut self, technician: &str, finding: &OverlapFinding<'_>) -> Alert {
        let first = ActivitySnapshot::from(finding.first);
        let second = ActivitySnapshot::from(finding.second);
        let overlap_minutes = finding.overlap_minutes.round() as i64;
        let message = format!(
            "{}: sovrapposizione temporale clienti {} e {} ({} min)",
            technician, first.client, second.client, overlap_minutes
        );
        let business_impact = if finding.same_client() {
            BusinessImpact::Billing
        } else {
            BusinessImpact::Operational
        };
        let details = AlertDetails::TemporalOverlap {
            first,
            second,
            overlap_minutes,
        };
        self.build(
            technician,
            Severity::Critico,
            finding.confidence,
            message,
            details,
            business_impact,
        )
    }

    pub fn travel_alert(&mut self, technician: &str, finding: &TravelFinding<'_>) -> Alert {
        let previous = ActivitySnapshot::from(finding.previous);
        let next = ActivitySnapshot::from(finding.next);
        let travel_minutes = finding.travel_minutes.round() as i64;
        let required_minutes = finding.required_minutes.ceil() as i64;
        let message = format!(
            "{}: tempo viaggio insufficiente {} -> {} ({} min disponibili, {} min richiesti)",
            technician,
            previous.client,
            next.client,
            travel_minutes,
            required_minutes
        );
        let details = AlertDetails::InsufficientTravelTime {
            previous,
            next,
            travel_minutes,
            required_minutes,
            distance_km: (finding.distance_km * 100.0).round() / 100.0,
        };
        self.build(
            technician,
            Severity::Medio,
            finding.confidence,
            message,
            details,
            BusinessImpact::Operational,
        )
    }

    fn build(
        &mut self,
        technician: &str,
        severity: Severity,
        confidence: Confidence,
        message: String,
        details: AlertDetails,
        business_impact: BusinessImpact,
    ) -> Alert {
        let category = details.category();
        Alert {
            external_id: self.next_external_id(),
            run_id: self.run_id.to_string(),
            severity,
            confidence,
            technician: technician.to_string(),
            message,
            category,
            details,
            business_impact,
            suggested_actions: suggested_actions(category),
            data_sources: self.data_sources.clone(),
            created_at: self.created_at,
            resolved: false,
            resolved_by: None,
            resolved_at: None,
            false_positive: false,
            fingerprint: String::new(),
        }
    }
}

pub fn suggested_actions(category: AlertCategory) -> Vec<String> {
    let actions: &[&str] = match category {
        AlertCategory::TemporalOverlap => {
            &["Verificare doppia fatturazione", "Controllare planning tecnico"]
        }
        AlertCategory::InsufficientTravelTime => {
            &["Verificare fattibilità spostamento", "Ottimizzare planning"]
        }
    };
    actions.iter().map(|action| action.to_string()).collect()
}
