// Deterministic enrichment used when the external service is unavailable

use crate::entities::{Alert, AlertCategory, Enrichment};
use crate::value_objects::Severity;

pub fn fallback_enrichment(alert: &Alert) -> Enrichment {
    Enrichment {
        priority_level: alert.severity.fallback_priority(),
        risk_assessment: standard_risk_assessment(alert.severity).to_string(),
        recommended_actions: standard_actions(alert.category),
        financial_impact: 0.0,
        fallback: true,
    }
}

pub fn standard_actions(category: AlertCategory) -> Vec<String> {
    let actions: &[&str] = match category {
        AlertCategory::TemporalOverlap => &[
            "Contact technician immediately",
            "Review and adjust schedule",
            "Investigate billing implications",
        ],
        AlertCategory::InsufficientTravelTime => &[
            "Verify travel route and time",
            "Update time allocation",
            "Check geographic feasibility",
        ],
    };
    actions.iter().map(|action| action.to_string()).collect()
}

pub fn standard_risk_assessment(severity: Severity) -> &'static str {
    match severity {
        Severity::Critico => "HIGH RISK - Immediate action required. Potential billing/compliance impact.",
        Severity::Alto => "MEDIUM RISK - Review within 24h. Monitor for escalation.",
        Severity::Medio => "LOW RISK - Review when convenient. No immediate impact expected.",
        Severity::Basso => "UNKNOWN RISK - Manual assessment required.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_follows_severity() {
        assert!(standard_risk_assessment(Severity::Critico).starts_with("HIGH RISK"));
        assert!(standard_risk_assessment(Severity::Medio).starts_with("LOW RISK"));
        assert!(standard_risk_assessment(Severity::Basso).starts_with("UNKNOWN RISK"));
    }

    #[test]
    fn travel_category_has_its_own_actions() {
        let actions = standard_actions(AlertCategory::InsufficientTravelTime);
        assert_eq!(actions[0], "Verify travel route and time");
        assert_eq!(standard_actions(AlertCategory::TemporalOverlap).len(), 3);
    }
}
