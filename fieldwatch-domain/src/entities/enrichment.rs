use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    pub priority_level: u8,
    pub risk_assessment: String,
    pub recommended_actions: Vec<String>,
    pub financial_impact: f64,
    #[serde(default)]
    pub fallback: bool,
}

impl Enrichment {
    pub fn clamp_priority(value: i64) -> u8 {
        value.clamp(1, 5) as u8
    }
}
