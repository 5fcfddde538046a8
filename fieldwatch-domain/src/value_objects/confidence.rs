// Confidence value object
// The level is always derived from the score; there is no way to set it directly.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceLevel {
    MoltoAlta,
    Alta,
    Media,
    Bassa,
    MoltoBassa,
}

impl ConfidenceLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            ConfidenceLevel::MoltoAlta
        } else if score >= 70.0 {
            ConfidenceLevel::Alta
        } else if score >= 50.0 {
            ConfidenceLevel::Media
        } else if score >= 30.0 {
            ConfidenceLevel::Bassa
        } else {
            ConfidenceLevel::MoltoBassa
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::MoltoAlta => "MOLTO_ALTA",
            ConfidenceLevel::Alta => "ALTA",
            ConfidenceLevel::Media => "MEDIA",
            ConfidenceLevel::Bassa => "BASSA",
            ConfidenceLevel::MoltoBassa => "MOLTO_BASSA",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "ConfidenceRepr")]
pub struct Confidence {
    score: f64,
    level: ConfidenceLevel,
}

impl Confidence {
    pub fn new(score: f64) -> Self {
        let score = if score.is_finite() {
            score.clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self {
            score,
            level: ConfidenceLevel::from_score(score),
        }
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn level(&self) -> ConfidenceLevel {
        self.level
    }

    pub fn meets(&self, threshold: f64) -> bool {
        self.score >= threshold
    }
}

// Stored levels are ignored on read and recomputed from the score.
#[derive(Deserialize)]
struct ConfidenceRepr {
    score: f64,
}

impl From<ConfidenceRepr> for Confidence {
    fn from(repr: ConfidenceRepr) -> Self {
        Confidence::new(repr.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_thresholds() {
        assert_eq!(Confidence::new(95.0).level(), ConfidenceLevel::MoltoAlta);
        assert_eq!(Confidence::new(90.0).level(), ConfidenceLevel::MoltoAlta);
        assert_eq!(Confidence::new(89.9).level(), ConfidenceLevel::Alta);
        assert_eq!(Confidence::new(70.0).level(), ConfidenceLevel::Alta);
        assert_eq!(Confidence::new(50.0).level(), ConfidenceLevel::Media);
        assert_eq!(Confidence::new(30.0).level(), ConfidenceLevel::Bassa);
        assert_eq!(Confidence::new(29.0).level(), ConfidenceLevel::MoltoBassa);
    }

    #[test]
    fn score_is_clamped() {
        assert_eq!(Confidence::new(140.0).score(), 100.0);
        assert_eq!(Confidence::new(-3.0).score(), 0.0);
        assert_eq!(Confidence::new(f64::NAN).score(), 0.0);
    }

    #[test]
    fn deserialization_recomputes_level() {
        let raw = r#"{"score": 95.0, "level": "BASSA"}"#;
        let confidence: Confidence = serde_json::from_str(raw).expect("parse confidence");
        assert_eq!(confidence.level(), ConfidenceLevel::MoltoAlta);
    }
}
