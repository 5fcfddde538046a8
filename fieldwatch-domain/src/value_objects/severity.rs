// Severity value object

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critico,
    Alto,
    Medio,
    Basso,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critico => "CRITICO",
            Severity::Alto => "ALTO",
            Severity::Medio => "MEDIO",
            Severity::Basso => "BASSO",
        }
    }

    /// Priority used when the enrichment service cannot be reached.
    pub fn fallback_priority(&self) -> u8 {
        match self {
            Severity::Critico => 5,
            Severity::Alto => 3,
            Severity::Medio | Severity::Basso => 2,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Severity {
    fn from(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "CRITICO" => Severity::Critico,
            "ALTO" => Severity::Alto,
            "BASSO" => Severity::Basso,
            _ => Severity::Medio,
        }
    }
}
