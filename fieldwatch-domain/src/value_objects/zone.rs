// Client zone value object

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientZone {
    #[serde(alias = "CENTRAL_MILAN", alias = "central")]
    CentralMetro,
    #[serde(alias = "periphery")]
    Periphery,
    #[serde(alias = "industrial")]
    Industrial,
}

impl ClientZone {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientZone::CentralMetro => "CENTRAL_METRO",
            ClientZone::Periphery => "PERIPHERY",
            ClientZone::Industrial => "INDUSTRIAL",
        }
    }
}

impl From<&str> for ClientZone {
    fn from(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "PERIPHERY" => ClientZone::Periphery,
            "INDUSTRIAL" => ClientZone::Industrial,
            _ => ClientZone::CentralMetro,
        }
    }
}
