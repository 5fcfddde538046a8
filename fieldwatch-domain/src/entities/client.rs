// Client entity and directory

use serde::{Deserialize, Serialize};

use crate::value_objects::ClientZone;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<ClientZone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default)]
    pub same_group: bool,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Client {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            latitude: None,
            longitude: None,
            zone: None,
            group_id: None,
            same_group: false,
            active: true,
        }
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    /// Records without a zone count as central metro.
    pub fn effective_zone(&self) -> ClientZone {
        self.zone.unwrap_or(ClientZone::CentralMetro)
    }

    pub fn is_same_group_as(&self, other: &Client) -> bool {
        if !(self.same_group && other.same_group) {
            return false;
        }
        match (&self.group_id, &other.group_id) {
            (Some(a), Some(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientDirectory {
    #[serde(default)]
    pub clients: Vec<Client>,
}

impl ClientDirectory {
    pub fn new(clients: Vec<Client>) -> Self {
        Self { clients }
    }

    /// Exact case-insensitive name first, then a directory name containing the query.
    pub fn find(&self, name: &str) -> Option<&Client> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.clients
            .iter()
            .find(|client| client.name.trim().to_lowercase() == needle)
            .or_else(|| {
                self.clients
                    .iter()
                    .find(|client| client.name.to_lowercase().contains(&needle))
            })
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_prefers_exact_match() {
        let directory = ClientDirectory::new(vec![
            Client::named("ACME Logistica SRL"),
            Client::named("ACME"),
        ]);
        let found = directory.find("acme").expect("client");
        assert_eq!(found.name, "ACME");
        let partial = directory.find("logistica").expect("client");
        assert_eq!(partial.name, "ACME Logistica SRL");
        assert!(directory.find("  ").is_none());
    }

    #[test]
    fn same_group_requires_flag_and_matching_id() {
        let mut a = Client::named("A");
        let mut b = Client::named("B");
        a.group_id = Some("north".to_string());
        b.group_id = Some("NORTH".to_string());
        assert!(!a.is_same_group_as(&b));
        a.same_group = true;
        b.same_group = true;
        assert!(a.is_same_group_as(&b));
    }
}
