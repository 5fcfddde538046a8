// Runtime configuration and rule tables

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// Every run is an independent audit snapshot.
    #[default]
    Snapshot,
    /// Skip alerts whose fingerprint is already stored.
    ContentHash,
}

impl DedupPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DedupPolicy::Snapshot => "snapshot",
            DedupPolicy::ContentHash => "content_hash",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Clickhouse,
    Memory,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub input_dirs: Vec<String>,
    pub max_file_bytes: u64,
    pub technician_roster: Vec<String>,
    pub rules_path: String,
    pub clients_path: String,
    pub overlap_min_confidence: f64,
    pub travel_min_confidence: f64,
    pub dedup_policy: DedupPolicy,
    pub result_cache_ttl_seconds: u64,
    pub report_dir: String,
    pub enrichment_url: Option<String>,
    pub enrichment_token: Option<String>,
    pub enrichment_model: String,
    pub enrichment_history_limit: usize,
    pub request_timeout_seconds: u64,
    pub schedule_hour: u32,
    pub schedule_minute: u32,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub storage: StorageBackend,
    pub clickhouse_url: String,
    pub clickhouse_database: String,
    pub clickhouse_user: Option<String>,
    pub clickhouse_password: Option<String>,
}

/// Exemption tables and travel constants used by the travel-time check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TravelPolicy {
    pub internal_whitelist: Vec<String>,
    pub client_groups: BTreeMap<String, Vec<String>>,
    pub default_distance_km: f64,
    pub average_speed_kmh: f64,
    pub min_travel_minutes: i64,
}

impl Default for TravelPolicy {
    fn default() -> Self {
        let mut client_groups = BTreeMap::new();
        client_groups.insert(
            "ELECTRALINE".to_string(),
            vec!["ELECTRALINE 3PMARK SPA".to_string()],
        );
        client_groups.insert(
            "SPOLIDORO".to_string(),
            vec!["SPOLIDORO STUDIO AVVOCATO".to_string()],
        );
        client_groups.insert(
            "ISOTERMA_GROUP".to_string(),
            vec!["ISOTERMA SRL".to_string(), "GARIBALDINA SRL".to_string()],
        );
        Self {
            internal_whitelist: vec![
                "BAIT Service S.r.l.".to_string(),
                "BAIT Service".to_string(),
                "BAIT".to_string(),
            ],
            client_groups,
            default_distance_km: 12.0,
            average_speed_kmh: 20.0,
            min_travel_minutes: 15,
        }
    }
}

impl TravelPolicy {
    pub fn is_whitelisted(&self, client: &str) -> bool {
        let haystack = client.to_lowercase();
        self.internal_whitelist.iter().any(|entry| {
            let needle = entry.trim().to_lowercase();
            !needle.is_empty() && haystack.contains(&needle)
        })
    }

    /// True when some group lists both clients; a client may belong to several groups.
    pub fn same_group(&self, a: &str, b: &str) -> bool {
        let (a, b) = (a.to_lowercase(), b.to_lowercase());
        self.client_groups
            .values()
            .any(|members| group_lists(members, &a) && group_lists(members, &b))
    }
}

fn group_lists(members: &[String], haystack: &str) -> bool {
    members.iter().any(|member| {
        let needle = member.trim().to_lowercase();
        !needle.is_empty() && haystack.contains(&needle)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitelist_is_case_insensitive_containment() {
        let policy = TravelPolicy::default();
        assert!(policy.is_whitelisted("bait service s.r.l. - sede"));
        assert!(!policy.is_whitelisted("ACME"));
    }

    #[test]
    fn group_membership() {
        let policy = TravelPolicy::default();
        assert!(policy.same_group("Isoterma SRL", "GARIBALDINA SRL Milano"));
        assert!(!policy.same_group("Isoterma SRL", "ELECTRALINE 3PMARK SPA"));
        assert!(!policy.same_group("ACME", "ACME"));
    }

    #[test]
    fn client_in_two_groups_matches_either() {
        let mut policy = TravelPolicy::default();
        policy.client_groups.insert(
            "ISOTERMA_LOGISTICA".to_string(),
            vec!["ISOTERMA SRL".to_string(), "TRASPORTI NORD".to_string()],
        );
        assert!(policy.same_group("ISOTERMA SRL", "GARIBALDINA SRL"));
        assert!(policy.same_group("ISOTERMA SRL", "Trasporti Nord SPA"));
        assert!(!policy.same_group("GARIBALDINA SRL", "TRASPORTI NORD"));
    }

    #[test]
    fn dedup_policy_parses_snake_case() {
        let policy: DedupPolicy = serde_json::from_str("\"content_hash\"").expect("policy");
        assert_eq!(policy, DedupPolicy::ContentHash);
        assert_eq!(DedupPolicy::default(), DedupPolicy::Snapshot);
    }
}
