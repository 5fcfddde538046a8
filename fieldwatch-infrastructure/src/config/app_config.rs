use std::env;
use std::path::Path;

use anyhow::Result;
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use fieldwatch_domain::{DbConfig, DedupPolicy, RuntimeConfig, StorageBackend};

use crate::config::validation::validate_config;
use crate::ingest::DEFAULT_ROSTER;

pub const CONFIG_ENV: &str = "FIELDWATCH_CONFIG";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub input_dirs: Vec<String>,
    pub max_file_bytes: u64,
    pub technician_roster: Vec<String>,
    pub rules_path: String,
    pub clients_path: String,
    pub overlap_min_confidence: f64,
    pub travel_min_confidence: f64,
    pub dedup_policy: DedupPolicy,
    pub result_cache_ttl_seconds: u64,
    pub storage: StorageBackend,
    pub clickhouse_url: String,
    pub clickhouse_database: String,
    pub clickhouse_user: Option<String>,
    pub clickhouse_password: Option<String>,
    pub report_dir: String,
    pub enrichment_url: Option<String>,
    pub enrichment_token: Option<String>,
    pub enrichment_model: String,
    pub enrichment_history_limit: usize,
    pub request_timeout_seconds: u64,
    pub schedule_hour: u32,
    pub schedule_minute: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input_dirs: vec!["./upload_csv".to_string(), "./data/input".to_string()],
            max_file_bytes: 100 * 1024 * 1024,
            technician_roster: DEFAULT_ROSTER.iter().map(|name| name.to_string()).collect(),
            rules_path: "./rules.yaml".to_string(),
            clients_path: "./clients.yaml".to_string(),
            overlap_min_confidence: 70.0,
            travel_min_confidence: 60.0,
            dedup_policy: DedupPolicy::Snapshot,
            result_cache_ttl_seconds: 300,
            storage: StorageBackend::Clickhouse,
            clickhouse_url: "http://127.0.0.1:8123".to_string(),
            clickhouse_database: "fieldwatch".to_string(),
            clickhouse_user: None,
            clickhouse_password: None,
            report_dir: "./reports".to_string(),
            enrichment_url: None,
            enrichment_token: None,
            enrichment_model: "anthropic/claude-3-haiku".to_string(),
            enrichment_history_limit: 10,
            request_timeout_seconds: 15,
            schedule_hour: 6,
            schedule_minute: 30,
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var(CONFIG_ENV).unwrap_or_else(|_| "./config.toml".to_string());
        let file_path = Path::new(&path);
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path).await?;
            toml::from_str(&content)?
        } else {
            warn!(path = %path, "config file not found, using defaults");
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.resolve_paths(file_path.parent());
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn normalize(&mut self) {
        self.clickhouse_user = normalize_optional(self.clickhouse_user.take());
        self.clickhouse_password = normalize_optional(self.clickhouse_password.take());
        self.enrichment_url = normalize_optional(self.enrichment_url.take());
        self.enrichment_token = normalize_optional(self.enrichment_token.take());
        self.input_dirs = normalize_list(std::mem::take(&mut self.input_dirs), false);
        self.technician_roster = normalize_list(std::mem::take(&mut self.technician_roster), true);
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        self.report_dir = resolve_path(base, &self.report_dir);
        self.rules_path = resolve_path(base, &self.rules_path);
        self.clients_path = resolve_path(base, &self.clients_path);
        self.input_dirs = self
            .input_dirs
            .iter()
            .map(|dir| resolve_path(base, dir))
            .collect();
    }

    pub fn validate(&self) -> Result<()> {
        validate_config(self)
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            input_dirs: self.input_dirs.clone(),
            max_file_bytes: self.max_file_bytes,
            technician_roster: self.technician_roster.clone(),
            rules_path: self.rules_path.clone(),
            clients_path: self.clients_path.clone(),
            overlap_min_confidence: self.overlap_min_confidence,
            travel_min_confidence: self.travel_min_confidence,
            dedup_policy: self.dedup_policy,
            result_cache_ttl_seconds: self.result_cache_ttl_seconds,
            report_dir: self.report_dir.clone(),
            enrichment_url: self.enrichment_url.clone(),
            enrichment_token: self.enrichment_token.clone(),
            enrichment_model: self.enrichment_model.clone(),
            enrichment_history_limit: self.enrichment_history_limit,
            request_timeout_seconds: self.request_timeout_seconds,
            schedule_hour: self.schedule_hour,
            schedule_minute: self.schedule_minute,
        }
    }

    pub fn to_db_config(&self) -> DbConfig {
        DbConfig {
            storage: self.storage,
            clickhouse_url: self.clickhouse_url.clone(),
            clickhouse_database: self.clickhouse_database.clone(),
            clickhouse_user: self.clickhouse_user.clone(),
            clickhouse_password: self.clickhouse_password.clone(),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("FIELDWATCH_INPUT_DIRS") {
            self.input_dirs = parse_env_list(&value);
        }
        if let Ok(value) = env::var("FIELDWATCH_MAX_FILE_BYTES") {
            self.max_file_bytes = value.parse().unwrap_or(self.max_file_bytes);
        }
        if let Ok(value) = env::var("FIELDWATCH_TECHNICIAN_ROSTER") {
            self.technician_roster = parse_env_list(&value);
        }
        if let Ok(value) = env::var("FIELDWATCH_RULES_PATH") {
            self.rules_path = value;
        }
        if let Ok(value) = env::var("FIELDWATCH_CLIENTS_PATH") {
            self.clients_path = value;
        }
        if let Ok(value) = env::var("FIELDWATCH_OVERLAP_MIN_CONFIDENCE") {
            self.overlap_min_confidence = value.parse().unwrap_or(self.overlap_min_confidence);
        }
        if let Ok(value) = env::var("FIELDWATCH_TRAVEL_MIN_CONFIDENCE") {
            self.travel_min_confidence = value.parse().unwrap_or(self.travel_min_confidence);
        }
        if let Ok(value) = env::var("FIELDWATCH_DEDUP_POLICY") {
            match value.trim().to_lowercase().as_str() {
                "snapshot" => self.dedup_policy = DedupPolicy::Snapshot,
                "content_hash" => self.dedup_policy = DedupPolicy::ContentHash,
                other => warn!(value = %other, "ignoring unknown FIELDWATCH_DEDUP_POLICY"),
            }
        }
        if let Ok(value) = env::var("FIELDWATCH_RESULT_CACHE_TTL_SECONDS") {
            self.result_cache_ttl_seconds = value.parse().unwrap_or(self.result_cache_ttl_seconds);
        }
        if let Ok(value) = env::var("FIELDWATCH_STORAGE") {
            match value.trim().to_lowercase().as_str() {
                "clickhouse" => self.storage = StorageBackend::Clickhouse,
                "memory" => self.storage = StorageBackend::Memory,
                other => warn!(value = %other, "ignoring unknown FIELDWATCH_STORAGE"),
            }
        }
        if let Ok(value) = env::var("FIELDWATCH_CLICKHOUSE_URL") {
            self.clickhouse_url = value;
        }
        if let Ok(value) = env::var("FIELDWATCH_CLICKHOUSE_DATABASE") {
            self.clickhouse_database = value;
        }
        if let Ok(value) = env::var("FIELDWATCH_CLICKHOUSE_USER") {
            self.clickhouse_user = Some(value);
        }
        if let Ok(value) = env::var("FIELDWATCH_CLICKHOUSE_PASSWORD") {
            self.clickhouse_password = Some(value);
        }
        if let Ok(value) = env::var("FIELDWATCH_REPORT_DIR") {
            self.report_dir = value;
        }
        if let Ok(value) = env::var("FIELDWATCH_ENRICHMENT_URL") {
            self.enrichment_url = Some(value);
        }
        if let Ok(value) = env::var("FIELDWATCH_ENRICHMENT_TOKEN") {
            self.enrichment_token = Some(value);
        }
        if let Ok(value) = env::var("FIELDWATCH_ENRICHMENT_MODEL") {
            self.enrichment_model = value;
        }
        if let Ok(value) = env::var("FIELDWATCH_ENRICHMENT_HISTORY_LIMIT") {
            self.enrichment_history_limit = value.parse().unwrap_or(self.enrichment_history_limit);
        }
        if let Ok(value) = env::var("FIELDWATCH_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
        if let Ok(value) = env::var("FIELDWATCH_SCHEDULE_HOUR") {
            self.schedule_hour = value.parse().unwrap_or(self.schedule_hour);
        }
        if let Ok(value) = env::var("FIELDWATCH_SCHEDULE_MINUTE") {
            self.schedule_minute = value.parse().unwrap_or(self.schedule_minute);
        }
    }
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.filter(|item| !item.trim().is_empty())
}

fn parse_env_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}

// Order matters for input directories, so only the roster is deduplicated.
fn normalize_list(values: Vec<String>, dedup: bool) -> Vec<String> {
    let mut out: Vec<String> = values
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();
    if dedup {
        out.sort();
        out.dedup();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_overrides_defaults() {
        let raw = r#"
input_dirs = ["./upload", " ", "./input"]
dedup_policy = "content_hash"
storage = "memory"
enrichment_url = "  "
technician_roster = ["Alex Ferrario", "Alex Ferrario", "Matteo Signo"]
"#;
        let mut config: AppConfig = toml::from_str(raw).expect("parse config");
        config.normalize();
        assert_eq!(config.input_dirs, vec!["./upload", "./input"]);
        assert_eq!(config.dedup_policy, DedupPolicy::ContentHash);
        assert_eq!(config.storage, StorageBackend::Memory);
        assert!(config.enrichment_url.is_none());
        assert_eq!(config.technician_roster.len(), 2);
        assert_eq!(config.result_cache_ttl_seconds, 300);
        config.validate().expect("valid config");
    }

    #[test]
    fn relative_paths_follow_config_dir() {
        let mut config = AppConfig::default();
        config.resolve_paths(Some(Path::new("/etc/fieldwatch")));
        assert_eq!(config.rules_path, "/etc/fieldwatch/./rules.yaml");
        assert!(config.input_dirs[0].starts_with("/etc/fieldwatch"));
    }

    #[test]
    fn runtime_config_carries_thresholds() {
        let runtime = AppConfig::default().to_runtime_config();
        assert_eq!(runtime.overlap_min_confidence, 70.0);
        assert_eq!(runtime.travel_min_confidence, 60.0);
        assert_eq!(runtime.enrichment_history_limit, 10);
    }
}
