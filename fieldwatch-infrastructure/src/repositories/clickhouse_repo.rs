use std::collections::HashSet;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use clickhouse::{Client, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use fieldwatch_domain::ports::{ActivityRepository, AlertRepository};
use fieldwatch_domain::{
    Activity, ActivityBatch, Alert, AlertCategory, AlertQuery, BusinessImpact, Confidence,
    DbConfig, Severity,
};

use crate::utils::{chrono_to_offset, naive_to_offset, offset_to_chrono};

const ALERT_COLUMNS: &str = "external_id, run_id, severity, confidence, technician, message, \
    category, details_json, business_impact, suggested_actions, data_sources, created_at, \
    resolved, resolved_by, resolved_at, false_positive, fingerprint, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, Row)]
pub struct ActivityRow {
    pub ticket_id: String,
    pub technician: String,
    pub client: String,
    #[serde(with = "clickhouse::serde::time::datetime64::millis::option")]
    pub started_at: Option<OffsetDateTime>,
    #[serde(with = "clickhouse::serde::time::datetime64::millis::option")]
    pub ended_at: Option<OffsetDateTime>,
    pub activity_type: String,
    pub contract: String,
    pub description: String,
    pub duration_hours: f64,
    pub source_file: String,
    pub batch_id: String,
    pub validated: bool,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    pub ingested_at: OffsetDateTime,
}

impl ActivityRow {
    pub fn from_activity(activity: &Activity, ingested_at: OffsetDateTime) -> Self {
        Self {
            ticket_id: activity.ticket_id.clone(),
            technician: activity.technician.clone(),
            client: activity.client.clone().unwrap_or_default(),
            started_at: activity.started_at.map(naive_to_offset),
            ended_at: activity.ended_at.map(naive_to_offset),
            activity_type: activity.activity_type.clone().unwrap_or_default(),
            contract: activity.contract.clone().unwrap_or_default(),
            description: activity.description.clone().unwrap_or_default(),
            duration_hours: activity.duration_hours,
            source_file: activity.source_file.clone(),
            batch_id: activity.batch_id.as_str().to_string(),
            validated: activity.validated,
            ingested_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Row)]
pub struct TechnicianRow {
    pub name: String,
    pub active: bool,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, Row)]
pub struct AlertRow {
    pub external_id: String,
    pub run_id: String,
    pub severity: String,
    pub confidence: f64,
    pub technician: String,
    pub message: String,
    pub category: String,
    pub details_json: String,
    pub business_impact: String,
    pub suggested_actions: Vec<String>,
    pub data_sources: Vec<String>,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    pub created_at: OffsetDateTime,
    pub resolved: bool,
    pub resolved_by: Option<String>,
    #[serde(with = "clickhouse::serde::time::datetime64::millis::option")]
    pub resolved_at: Option<OffsetDateTime>,
    pub false_positive: bool,
    pub fingerprint: String,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    pub updated_at: OffsetDateTime,
}

impl AlertRow {
    pub fn from_alert(alert: &Alert, updated_at: OffsetDateTime) -> Result<Self> {
        Ok(Self {
            external_id: alert.external_id.clone(),
            run_id: alert.run_id.clone(),
            severity: alert.severity.as_str().to_string(),
            confidence: alert.confidence.score(),
            technician: alert.technician.clone(),
            message: alert.message.clone(),
            category: alert.category.as_str().to_string(),
            details_json: serde_json::to_string(&alert.details)?,
            business_impact: alert.business_impact.as_str().to_string(),
            suggested_actions: alert.suggested_actions.clone(),
            data_sources: alert.data_sources.clone(),
            created_at: chrono_to_offset(alert.created_at),
            resolved: alert.resolved,
            resolved_by: alert.resolved_by.clone(),
            resolved_at: alert.resolved_at.map(chrono_to_offset),
            false_positive: alert.false_positive,
            fingerprint: alert.fingerprint.clone(),
            updated_at,
        })
    }

    pub fn into_alert(self) -> Result<Alert> {
        let category = AlertCategory::parse(&self.category)
            .ok_or_else(|| anyhow!("unknown alert category {}", self.category))?;
        let business_impact = BusinessImpact::parse(&self.business_impact)
            .ok_or_else(|| anyhow!("unknown business impact {}", self.business_impact))?;
        Ok(Alert {
            external_id: self.external_id,
            run_id: self.run_id,
            severity: Severity::from(self.severity.as_str()),
            confidence: Confidence::new(self.confidence),
            technician: self.technician,
            message: self.message,
            category,
            details: serde_json::from_str(&self.details_json)?,
            business_impact,
            suggested_actions: self.suggested_actions,
            data_sources: self.data_sources,
            created_at: offset_to_chrono(self.created_at),
            resolved: self.resolved,
            resolved_by: self.resolved_by,
            resolved_at: self.resolved_at.map(offset_to_chrono),
            false_positive: self.false_positive,
            fingerprint: self.fingerprint,
        })
    }
}

#[derive(Clone)]
pub struct ClickhouseRepo {
    client: Client,
    database: String,
}

impl ClickhouseRepo {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn from_config(config: &DbConfig) -> Self {
        let mut client = Client::default()
            .with_url(&config.clickhouse_url)
            .with_database(&config.clickhouse_database);
        if let Some(user) = &config.clickhouse_user {
            client = client.with_user(user);
        }
        if let Some(password) = &config.clickhouse_password {
            client = client.with_password(password);
        }
        Self::new(client, config.clickhouse_database.clone())
    }
}

#[async_trait]
impl ActivityRepository for ClickhouseRepo {
    async fn ensure_schema(&self) -> Result<()> {
        let create_db = format!("CREATE DATABASE IF NOT EXISTS {}", self.database);
        self.client.query(&create_db).execute().await?;

        let create_activities = r#"
CREATE TABLE IF NOT EXISTS activities (
    ticket_id String,
    technician String,
    client String,
    started_at Nullable(DateTime64(3)),
    ended_at Nullable(DateTime64(3)),
    activity_type String,
    contract String,
    description String,
    duration_hours Float64,
    source_file String,
    batch_id String,
    validated Bool,
    ingested_at DateTime64(3)
) ENGINE = ReplacingMergeTree(ingested_at)
ORDER BY (technician, ticket_id)
"#;
        self.client.query(create_activities).execute().await?;

        let create_technicians = r#"
CREATE TABLE IF NOT EXISTS technicians (
    name String,
    active Bool,
    updated_at DateTime64(3)
) ENGINE = ReplacingMergeTree(updated_at)
ORDER BY name
"#;
        self.client.query(create_technicians).execute().await?;

        let create_alerts = r#"
CREATE TABLE IF NOT EXISTS alerts (
    external_id String,
    run_id String,
    severity String,
    confidence Float64,
    technician String,
    message String,
    category String,
    details_json String,
    business_impact String,
    suggested_actions Array(String),
    data_sources Array(String),
    created_at DateTime64(3),
    resolved Bool,
    resolved_by Nullable(String),
    resolved_at Nullable(DateTime64(3)),
    false_positive Bool,
    fingerprint String,
    updated_at DateTime64(3)
) ENGINE = ReplacingMergeTree(updated_at)
PARTITION BY toYYYYMM(created_at)
ORDER BY external_id
"#;
        self.client.query(create_alerts).execute().await?;
        Ok(())
    }

    async fn save_batch(&self, batch: &ActivityBatch) -> Result<()> {
        let now = OffsetDateTime::now_utc();
        if !batch.technicians.is_empty() {
            let mut insert = self.client.insert("technicians")?;
            for technician in &batch.technicians {
                insert
                    .write(&TechnicianRow {
                        name: technician.name.clone(),
                        active: technician.active,
                        updated_at: now,
                    })
                    .await?;
            }
            insert.end().await?;
        }
        // Activities go last, in a single insert.
        if !batch.activities.is_empty() {
            let mut insert = self.client.insert("activities")?;
            for activity in &batch.activities {
                insert.write(&ActivityRow::from_activity(activity, now)).await?;
            }
            insert.end().await?;
        }
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let _: u8 = self.client.query("SELECT toUInt8(1)").fetch_one().await?;
        Ok(())
    }
}

#[async_trait]
impl AlertRepository for ClickhouseRepo {
    async fn insert_alerts(&self, alerts: &[Alert]) -> Result<()> {
        if alerts.is_empty() {
            return Ok(());
        }
        let now = OffsetDateTime::now_utc();
        let mut insert = self.client.insert("alerts")?;
        for alert in alerts {
            insert.write(&AlertRow::from_alert(alert, now)?).await?;
        }
        insert.end().await?;
        Ok(())
    }

    async fn fetch_alert(&self, external_id: &str) -> Result<Option<Alert>> {
        let query = format!(
            "SELECT {} FROM alerts FINAL WHERE external_id = ? LIMIT 1",
            ALERT_COLUMNS
        );
        let row = self
            .client
            .query(&query)
            .bind(external_id)
            .fetch_optional::<AlertRow>()
            .await?;
        row.map(AlertRow::into_alert).transpose()
    }

    async fn fetch_alerts(&self, filter: &AlertQuery) -> Result<Vec<Alert>> {
        let mut query = format!("SELECT {} FROM alerts FINAL WHERE 1 = 1", ALERT_COLUMNS);
        let mut binds: Vec<String> = Vec::new();
        if let Some(technician) = &filter.technician {
            query.push_str(" AND lower(technician) = lower(?)");
            binds.push(technician.trim().to_string());
        }
        if let Some(category) = filter.category {
            query.push_str(" AND category = ?");
            binds.push(category.as_str().to_string());
        }
        if filter.unresolved_only {
            query.push_str(" AND resolved = false");
        }
        query.push_str(" ORDER BY created_at DESC");
        if let Some(limit) = filter.limit {
            query.push_str(&format!(" LIMIT {}", limit));
        }

        let mut statement = self.client.query(&query);
        for value in binds {
            statement = statement.bind(value);
        }
        let rows = statement.fetch_all::<AlertRow>().await?;
        rows.into_iter().map(AlertRow::into_alert).collect()
    }

    async fn update_alert(&self, alert: &Alert) -> Result<()> {
        let mut insert = self.client.insert("alerts")?;
        insert
            .write(&AlertRow::from_alert(alert, OffsetDateTime::now_utc())?)
            .await?;
        insert.end().await?;
        Ok(())
    }

    async fn fetch_fingerprints(&self) -> Result<HashSet<String>> {
        let rows = self
            .client
            .query("SELECT DISTINCT fingerprint FROM alerts FINAL WHERE fingerprint != ''")
            .fetch_all::<String>()
            .await?;
        Ok(rows.into_iter().collect())
    }

    async fn discard_run(&self, run_id: &str) -> Result<()> {
        self.client
            .query("DELETE FROM alerts WHERE run_id = ?")
            .bind(run_id)
            .execute()
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use fieldwatch_domain::{AlertFactory, BatchId, ClientDirectory, RulesEngine, RunId, TravelPolicy};

    fn activity(ticket: &str, client: &str, start: u32, end: u32) -> Activity {
        let day = NaiveDate::from_ymd_opt(2025, 3, 4).expect("date");
        Activity {
            ticket_id: ticket.to_string(),
            technician: "Alex Ferrario".to_string(),
            client: Some(client.to_string()),
            started_at: day.and_hms_opt(start, 0, 0),
            ended_at: day.and_hms_opt(end, 0, 0),
            activity_type: Some("Intervento on-site".to_string()),
            contract: None,
            description: None,
            duration_hours: 2.0,
            source_file: "attivita.csv".to_string(),
            batch_id: BatchId("batch_row".to_string()),
            confidence_score: None,
            validated: false,
        }
    }

    #[test]
    fn alert_row_round_trips_domain_alert() {
        let activities = vec![activity("T1", "Cliente A", 9, 11), activity("T2", "Cliente A", 10, 12)];
        let created = Utc.with_ymd_and_hms(2025, 3, 4, 18, 0, 0).single().expect("time");
        let mut factory = AlertFactory::new(RunId::generate(), created);
        let engine = RulesEngine::with_defaults(TravelPolicy::default(), ClientDirectory::default());
        let mut alert = engine
            .evaluate(&activities, &mut factory)
            .alerts
            .into_iter()
            .next()
            .expect("overlap alert");
        alert.resolve(Some("ops".to_string()), created);

        let row = AlertRow::from_alert(&alert, chrono_to_offset(created)).expect("row");
        assert_eq!(row.category, "temporal_overlap");
        assert_eq!(row.business_impact, "billing");
        assert!(row.details_json.contains("\"kind\":\"temporal_overlap\""));
        assert_eq!(row.into_alert().expect("alert"), alert);
    }

    #[test]
    fn unknown_category_is_rejected() {
        let activities = vec![activity("T1", "Cliente A", 9, 11), activity("T2", "Cliente B", 10, 12)];
        let created = Utc.with_ymd_and_hms(2025, 3, 4, 18, 0, 0).single().expect("time");
        let mut factory = AlertFactory::new(RunId::generate(), created);
        let engine = RulesEngine::with_defaults(TravelPolicy::default(), ClientDirectory::default());
        let alert = engine.evaluate(&activities, &mut factory).alerts.remove(0);
        let mut row = AlertRow::from_alert(&alert, chrono_to_offset(created)).expect("row");
        row.category = "vehicle_usage".to_string();
        assert!(row.into_alert().is_err());
    }

    #[test]
    fn activity_row_flattens_optionals() {
        let mut untimed = activity("T9", "Cliente A", 9, 10);
        untimed.started_at = None;
        untimed.client = None;
        let row = ActivityRow::from_activity(&untimed, OffsetDateTime::UNIX_EPOCH);
        assert!(row.started_at.is_none());
        assert!(row.ended_at.is_some());
        assert_eq!(row.client, "");
        assert_eq!(row.batch_id, "batch_row");
    }
}
