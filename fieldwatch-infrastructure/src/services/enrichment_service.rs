use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use fieldwatch_domain::ports::EnrichmentService;
use fieldwatch_domain::{standard_actions, standard_risk_assessment, Alert, Enrichment, RuntimeConfig};

const SYSTEM_PROMPT: &str = "You are a business analyst for a field service company, specialized in \
technician workforce management and timesheet anomaly detection.";
const MAX_TOKENS: u32 = 1000;

/// Chat-completions client for an OpenAI-compatible endpoint.
pub struct HttpEnrichmentService {
    client: Client,
    url: String,
    token: Option<String>,
    model: String,
}

impl HttpEnrichmentService {
    pub fn new(config: &RuntimeConfig, url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds.max(3)))
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            token: config.enrichment_token.clone(),
            model: config.enrichment_model.clone(),
        })
    }
}

/// Used when no endpoint is configured; every call fails so callers fall back.
#[derive(Default)]
pub struct DisabledEnrichmentService;

pub fn build_enrichment_service(config: &RuntimeConfig) -> Result<Arc<dyn EnrichmentService>> {
    match &config.enrichment_url {
        Some(url) => Ok(Arc::new(HttpEnrichmentService::new(config, url)?)),
        None => Ok(Arc::new(DisabledEnrichmentService)),
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl EnrichmentService for HttpEnrichmentService {
    async fn enrich(&self, alert: &Alert, history: &[Alert]) -> Result<Enrichment> {
        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": build_prompt(alert, history) },
            ],
            "max_tokens": MAX_TOKENS,
            "temperature": 0.1,
        });

        let mut request = self.client.post(&self.url).json(&payload);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        let response: ChatResponse = request.send().await?.error_for_status()?.json().await?;
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("enrichment reply has no content"))?;
        debug!(alert = %alert.external_id, "enrichment reply received");
        parse_reply(&content, alert)
    }
}

#[async_trait]
impl EnrichmentService for DisabledEnrichmentService {
    async fn enrich(&self, _alert: &Alert, _history: &[Alert]) -> Result<Enrichment> {
        bail!("enrichment endpoint not configured")
    }
}

pub fn build_prompt(alert: &Alert, history: &[Alert]) -> String {
    let mut prompt = format!(
        "Alert analysis request:\n\
         - Alert ID: {id}\n\
         - Severity: {severity}\n\
         - Technician: {technician}\n\
         - Category: {category}\n\
         - Message: {message}\n\
         - Confidence: {confidence:.1}%\n\
         - Business impact: {impact}\n",
        id = alert.external_id,
        severity = alert.severity,
        technician = alert.technician,
        category = alert.category,
        message = alert.message,
        confidence = alert.confidence.score(),
        impact = alert.business_impact.as_str(),
    );
    if !history.is_empty() {
        prompt.push_str(&format!(
            "\nRecent alerts for the same technician and category ({}):\n",
            history.len()
        ));
        for previous in history {
            prompt.push_str(&format!(
                "- {} [{}{}] {}\n",
                previous.created_at.format("%Y-%m-%d"),
                previous.severity,
                if previous.false_positive { ", false positive" } else { "" },
                previous.message
            ));
        }
    }
    prompt.push_str(
        "\nRespond in JSON with keys: priority_level (1-5), risk_assessment, \
         recommended_actions (list of strings), financial_impact (number, EUR).",
    );
    prompt
}

/// Extracts the first JSON object from the reply; missing keys take the standard values.
pub fn parse_reply(content: &str, alert: &Alert) -> Result<Enrichment> {
    let start = content.find('{');
    let end = content.rfind('}');
    let body = match (start, end) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => bail!("enrichment reply contains no JSON object"),
    };
    let value: Value = serde_json::from_str(body)?;

    let priority_level = match value.get("priority_level") {
        Some(Value::Number(number)) => number.as_f64().map(|n| n.round() as i64),
        Some(Value::String(text)) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
    .map(Enrichment::clamp_priority)
    .unwrap_or_else(|| alert.severity.fallback_priority());

    let risk_assessment = value
        .get("risk_assessment")
        .and_then(text_of)
        .unwrap_or_else(|| standard_risk_assessment(alert.severity).to_string());

    let recommended_actions = match value.get("recommended_actions") {
        Some(Value::Array(items)) => items.iter().filter_map(text_of).collect(),
        Some(Value::String(text)) if !text.trim().is_empty() => vec![text.trim().to_string()],
        _ => Vec::new(),
    };
    let recommended_actions = if recommended_actions.is_empty() {
        standard_actions(alert.category)
    } else {
        recommended_actions
    };

    let financial_impact = match value.get("financial_impact") {
        Some(Value::Number(number)) => number.as_f64().unwrap_or_default(),
        Some(Value::String(text)) => parse_amount(text),
        _ => 0.0,
    };

    Ok(Enrichment {
        priority_level,
        risk_assessment,
        recommended_actions,
        financial_impact,
        fallback: false,
    })
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Object(_) | Value::Array(_) => Some(value.to_string()),
        _ => None,
    }
}

fn parse_amount(text: &str) -> f64 {
    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',' || *c == '-')
        .collect();
    digits.replace(',', ".").parse().unwrap_or_default()
}
