use fieldwatch_domain::{fallback_enrichment, AlertQuery, Enrichment};
use tracing::warn;

use crate::commands::alert_commands::load_alert;
use crate::{AppError, AppState};

/// Enriches one alert with recent same-technician, same-category history.
/// Falls back to the deterministic mapping when the service fails.
pub async fn enrich_alert(state: &AppState, external_id: &str) -> Result<Enrichment, AppError> {
    let alert = load_alert(state, external_id).await?;
    let limit = state.config.enrichment_history_limit;
    let query = AlertQuery {
        technician: Some(alert.technician.clone()),
        category: Some(alert.category),
        unresolved_only: false,
        limit: Some(limit + 1),
    };
    let mut history = state
        .alert_repo
        .fetch_alerts(&query)
        .await
        .map_err(AppError::Persistence)?;
    history.retain(|item| item.external_id != alert.external_id);
    history.truncate(limit);

    match state.enrichment.enrich(&alert, &history).await {
        Ok(enrichment) => Ok(enrichment),
        Err(err) => {
            warn!(external_id = %alert.external_id, "enrichment unavailable, using fallback: {}", err);
            state.metrics.record_enrichment_fallback();
            Ok(fallback_enrichment(&alert))
        }
    }
}
