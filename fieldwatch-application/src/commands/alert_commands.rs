use chrono::Utc;
use fieldwatch_domain::{normalize_optional_text, Alert};
use tracing::info;

use crate::{AppError, AppState};

pub async fn resolve_alert(
    state: &AppState,
    external_id: &str,
    resolved_by: Option<String>,
) -> Result<Alert, AppError> {
    let mut alert = load_alert(state, external_id).await?;
    alert.resolve(normalize_optional_text(resolved_by), Utc::now());
    state
        .alert_repo
        .update_alert(&alert)
        .await
        .map_err(AppError::Persistence)?;
    info!(external_id = %alert.external_id, "alert resolved");
    Ok(alert)
}

pub async fn mark_false_positive(
    state: &AppState,
    external_id: &str,
    resolved_by: Option<String>,
) -> Result<Alert, AppError> {
    let mut alert = load_alert(state, external_id).await?;
    alert.mark_false_positive(normalize_optional_text(resolved_by), Utc::now());
    state
        .alert_repo
        .update_alert(&alert)
        .await
        .map_err(AppError::Persistence)?;
    info!(external_id = %alert.external_id, "alert marked as false positive");
    Ok(alert)
}

pub(crate) async fn load_alert(state: &AppState, external_id: &str) -> Result<Alert, AppError> {
    let external_id = external_id.trim();
    if external_id.is_empty() {
        return Err(AppError::BadRequest("alert id is required".to_string()));
    }
    state
        .alert_repo
        .fetch_alert(external_id)
        .await
        .map_err(AppError::Persistence)?
        .ok_or_else(|| AppError::NotFound(format!("alert '{}'", external_id)))
}
