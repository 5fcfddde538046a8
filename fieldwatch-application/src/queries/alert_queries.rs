use fieldwatch_domain::{Alert, AlertQuery};
use tracing::error;

use crate::commands::alert_commands::load_alert;
use crate::{AppError, AppState};

pub async fn list_alerts(state: &AppState, query: AlertQuery) -> Result<Vec<Alert>, AppError> {
    state.alert_repo.fetch_alerts(&query).await.map_err(|err| {
        error!("failed to fetch alerts: {}", err);
        AppError::Persistence(err)
    })
}

pub async fn get_alert(state: &AppState, external_id: &str) -> Result<Alert, AppError> {
    load_alert(state, external_id).await
}
