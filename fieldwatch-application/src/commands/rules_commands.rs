use tracing::info;

use crate::{AppError, AppState};

/// Reloads the travel policy and client directory from their files.
pub async fn reload_rules(state: &AppState) -> Result<(usize, usize), AppError> {
    let policy = state
        .config_repo
        .load_travel_policy(&state.config.rules_path)
        .await?;
    let directory = state
        .config_repo
        .load_client_directory(&state.config.clients_path)
        .await?;
    let groups = policy.client_groups.len();
    let clients = directory.len();
    *state.travel_policy.write().await = policy;
    *state.client_directory.write().await = directory;
    info!(groups, clients, "rules reloaded");
    Ok((groups, clients))
}
