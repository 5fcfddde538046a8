use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

use fieldwatch_application::commands::alert_commands::{mark_false_positive, resolve_alert};
use fieldwatch_application::commands::audit_commands::{run_audit, RunResponse};
use fieldwatch_application::queries::alert_queries::list_alerts;
use fieldwatch_application::queries::enrichment_queries::enrich_alert;
use fieldwatch_domain::AlertQuery;
use fieldwatch_infrastructure::schedule_runs;

use crate::context::AppContext;

pub enum Action {
    Run,
    Schedule,
    Resolve { id: String, by: Option<String> },
    FalsePositive { id: String, by: Option<String> },
    Alerts { query: AlertQuery },
    Enrich { id: String },
}

pub async fn execute(action: Action) -> Result<()> {
    let context = AppContext::new().await?;
    let state = context.state;

    match action {
        Action::Run => {
            let response = run_audit(&state).await?;
            if let RunResponse::Cached { reason, .. } = &response {
                warn!(reason = %reason, "returning cached run result");
            }
            print_json(response.report())?;
        }
        Action::Schedule => {
            info!(
                hour = state.config.schedule_hour,
                minute = state.config.schedule_minute,
                "scheduler started"
            );
            tokio::select! {
                _ = schedule_runs(state.clone()) => {},
                _ = shutdown_signal() => info!("scheduler stopped"),
            }
        }
        Action::Resolve { id, by } => print_json(&resolve_alert(&state, &id, by).await?)?,
        Action::FalsePositive { id, by } => {
            print_json(&mark_false_positive(&state, &id, by).await?)?
        }
        Action::Alerts { query } => print_json(&list_alerts(&state, query).await?)?,
        Action::Enrich { id } => print_json(&enrich_alert(&state, &id).await?)?,
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("sigterm handler unavailable: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
