use std::sync::Arc;

use fieldwatch_domain::ports::{
    ActivityRepository, ActivitySource, AlertRepository, ConfigRepository, EnrichmentService,
    ReportSink,
};
use fieldwatch_domain::{ClientDirectory, RuntimeConfig, TravelPolicy};
use tokio::sync::RwLock;

use crate::{Metrics, RunCache};

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub source: Arc<dyn ActivitySource>,
    pub activity_repo: Arc<dyn ActivityRepository>,
    pub alert_repo: Arc<dyn AlertRepository>,
    pub config_repo: Arc<dyn ConfigRepository>,
    pub enrichment: Arc<dyn EnrichmentService>,
    pub report_sink: Arc<dyn ReportSink>,
    pub travel_policy: Arc<RwLock<TravelPolicy>>,
    pub client_directory: Arc<RwLock<ClientDirectory>>,
    pub metrics: Arc<Metrics>,
    pub run_cache: Arc<RunCache>,
}
