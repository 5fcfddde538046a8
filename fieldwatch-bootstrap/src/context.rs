use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::RwLock;
use tracing::info;

use fieldwatch_application::commands::rules_commands::reload_rules;
use fieldwatch_application::{AppState, Metrics, RunCache};
use fieldwatch_domain::ports::{ActivityRepository, AlertRepository};
use fieldwatch_domain::{ClientDirectory, StorageBackend, TravelPolicy};
use fieldwatch_infrastructure::{
    build_enrichment_service, AppConfig, ClickhouseRepo, ConfigFileRepository, CsvActivitySource,
    CsvLoader, FileReportSink, MemoryRepository, TechnicianRoster,
};

pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    pub async fn new() -> Result<Self> {
        let config = AppConfig::load().await?;
        let runtime_config = config.to_runtime_config();
        let db_config = config.to_db_config();

        let (activity_repo, alert_repo): (Arc<dyn ActivityRepository>, Arc<dyn AlertRepository>) =
            match db_config.storage {
                StorageBackend::Clickhouse => {
                    info!(
                        clickhouse_url = %db_config.clickhouse_url,
                        clickhouse_database = %db_config.clickhouse_database,
                        clickhouse_user = %db_config.clickhouse_user.as_deref().unwrap_or("<default>"),
                        clickhouse_password_set = db_config.clickhouse_password.is_some(),
                        "using clickhouse storage"
                    );
                    let repo = Arc::new(ClickhouseRepo::from_config(&db_config));
                    repo.ensure_schema().await?;
                    let activities: Arc<dyn ActivityRepository> = repo.clone();
                    let alerts: Arc<dyn AlertRepository> = repo;
                    (activities, alerts)
                }
                StorageBackend::Memory => {
                    info!("using in-memory storage");
                    let repo = Arc::new(MemoryRepository::new());
                    let activities: Arc<dyn ActivityRepository> = repo.clone();
                    let alerts: Arc<dyn AlertRepository> = repo;
                    (activities, alerts)
                }
            };

        let loader = CsvLoader::new(
            runtime_config.max_file_bytes,
            TechnicianRoster::new(runtime_config.technician_roster.clone()),
        );
        let input_dirs = runtime_config
            .input_dirs
            .iter()
            .map(PathBuf::from)
            .collect();

        let state = AppState {
            source: Arc::new(CsvActivitySource::new(input_dirs, loader)),
            activity_repo,
            alert_repo,
            config_repo: Arc::new(ConfigFileRepository::new()),
            enrichment: build_enrichment_service(&runtime_config)?,
            report_sink: Arc::new(FileReportSink::new(&runtime_config.report_dir)),
            travel_policy: Arc::new(RwLock::new(TravelPolicy::default())),
            client_directory: Arc::new(RwLock::new(ClientDirectory::default())),
            metrics: Arc::new(Metrics::default()),
            run_cache: Arc::new(RunCache::new(Duration::from_secs(
                runtime_config.result_cache_ttl_seconds,
            ))),
            config: runtime_config,
        };
        reload_rules(&state).await?;

        Ok(Self { state })
    }
}
