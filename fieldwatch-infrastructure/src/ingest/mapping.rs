// Activity source backed by the CSV feed directories

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use fieldwatch_domain::ports::ActivitySource;
use fieldwatch_domain::{
    Activity, BatchId, CsvRow, FeedKind, FeedReport, IngestFailure, IngestReport, LoadedFile,
};
use tracing::{info, warn};

use crate::ingest::loader::CsvLoader;

const TICKET_COLUMNS: [&str; 4] = ["Id Ticket", "id_ticket", "ticket_id", "ticket"];
const TECHNICIAN_COLUMNS: [&str; 3] = ["Creato da", "creato_da", "tecnico"];
const CLIENT_COLUMNS: [&str; 3] = ["Azienda", "cliente", "client"];
const START_COLUMNS: [&str; 4] = ["Iniziata il", "iniziata_il", "inizio", "data_inizio"];
const END_COLUMNS: [&str; 4] = ["Conclusa il", "conclusa_il", "fine", "data_fine"];
const TYPE_COLUMNS: [&str; 3] = ["Tipologia Attività", "Tipologia Attivita", "tipologia_attivita"];
const CONTRACT_COLUMNS: [&str; 2] = ["Contratto", "contratto"];
const DESCRIPTION_COLUMNS: [&str; 2] = ["Descrizione", "descrizione"];
const DURATION_COLUMNS: [&str; 2] = ["Durata", "durata"];

pub struct CsvActivitySource {
    input_dirs: Vec<PathBuf>,
    loader: CsvLoader,
}

impl CsvActivitySource {
    /// Directories are searched in order; the first one holding a feed wins.
    pub fn new(input_dirs: Vec<PathBuf>, loader: CsvLoader) -> Self {
        Self { input_dirs, loader }
    }

    fn locate(&self, feed: FeedKind) -> Option<PathBuf> {
        self.input_dirs
            .iter()
            .map(|dir| dir.join(feed.file_name()))
            .find(|path| path.is_file())
    }

    async fn load_feed(&self, feed: FeedKind) -> (FeedReport, LoadedFile) {
        let loaded = match self.locate(feed) {
            Some(path) => self.loader.load(&path, feed.expected_columns()).await,
            None => {
                let path = self
                    .input_dirs
                    .first()
                    .map(|dir| dir.join(feed.file_name()))
                    .unwrap_or_else(|| PathBuf::from(feed.file_name()));
                let label = path.to_string_lossy().to_string();
                warn!(file = %label, "feed file not found in any input directory");
                LoadedFile::failed(&label, IngestFailure::NotFound { path: label.clone() })
            }
        };
        (FeedReport::from_loaded(feed, &loaded), loaded)
    }
}

#[async_trait]
impl ActivitySource for CsvActivitySource {
    async fn ingest(&self, batch_id: &BatchId) -> IngestReport {
        let mut feeds = Vec::with_capacity(FeedKind::ALL.len());
        let mut activities = Vec::new();
        let mut skipped_rows = 0;

        for feed in FeedKind::ALL {
            let (report, loaded) = self.load_feed(feed).await;
            if feed == FeedKind::Activities && loaded.is_ok() {
                let source_file = file_name_of(&loaded.path);
                let (mapped, skipped) = map_activities(&loaded.rows, batch_id, &source_file);
                activities = mapped;
                skipped_rows = skipped;
            }
            feeds.push(report);
        }

        info!(
            batch_id = %batch_id,
            activities = activities.len(),
            skipped_rows,
            "ingestion finished"
        );
        IngestReport {
            batch_id: batch_id.clone(),
            feeds,
            activities,
            skipped_rows,
        }
    }

    fn dataset_key(&self) -> String {
        self.input_dirs
            .iter()
            .map(|dir| dir.to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// Maps cleaned rows; a later row with the same (ticket, technician) replaces the earlier one.
pub fn map_activities(rows: &[CsvRow], batch_id: &BatchId, source_file: &str) -> (Vec<Activity>, usize) {
    let mut activities: Vec<Activity> = Vec::with_capacity(rows.len());
    let mut positions: HashMap<(String, String), usize> = HashMap::new();
    let mut skipped = 0;

    for row in rows {
        let Some(activity) = map_activity(row, batch_id, source_file) else {
            skipped += 1;
            continue;
        };
        let key = (activity.ticket_id.clone(), activity.technician.clone());
        match positions.get(&key) {
            Some(&index) => activities[index] = activity,
            None => {
                positions.insert(key, activities.len());
                activities.push(activity);
            }
        }
    }
    (activities, skipped)
}

pub fn map_activity(row: &CsvRow, batch_id: &BatchId, source_file: &str) -> Option<Activity> {
    let ticket_id = first_text(row, &TICKET_COLUMNS)?;
    let technician = first_text(row, &TECHNICIAN_COLUMNS)?;
    Some(Activity {
        ticket_id,
        technician,
        client: first_text(row, &CLIENT_COLUMNS),
        started_at: first_datetime(row, &START_COLUMNS),
        ended_at: first_datetime(row, &END_COLUMNS),
        activity_type: first_text(row, &TYPE_COLUMNS),
        contract: first_text(row, &CONTRACT_COLUMNS),
        description: first_text(row, &DESCRIPTION_COLUMNS),
        duration_hours: first_text(row, &DURATION_COLUMNS)
            .and_then(|value| parse_duration_hours(&value))
            .unwrap_or_default(),
        source_file: source_file.to_string(),
        batch_id: batch_id.clone(),
        confidence_score: None,
        validated: false,
    })
}

fn first_text(row: &CsvRow, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .find_map(|alias| row.text(alias))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn first_datetime(row: &CsvRow, aliases: &[&str]) -> Option<NaiveDateTime> {
    aliases.iter().find_map(|alias| row.datetime(alias))
}

/// Accepts `1,5`, `1.5` and `1:30`.
pub fn parse_duration_hours(value: &str) -> Option<f64> {
    let value = value.trim();
    if let Some((hours, minutes)) = value.split_once(':') {
        let hours: f64 = hours.trim().parse().ok()?;
        let minutes: f64 = minutes.trim().parse().ok()?;
        return Some(hours + minutes / 60.0);
    }
    value.replace(',', ".").parse().ok()
}

fn file_name_of(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}
