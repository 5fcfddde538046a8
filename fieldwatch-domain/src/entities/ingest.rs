// Ingestion entities
// Feeds, cleaned rows and per-file outcomes

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::Activity;
use crate::value_objects::BatchId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    Activities,
    Timesheets,
    RemoteSessionsBait,
    RemoteSessionsGroup,
    Leave,
    Vehicles,
    Calendar,
}

impl FeedKind {
    pub const ALL: [FeedKind; 7] = [
        FeedKind::Activities,
        FeedKind::Timesheets,
        FeedKind::RemoteSessionsBait,
        FeedKind::RemoteSessionsGroup,
        FeedKind::Leave,
        FeedKind::Vehicles,
        FeedKind::Calendar,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            FeedKind::Activities => "attivita.csv",
            FeedKind::Timesheets => "timbrature.csv",
            FeedKind::RemoteSessionsBait => "teamviewer_bait.csv",
            FeedKind::RemoteSessionsGroup => "teamviewer_gruppo.csv",
            FeedKind::Leave => "permessi.csv",
            FeedKind::Vehicles => "auto.csv",
            FeedKind::Calendar => "calendario.csv",
        }
    }

    /// Label recorded in alert data sources.
    pub fn source_label(&self) -> &'static str {
        self.file_name().trim_end_matches(".csv")
    }

    pub fn expected_columns(&self) -> &'static [&'static str] {
        match self {
            FeedKind::Activities => &[
                "Contratto",
                "Id Ticket",
                "Iniziata il",
                "Conclusa il",
                "Azienda",
                "Tipologia Attività",
                "Descrizione",
                "Durata",
                "Creato da",
            ],
            FeedKind::Timesheets => &["tecnico", "cliente", "ora inizio", "ora fine", "ore"],
            FeedKind::RemoteSessionsBait => &["tecnico", "cliente", "Inizio", "Fine", "durata_minuti"],
            FeedKind::RemoteSessionsGroup => &["tecnico", "cliente", "Inizio", "Fine"],
            FeedKind::Leave => &["tecnico", "tipo", "data_inizio", "data_fine"],
            FeedKind::Vehicles => &["tecnico", "veicolo", "data", "ora_presa", "ora_riconsegna"],
            FeedKind::Calendar => &["tecnico", "cliente", "data", "ora_inizio", "ora_fine"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    DateTime(NaiveDateTime),
    Text(String),
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(value) => Some(value),
            CellValue::DateTime(_) => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::DateTime(value) => Some(*value),
            CellValue::Text(_) => None,
        }
    }
}

/// A cleaned record; null cells are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CsvRow {
    pub cells: BTreeMap<String, CellValue>,
}

impl CsvRow {
    pub fn insert(&mut self, column: impl Into<String>, value: CellValue) {
        self.cells.insert(column.into(), value);
    }

    /// Column lookup ignoring case and surrounding whitespace.
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        let wanted = column.trim();
        self.cells.get(wanted).or_else(|| {
            let wanted = wanted.to_lowercase();
            self.cells
                .iter()
                .find(|(name, _)| name.trim().to_lowercase() == wanted)
                .map(|(_, value)| value)
        })
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(CellValue::as_text)
    }

    pub fn datetime(&self, column: &str) -> Option<NaiveDateTime> {
        self.get(column).and_then(CellValue::as_datetime)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestFailure {
    #[error("file not found: {path}")]
    NotFound { path: String },
    #[error("file too large: {path} ({size} bytes, limit {limit})")]
    TooLarge { path: String, size: u64, limit: u64 },
    #[error("file unreadable: {path}: {reason}")]
    Unreadable { path: String, reason: String },
    #[error("no encoding/delimiter combination parsed {path}")]
    Unparseable { path: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadedFile {
    pub path: String,
    pub rows: Vec<CsvRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<char>,
    #[serde(default)]
    pub missing_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<IngestFailure>,
}

impl LoadedFile {
    pub fn failed(path: impl Into<String>, failure: IngestFailure) -> Self {
        Self {
            path: path.into(),
            failure: Some(failure),
            ..Self::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.failure.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedReport {
    pub feed: FeedKind,
    pub path: Option<String>,
    pub rows: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<char>,
    #[serde(default)]
    pub missing_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<IngestFailure>,
}

impl FeedReport {
    pub fn from_loaded(feed: FeedKind, loaded: &LoadedFile) -> Self {
        Self {
            feed,
            path: Some(loaded.path.clone()),
            rows: loaded.rows.len(),
            encoding: loaded.encoding.clone(),
            delimiter: loaded.delimiter,
            missing_columns: loaded.missing_columns.clone(),
            failure: loaded.failure.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub batch_id: BatchId,
    pub feeds: Vec<FeedReport>,
    pub activities: Vec<Activity>,
    pub skipped_rows: usize,
}

impl IngestReport {
    pub fn loaded_feeds(&self) -> usize {
        self.feeds.iter().filter(|feed| feed.failure.is_none()).count()
    }

    pub fn failed_feeds(&self) -> usize {
        self.feeds.iter().filter(|feed| feed.failure.is_some()).count()
    }

    pub fn total_rows(&self) -> usize {
        self.feeds.iter().map(|feed| feed.rows).sum()
    }

    pub fn data_sources(&self) -> Vec<String> {
        self.feeds
            .iter()
            .filter(|feed| feed.failure.is_none() && feed.rows > 0)
            .map(|feed| feed.feed.source_label().to_string())
            .collect()
    }
}
