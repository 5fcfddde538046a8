// CSV loader tolerant of unknown encoding and delimiter

use std::borrow::Cow;
use std::path::Path;

use chardetng::EncodingDetector;
use csv::{ReaderBuilder, StringRecord};
use encoding_rs::{Encoding, UTF_8};
use fieldwatch_domain::{CellValue, CsvRow, IngestFailure, LoadedFile};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::ingest::datetime::{is_date_column, parse_datetime};
use crate::ingest::roster::{is_technician_column, TechnicianRoster};

pub const DEFAULT_MAX_FILE_BYTES: u64 = 100 * 1024 * 1024;
const SAMPLE_BYTES: usize = 10 * 1024;
const CANDIDATE_DELIMITERS: [u8; 3] = [b';', b',', b'\t'];
const FALLBACK_ENCODINGS: [&str; 4] = ["utf-8", "cp1252", "latin1", "iso-8859-1"];
const NULL_SENTINELS: [&str; 2] = ["nan", "null"];

#[derive(Debug, Clone)]
pub struct CsvLoader {
    max_file_bytes: u64,
    roster: TechnicianRoster,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_BYTES, TechnicianRoster::default())
    }
}

impl CsvLoader {
    pub fn new(max_file_bytes: u64, roster: TechnicianRoster) -> Self {
        Self {
            max_file_bytes,
            roster,
        }
    }

    /// Never fails: problems are logged and recorded on the returned file.
    pub async fn load(&self, path: &Path, expected_columns: &[&str]) -> LoadedFile {
        let label = path.to_string_lossy().to_string();
        let metadata = match fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(file = %label, "feed file not found");
                return LoadedFile::failed(&label, IngestFailure::NotFound { path: label.clone() });
            }
            Err(err) => {
                warn!(file = %label, "feed file unreadable: {}", err);
                return LoadedFile::failed(
                    &label,
                    IngestFailure::Unreadable {
                        path: label.clone(),
                        reason: err.to_string(),
                    },
                );
            }
        };
        if metadata.len() > self.max_file_bytes {
            warn!(
                file = %label,
                size = metadata.len(),
                limit = self.max_file_bytes,
                "feed file too large"
            );
            return LoadedFile::failed(
                &label,
                IngestFailure::TooLarge {
                    path: label.clone(),
                    size: metadata.len(),
                    limit: self.max_file_bytes,
                },
            );
        }
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(file = %label, "feed file unreadable: {}", err);
                return LoadedFile::failed(
                    &label,
                    IngestFailure::Unreadable {
                        path: label.clone(),
                        reason: err.to_string(),
                    },
                );
            }
        };
        self.parse_bytes(&label, &bytes, expected_columns)
    }

    pub fn parse_bytes(&self, label: &str, bytes: &[u8], expected_columns: &[&str]) -> LoadedFile {
        let decoded: Vec<(&'static Encoding, Cow<'_, str>)> = candidate_encodings(bytes)
            .into_iter()
            .filter_map(|encoding| match decode_strict(encoding, bytes) {
                Some(text) => Some((encoding, text)),
                None => {
                    debug!(file = %label, encoding = encoding.name(), "strict decode rejected");
                    None
                }
            })
            .collect();

        for delimiter in CANDIDATE_DELIMITERS {
            for (encoding, text) in &decoded {
                let Some((headers, records)) = parse_table(text, delimiter) else {
                    continue;
                };
                let rows: Vec<CsvRow> = records
                    .iter()
                    .map(|record| self.clean_record(&headers, record))
                    .filter(|row| !row.is_empty())
                    .collect();
                let missing_columns = missing_columns(&headers, expected_columns);
                if !missing_columns.is_empty() {
                    warn!(file = %label, missing = ?missing_columns, "expected columns missing");
                }
                let shown = (delimiter as char).escape_default().to_string();
                info!(
                    file = %label,
                    encoding = encoding.name(),
                    delimiter = %shown,
                    rows = rows.len(),
                    "loaded feed"
                );
                return LoadedFile {
                    path: label.to_string(),
                    rows,
                    encoding: Some(encoding.name().to_string()),
                    delimiter: Some(delimiter as char),
                    missing_columns,
                    failure: None,
                };
            }
        }

        warn!(file = %label, "no encoding/delimiter combination produced rows");
        LoadedFile::failed(
            label,
            IngestFailure::Unparseable {
                path: label.to_string(),
            },
        )
    }

    fn clean_record(&self, headers: &[String], record: &StringRecord) -> CsvRow {
        let mut row = CsvRow::default();
        for (index, header) in headers.iter().enumerate() {
            let Some(value) = record.get(index).and_then(clean_field) else {
                continue;
            };
            let cell = if is_date_column(header) {
                match parse_datetime(&value) {
                    Some(parsed) => CellValue::DateTime(parsed),
                    None => CellValue::Text(value),
                }
            } else if is_technician_column(header) {
                CellValue::Text(self.roster.canonicalize(&value))
            } else {
                CellValue::Text(value)
            };
            row.insert(header.clone(), cell);
        }
        row
    }
}

/// Byte-sampled guess first, then the fixed fallback list, without duplicates.
fn candidate_encodings(bytes: &[u8]) -> Vec<&'static Encoding> {
    let sample = &bytes[..bytes.len().min(SAMPLE_BYTES)];
    let mut detector = EncodingDetector::new();
    detector.feed(sample, sample.len() == bytes.len());
    let mut candidates = vec![detector.guess(None, true)];
    for label in FALLBACK_ENCODINGS {
        if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
            if !candidates.contains(&encoding) {
                candidates.push(encoding);
            }
        }
    }
    candidates
}

fn decode_strict<'a>(encoding: &'static Encoding, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
    let bytes = if encoding == UTF_8 {
        bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
    } else {
        bytes
    };
    encoding.decode_without_bom_handling_and_without_replacement(bytes)
}

fn parse_table(text: &str, delimiter: u8) -> Option<(Vec<String>, Vec<StringRecord>)> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .ok()?
        .iter()
        .map(|header| header.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    if headers.len() <= 1 {
        return None;
    }
    let records = reader.records().collect::<Result<Vec<_>, _>>().ok()?;
    if records.is_empty() {
        return None;
    }
    Some((headers, records))
}

pub fn clean_field(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || NULL_SENTINELS
            .iter()
            .any(|sentinel| trimmed.eq_ignore_ascii_case(sentinel))
    {
        return None;
    }
    Some(trimmed.to_string())
}

fn missing_columns(headers: &[String], expected: &[&str]) -> Vec<String> {
    expected
        .iter()
        .filter(|column| {
            let wanted = column.to_lowercase();
            !headers.iter().any(|header| header.to_lowercase() == wanted)
        })
        .map(|column| column.to_string())
        .collect()
}
