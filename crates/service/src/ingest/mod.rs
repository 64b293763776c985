//! CSV ingestion: parse, validate, collapse duplicate keys, write in one
//! transaction per file.

mod schema;
#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use optchain_core::{DatasetKind, MAX_REPORTED_ROW_ISSUES};
use optchain_storage::SharedStore;
use optchain_storage::traits::{IndexStore, OptionStore};
use serde::{Deserialize, Serialize};

use crate::error::{IngestError, ServiceError};
use schema::{ColumnMap, IndexSchema, OptionSchema, RowSchema};

/// What to do with a row that fails validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowPolicy {
    /// The first malformed row rejects the whole file.
    #[default]
    Reject,
    /// Malformed rows are skipped and reported.
    Skip,
}

impl RowPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::Skip => "skip",
        }
    }
}

impl std::str::FromStr for RowPolicy {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "skip" => Ok(Self::Skip),
            _ => Err(ServiceError::InvalidInput(format!(
                "unknown row policy {s:?}, expected 'reject' or 'skip'"
            ))),
        }
    }
}

/// A skipped row: 1-based line number in the file and the validation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    pub line: u64,
    pub reason: String,
}

/// Outcome of one accepted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub file_name: String,
    pub dataset: DatasetKind,
    pub policy: RowPolicy,
    /// Data rows in the file, header excluded.
    pub total_rows: u64,
    /// Distinct keys written.
    pub written: u64,
    pub skipped: u64,
    /// Rows replaced by a later row with the same key in the same file.
    pub duplicates_collapsed: u64,
    /// First skipped rows, at most `MAX_REPORTED_ROW_ISSUES`.
    pub issues: Vec<RowIssue>,
}

impl IngestReport {
    /// `name - total → written (skipped invalid)`
    pub fn summary_line(&self) -> String {
        format!(
            "{} - {} \u{2192} {} ({} invalid)",
            self.file_name, self.total_rows, self.written, self.skipped
        )
    }
}

/// One file of a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content: Vec<u8>,
}

#[derive(Debug)]
pub struct FileOutcome {
    pub file_name: String,
    pub result: Result<IngestReport, ServiceError>,
}

/// Per-file results of a multi-file upload, in submission order.
#[derive(Debug)]
pub struct BatchReport {
    pub dataset: DatasetKind,
    pub policy: RowPolicy,
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// The most severe failure: database unavailability beats anything else,
    /// then server-side failures, then rejected input.
    pub fn worst_error(&self) -> Option<&ServiceError> {
        let errors = || self.outcomes.iter().filter_map(|o| o.result.as_ref().err());
        errors()
            .find(|e| e.is_transient())
            .or_else(|| errors().find(|e| !e.is_client_error()))
            .or_else(|| errors().next())
    }
}

/// Rows accepted from one file, keyed and deduplicated.
#[derive(Debug)]
pub(crate) struct ParsedCsv<R> {
    pub rows: Vec<R>,
    pub total_rows: u64,
    pub skipped: u64,
    pub duplicates_collapsed: u64,
    pub issues: Vec<RowIssue>,
}

pub(crate) fn parse_csv<S: RowSchema>(
    content: &[u8],
    policy: RowPolicy,
) -> Result<ParsedCsv<S::Row>, IngestError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(content);
    let columns = ColumnMap::new(reader.headers()?);
    let missing = columns.missing(S::REQUIRED);
    let Some(schema) = S::bind(&columns).filter(|_| missing.is_empty()) else {
        return Err(IngestError::MissingColumns(missing));
    };

    let mut by_key: BTreeMap<S::Key, S::Row> = BTreeMap::new();
    let mut parsed = ParsedCsv {
        rows: Vec::new(),
        total_rows: 0,
        skipped: 0,
        duplicates_collapsed: 0,
        issues: Vec::new(),
    };

    for (idx, record) in reader.records().enumerate() {
        parsed.total_rows += 1;
        // Header is line 1.
        let fallback_line = u64::try_from(idx).unwrap_or(u64::MAX).saturating_add(2);
        let outcome = match record {
            Ok(record) => {
                let line = record.position().map_or(fallback_line, csv::Position::line);
                schema.parse(&record).map_err(|e| RowIssue { line, reason: e.to_string() })
            },
            Err(e) => Err(RowIssue {
                line: e.position().map_or(fallback_line, csv::Position::line),
                reason: e.to_string(),
            }),
        };
        match outcome {
            Ok(row) => {
                if by_key.insert(S::key(&row), row).is_some() {
                    parsed.duplicates_collapsed += 1;
                }
            },
            Err(issue) if policy == RowPolicy::Reject => {
                return Err(IngestError::InvalidRow { line: issue.line, reason: issue.reason });
            },
            Err(issue) => {
                parsed.skipped += 1;
                if parsed.issues.len() < MAX_REPORTED_ROW_ISSUES {
                    parsed.issues.push(issue);
                }
            },
        }
    }

    if by_key.is_empty() {
        return Err(IngestError::NoValidRows { skipped: parsed.skipped });
    }
    parsed.rows = by_key.into_values().collect();
    Ok(parsed)
}

/// Turns uploaded CSV files into stored rows.
pub struct IngestService {
    storage: SharedStore,
}

impl IngestService {
    #[must_use]
    pub const fn new(storage: SharedStore) -> Self {
        Self { storage }
    }

    /// Validate and store one file. Either every valid row is written or none.
    pub async fn ingest(
        &self,
        file_name: &str,
        content: &[u8],
        dataset: DatasetKind,
        policy: RowPolicy,
    ) -> Result<IngestReport, ServiceError> {
        if !file_name.to_ascii_lowercase().ends_with(".csv") {
            return Err(IngestError::NotCsv(file_name.to_owned()).into());
        }

        let (written, total_rows, skipped, duplicates_collapsed, issues) = match dataset {
            DatasetKind::Index => {
                let parsed = parse_csv::<IndexSchema>(content, policy)?;
                let written = self.storage.upsert_index_rows(&parsed.rows).await?;
                (written, parsed.total_rows, parsed.skipped, parsed.duplicates_collapsed, parsed.issues)
            },
            DatasetKind::Options => {
                let parsed = parse_csv::<OptionSchema>(content, policy)?;
                let written = self.storage.upsert_options_rows(&parsed.rows).await?;
                (written, parsed.total_rows, parsed.skipped, parsed.duplicates_collapsed, parsed.issues)
            },
        };

        tracing::info!(
            file = file_name,
            dataset = dataset.as_str(),
            total_rows,
            written,
            skipped,
            duplicates_collapsed,
            "CSV ingested"
        );

        Ok(IngestReport {
            file_name: file_name.to_owned(),
            dataset,
            policy,
            total_rows,
            written,
            skipped,
            duplicates_collapsed,
            issues,
        })
    }

    /// Ingest each file independently; one failure does not stop the rest.
    pub async fn ingest_batch(
        &self,
        files: Vec<UploadedFile>,
        dataset: DatasetKind,
        policy: RowPolicy,
    ) -> BatchReport {
        let mut outcomes = Vec::with_capacity(files.len());
        for file in files {
            let result = self.ingest(&file.name, &file.content, dataset, policy).await;
            if let Err(ref e) = result {
                tracing::warn!(file = %file.name, dataset = dataset.as_str(), error = %e, "upload rejected");
            }
            outcomes.push(FileOutcome { file_name: file.name, result });
        }
        BatchReport { dataset, policy, outcomes }
    }
}
