//! Builds the English dataset from the Fund 14 results export.
//!
//! The export is a CSV with one row per proposal plus the odd total or blank
//! row. Each row with a title becomes a record with a positional
//! `F14-NNNN` id, which is the key the Japanese translation is joined on.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info};

use super::{ID_FIELD, ProposalError, Record, tidy::write_records};

/// Fund number written into every ingested record.
pub const FUND: u64 = 14;

/// Header names read from the results export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvColumns {
    pub title: String,
    /// Without a challenge column every record gets `""`.
    pub challenge: Option<String>,
    pub requested: Option<String>,
}

impl Default for CsvColumns {
    fn default() -> Self {
        Self {
            title: "Proposal".to_string(),
            challenge: None,
            requested: Some("Requested Ada".to_string()),
        }
    }
}

/// Turn the results CSV text into English proposal records.
///
/// Rows with a blank title are skipped but still count towards the id, so
/// `F14-0003` is always the third data row of the export.
pub fn records_from_csv(
    path: &Path,
    text: &str,
    columns: &CsvColumns,
) -> Result<Vec<Record>, ProposalError> {
    let csv_error = |e: csv::Error| ProposalError::Csv {
        path: path.to_path_buf(),
        source: e,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers().map_err(csv_error)?.clone();
    let position = |name: &str| headers.iter().position(|h| h.trim() == name);

    let title_at = position(&columns.title).ok_or_else(|| ProposalError::MissingColumn {
        path: path.to_path_buf(),
        column: columns.title.clone(),
    })?;
    let challenge_at = columns.challenge.as_deref().and_then(position);
    let requested_at = columns.requested.as_deref().and_then(position);

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.map_err(csv_error)?;
        let cell = |at: Option<usize>| {
            at.and_then(|i| row.get(i))
                .map(str::trim)
                .unwrap_or_default()
                .to_string()
        };

        let title = cell(Some(title_at));
        if title.is_empty() {
            debug!(row = index + 1, "row without title skipped");
            continue;
        }

        let id = format!("F14-{:04}", index + 1);
        let mut fields = Map::new();
        fields.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        fields.insert("fund".to_string(), Value::from(FUND));
        fields.insert("challenge".to_string(), Value::String(cell(challenge_at)));
        fields.insert("title_en".to_string(), Value::String(title));
        fields.insert("summary_en".to_string(), Value::String(String::new()));
        fields.insert("requested_ada".to_string(), Value::String(cell(requested_at)));
        records.push(Record { id, fields });
    }
    Ok(records)
}

/// Read the results CSV at `path` and write the English dataset to `output`.
///
/// A leading UTF-8 BOM is ignored, as spreadsheet exports usually carry one.
pub fn ingest_file(
    path: &Path,
    output: &Path,
    columns: &CsvColumns,
) -> Result<usize, ProposalError> {
    let bytes = std::fs::read(path).map_err(|e| ProposalError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let (text, malformed) = encoding_rs::UTF_8.decode_with_bom_removal(&bytes);
    if malformed {
        return Err(ProposalError::Encoding {
            path: path.to_path_buf(),
        });
    }

    let records = records_from_csv(path, &text, columns)?;
    write_records(output, &records)?;
    info!(
        csv = %path.display(),
        path = %output.display(),
        proposals = records.len(),
        "english proposals written"
    );
    Ok(records.len())
}
