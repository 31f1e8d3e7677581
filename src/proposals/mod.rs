//! Proposal datasets: loading, validation, and the merged bilingual view.

pub mod challenge;
pub mod ingest;
pub mod inspect;
pub mod merge;
pub mod tidy;

use std::collections::HashSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::config::SiteConfig;

pub use merge::merge_proposals;

/// Field holding the join key shared by both datasets.
pub const ID_FIELD: &str = "proposal_id";

/// Group label for records whose challenge is absent or not a string.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Which dataset a record or error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    English,
    Japanese,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::English => f.write_str("en"),
            Source::Japanese => f.write_str("ja"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProposalError {
    #[error("{source_name} proposals not found: {}", path.display())]
    NotFound { source_name: Source, path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("{} is not valid UTF-8", path.display())]
    Encoding { path: PathBuf },

    #[error("malformed {source_name} proposals JSON: {source}")]
    Parse {
        source_name: Source,
        source: serde_json::Error,
    },

    #[error("{source_name} proposals: {reason}")]
    InvalidShape { source_name: Source, reason: String },

    #[error("{source_name} record #{index} has no usable proposal_id")]
    MissingId { source_name: Source, index: usize },

    #[error("{source_name} proposals contain duplicate proposal_id '{id}'")]
    DuplicateId { source_name: Source, id: String },

    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("malformed results CSV {}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },

    #[error("results CSV {} has no '{column}' column", path.display())]
    MissingColumn { path: PathBuf, column: String },
}

/// One proposal: its join key plus every field of the source object.
///
/// `fields` still contains `proposal_id` itself, so serializing a record
/// reproduces the original object.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: String,
    fields: Map<String, Value>,
}

impl Record {
    /// Build a record from a JSON object, extracting its id.
    ///
    /// Integer ids are accepted and keyed by their decimal text.
    pub fn from_fields(fields: Map<String, Value>) -> Option<Self> {
        let id = match fields.get(ID_FIELD)? {
            Value::String(s) => s.clone(),
            Value::Number(n) if n.is_i64() || n.is_u64() => n.to_string(),
            _ => return None,
        };
        Some(Self { id, fields })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub(crate) fn fields_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Non-empty string value of `field`.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    pub fn challenge(&self) -> Option<&str> {
        self.get_str("challenge")
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

/// Parse a proposals document: a top-level array, or `{"proposals": [...]}`.
pub fn parse_records(source: Source, text: &str) -> Result<Vec<Record>, ProposalError> {
    let doc: Value = serde_json::from_str(text).map_err(|e| ProposalError::Parse {
        source_name: source,
        source: e,
    })?;

    let items = match doc {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("proposals") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(ProposalError::InvalidShape {
                    source_name: source,
                    reason: "expected an array or an object with a \"proposals\" array".into(),
                });
            }
        },
        other => {
            return Err(ProposalError::InvalidShape {
                source_name: source,
                reason: format!("expected an array, got {}", json_kind(&other)),
            });
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(fields) => Record::from_fields(fields).ok_or(ProposalError::MissingId {
                source_name: source,
                index,
            }),
            other => Err(ProposalError::InvalidShape {
                source_name: source,
                reason: format!("record #{index} is {}, not an object", json_kind(&other)),
            }),
        })
        .collect()
}

/// Read and parse a proposals file.
pub fn load_records(source: Source, path: &Path) -> Result<Vec<Record>, ProposalError> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ProposalError::NotFound {
            source_name: source,
            path: path.to_path_buf(),
        },
        _ => ProposalError::Read {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let (text, malformed) = encoding_rs::UTF_8.decode_with_bom_removal(&bytes);
    if malformed {
        return Err(ProposalError::Encoding {
            path: path.to_path_buf(),
        });
    }

    let records = parse_records(source, &text)?;
    debug!(source = %source, path = %path.display(), count = records.len(), "proposals loaded");
    Ok(records)
}

/// Reject a collection in which any `proposal_id` repeats.
pub fn ensure_unique(source: Source, records: &[Record]) -> Result<(), ProposalError> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.id()) {
            return Err(ProposalError::DuplicateId {
                source_name: source,
                id: record.id().to_string(),
            });
        }
    }
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The merged proposal list for one generation run.
///
/// Loaded once at startup and passed by reference to whatever renders pages.
#[derive(Debug, Clone)]
pub struct ProposalData {
    records: Vec<Record>,
}

impl ProposalData {
    pub fn load(config: &SiteConfig) -> Result<Self, ProposalError> {
        let en = load_records(Source::English, &config.en_path())?;
        let ja = load_records(Source::Japanese, &config.ja_path())?;
        let data = Self::from_collections(en, ja)?;
        info!(proposals = data.len(), "proposal data ready");
        Ok(data)
    }

    pub fn from_collections(en: Vec<Record>, ja: Vec<Record>) -> Result<Self, ProposalError> {
        Ok(Self {
            records: merge_proposals(&en, ja)?,
        })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records grouped by challenge label, groups in first-seen order.
    pub fn by_challenge(&self) -> Vec<(&str, Vec<&Record>)> {
        let mut groups: Vec<(&str, Vec<&Record>)> = Vec::new();
        for record in &self.records {
            let label = record.challenge().unwrap_or(UNCATEGORIZED);
            match groups.iter_mut().find(|(l, _)| *l == label) {
                Some((_, members)) => members.push(record),
                None => groups.push((label, vec![record])),
            }
        }
        groups
    }
}

#[cfg(test)]
pub(crate) fn record(value: Value) -> Record {
    match value {
        Value::Object(fields) => Record::from_fields(fields).expect("record needs proposal_id"),
        other => panic!("not an object: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_top_level_array() {
        let records = parse_records(
            Source::English,
            r#"[{"proposal_id":"1","title_en":"A"},{"proposal_id":"2"}]"#,
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id(), "1");
        assert_eq!(records[0].get_str("title_en"), Some("A"));
    }

    #[test]
    fn parses_wrapped_proposals_object() {
        let records =
            parse_records(Source::Japanese, r#"{"proposals":[{"proposal_id":"F14-0001"}]}"#)
                .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id(), "F14-0001");
    }

    #[test]
    fn integer_ids_are_keyed_as_text() {
        let records = parse_records(Source::English, r#"[{"proposal_id":42}]"#).unwrap();
        assert_eq!(records[0].id(), "42");
        assert_eq!(records[0].get(ID_FIELD), Some(&json!(42)));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = parse_records(Source::English, "[{").unwrap_err();
        assert!(matches!(
            err,
            ProposalError::Parse {
                source_name: Source::English,
                ..
            }
        ));
    }

    #[test]
    fn scalar_document_is_invalid_shape() {
        let err = parse_records(Source::Japanese, "\"hello\"").unwrap_err();
        assert!(matches!(err, ProposalError::InvalidShape { .. }));
        assert!(err.to_string().contains("a string"), "got: {err}");
    }

    #[test]
    fn non_object_element_is_invalid_shape() {
        let err = parse_records(Source::Japanese, r#"[{"proposal_id":"1"}, 5]"#).unwrap_err();
        assert!(err.to_string().contains("record #1"), "got: {err}");
    }

    #[test]
    fn missing_or_bad_id_is_rejected() {
        let err = parse_records(Source::Japanese, r#"[{"title_ja":"x"}]"#).unwrap_err();
        assert!(matches!(err, ProposalError::MissingId { index: 0, .. }));

        let err = parse_records(Source::Japanese, r#"[{"proposal_id":null}]"#).unwrap_err();
        assert!(matches!(err, ProposalError::MissingId { .. }));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let records = vec![
            record(json!({"proposal_id": "1"})),
            record(json!({"proposal_id": "1"})),
        ];
        let err = ensure_unique(Source::English, &records).unwrap_err();
        assert!(matches!(err, ProposalError::DuplicateId { ref id, .. } if id == "1"));
        assert_eq!(
            err.to_string(),
            "en proposals contain duplicate proposal_id '1'"
        );
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_records(Source::English, &dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(
            err,
            ProposalError::NotFound {
                source_name: Source::English,
                ..
            }
        ));
    }

    #[test]
    fn load_strips_utf8_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ja.json");
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(r#"[{"proposal_id":"1","title_ja":"題名"}]"#.as_bytes());
        std::fs::write(&path, bytes).unwrap();

        let records = load_records(Source::Japanese, &path).unwrap();
        assert_eq!(records[0].get_str("title_ja"), Some("題名"));
    }

    #[test]
    fn load_rejects_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("en.json");
        std::fs::write(&path, [b'[', 0xFF, b']']).unwrap();
        let err = load_records(Source::English, &path).unwrap_err();
        assert!(matches!(err, ProposalError::Encoding { .. }));
    }

    #[test]
    fn record_serializes_as_its_fields() {
        let r = record(json!({"proposal_id": "7", "title_en": "Seven"}));
        let text = serde_json::to_string(&r).unwrap();
        assert_eq!(text, r#"{"proposal_id":"7","title_en":"Seven"}"#);
    }

    #[test]
    fn groups_by_challenge_in_first_seen_order() {
        let data = ProposalData::from_collections(
            vec![],
            vec![
                record(json!({"proposal_id": "1", "challenge": "Withdrawn"})),
                record(json!({"proposal_id": "2", "challenge": "Cardano Open Developers"})),
                record(json!({"proposal_id": "3"})),
                record(json!({"proposal_id": "4", "challenge": "Withdrawn"})),
            ],
        )
        .unwrap();

        let groups = data.by_challenge();
        let labels: Vec<&str> = groups.iter().map(|(l, _)| *l).collect();
        assert_eq!(
            labels,
            ["Withdrawn", "Cardano Open: Developers", UNCATEGORIZED]
        );
        let withdrawn: Vec<&str> = groups[0].1.iter().map(|r| r.id()).collect();
        assert_eq!(withdrawn, ["1", "4"]);
    }

    #[test]
    fn load_reads_both_files_from_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("en.json"),
            r#"[{"proposal_id":"1","problem_en":"P"}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("ja.json"),
            r#"[{"proposal_id":"1","title_ja":"T"}]"#,
        )
        .unwrap();
        let config = SiteConfig {
            data_dir: dir.path().to_path_buf(),
            en_file: "en.json".into(),
            ja_file: "ja.json".into(),
            ..SiteConfig::default()
        };

        let data = ProposalData::load(&config).unwrap();
        assert_eq!(data.len(), 1);
        let merged = &data.records()[0];
        assert_eq!(merged.get_str("problem_en"), Some("P"));
        assert_eq!(merged.get_str("title_ja"), Some("T"));
    }

    #[test]
    fn load_fails_when_japanese_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("en.json"), "[]").unwrap();
        let config = SiteConfig {
            data_dir: dir.path().to_path_buf(),
            en_file: "en.json".into(),
            ja_file: "ja.json".into(),
            ..SiteConfig::default()
        };
        let err = ProposalData::load(&config).unwrap_err();
        assert!(matches!(
            err,
            ProposalError::NotFound {
                source_name: Source::Japanese,
                ..
            }
        ));
    }
}
