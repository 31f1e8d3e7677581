//! Hygiene pass over the Japanese dataset.
//!
//! Machine translation leaves ideographic spaces in titles, folds the first
//! summary line into `title_ja`, or leaves the title as a `---` placeholder.
//! These rules repair the file in place; `build` never applies them.

use std::path::Path;

use serde_json::Value;
use tracing::info;

use super::{ProposalError, Record, Source, load_records};

const TITLE: &str = "title_ja";
const SUMMARY: &str = "summary_ja";
const IDEOGRAPHIC_SPACE: char = '\u{3000}';
const PLACEHOLDER_TITLES: &[&str] = &["", "---", "—"];

/// Number of records each rule changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TidyReport {
    pub spaces_removed: usize,
    pub titles_split: usize,
    pub titles_restored: usize,
}

pub fn tidy_records(records: &mut [Record]) -> TidyReport {
    let mut report = TidyReport::default();
    for record in records.iter_mut() {
        if strip_ideographic_spaces(record) {
            report.spaces_removed += 1;
        }
        if split_multiline_title(record) {
            report.titles_split += 1;
        }
        if restore_placeholder_title(record) {
            report.titles_restored += 1;
        }
    }
    report
}

fn string_field<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}

fn set_string(record: &mut Record, field: &str, value: String) {
    record
        .fields_mut()
        .insert(field.to_string(), Value::String(value));
}

fn strip_ideographic_spaces(record: &mut Record) -> bool {
    let mut changed = false;
    for field in [TITLE, SUMMARY] {
        if let Some(Value::String(s)) = record.fields_mut().get_mut(field)
            && s.contains(IDEOGRAPHIC_SPACE)
        {
            *s = s.replace(IDEOGRAPHIC_SPACE, "");
            changed = true;
        }
    }
    changed
}

fn split_multiline_title(record: &mut Record) -> bool {
    let Some((first, rest)) = string_field(record, TITLE).and_then(|t| t.split_once('\n')) else {
        return false;
    };
    let first = first.trim().to_string();
    let rest = rest.trim().to_string();

    if !rest.is_empty() {
        let summary = match string_field(record, SUMMARY).filter(|s| !s.is_empty()) {
            Some(existing) => format!("{rest}\n\n{existing}"),
            None => rest,
        };
        set_string(record, SUMMARY, summary);
    }
    set_string(record, TITLE, first);
    true
}

fn restore_placeholder_title(record: &mut Record) -> bool {
    let title = string_field(record, TITLE).unwrap_or("").trim();
    if !PLACEHOLDER_TITLES.contains(&title) {
        return false;
    }
    let Some(summary) = string_field(record, SUMMARY) else {
        return false;
    };

    let mut lines = summary.lines().map(str::trim).filter(|l| !l.is_empty());
    let Some(new_title) = lines.next().map(str::to_string) else {
        return false;
    };
    let new_summary = lines.collect::<Vec<_>>().join("\n");

    set_string(record, TITLE, new_title);
    set_string(record, SUMMARY, new_summary);
    true
}

/// Tidy the Japanese proposals file at `path`.
///
/// Without `output` the file is rewritten in place after copying it to
/// `<stem>.backup.json` next to it.
pub fn tidy_file(path: &Path, output: Option<&Path>) -> Result<TidyReport, ProposalError> {
    let mut records = load_records(Source::Japanese, path)?;
    let report = tidy_records(&mut records);

    let target = output.unwrap_or(path);
    if same_file(target, path) {
        let backup = path.with_extension("backup.json");
        std::fs::copy(path, &backup).map_err(|e| ProposalError::Write {
            path: backup.clone(),
            source: e,
        })?;
        info!(backup = %backup.display(), "backup created");
    }
    write_records(target, &records)?;

    info!(
        path = %target.display(),
        spaces_removed = report.spaces_removed,
        titles_split = report.titles_split,
        titles_restored = report.titles_restored,
        "japanese proposals tidied"
    );
    Ok(report)
}

/// Whether both paths name one file. Paths that cannot be resolved, such as
/// an output that does not exist yet, are compared as written.
fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Write records as pretty-printed JSON, keeping non-ASCII text as is.
pub fn write_records(path: &Path, records: &[Record]) -> Result<(), ProposalError> {
    let mut text = serde_json::to_string_pretty(records).map_err(|e| ProposalError::Write {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    text.push('\n');
    std::fs::write(path, text).map_err(|e| ProposalError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposals::record;
    use serde_json::json;

    fn tidied(value: Value) -> (Record, TidyReport) {
        let mut records = vec![record(value)];
        let report = tidy_records(&mut records);
        (records.remove(0), report)
    }

    #[test]
    fn removes_ideographic_spaces() {
        let (r, report) = tidied(json!({
            "proposal_id": "1",
            "title_ja": "カルダノ\u{3000}開発",
            "summary_ja": "\u{3000}概要",
            "about_ja": "そのまま\u{3000}",
        }));
        assert_eq!(r.get_str("title_ja"), Some("カルダノ開発"));
        assert_eq!(r.get_str("summary_ja"), Some("概要"));
        assert_eq!(r.get_str("about_ja"), Some("そのまま\u{3000}"));
        assert_eq!(report.spaces_removed, 1);
    }

    #[test]
    fn moves_extra_title_lines_into_summary() {
        let (r, report) = tidied(json!({
            "proposal_id": "1",
            "title_ja": " 題名 \n 続きの説明 ",
            "summary_ja": "元の概要",
        }));
        assert_eq!(r.get_str("title_ja"), Some("題名"));
        assert_eq!(r.get_str("summary_ja"), Some("続きの説明\n\n元の概要"));
        assert_eq!(report.titles_split, 1);
    }

    #[test]
    fn split_title_without_summary_creates_one() {
        let (r, _) = tidied(json!({"proposal_id": "1", "title_ja": "題名\n説明"}));
        assert_eq!(r.get_str("summary_ja"), Some("説明"));
    }

    #[test]
    fn restores_placeholder_title_from_summary() {
        let (r, report) = tidied(json!({
            "proposal_id": "1",
            "title_ja": "---",
            "summary_ja": "\n  本当の題名  \n\n一行目\n二行目\n",
        }));
        assert_eq!(r.get_str("title_ja"), Some("本当の題名"));
        assert_eq!(r.get_str("summary_ja"), Some("一行目\n二行目"));
        assert_eq!(report.titles_restored, 1);
    }

    #[test]
    fn placeholder_without_summary_is_left_alone() {
        let (r, report) = tidied(json!({"proposal_id": "1", "title_ja": "—"}));
        assert_eq!(r.get("title_ja"), Some(&json!("—")));
        assert_eq!(report, TidyReport::default());
    }

    #[test]
    fn clean_record_is_unchanged() {
        let value = json!({"proposal_id": "1", "title_ja": "題名", "summary_ja": "概要"});
        let (r, report) = tidied(value.clone());
        assert_eq!(serde_json::to_value(&r).unwrap(), value);
        assert_eq!(report, TidyReport::default());
    }

    #[test]
    fn written_file_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ja.json");
        let records = vec![record(json!({"proposal_id": "1", "title_ja": "題名"}))];

        write_records(&path, &records).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("題名"), "non-ASCII should not be escaped");
        assert!(text.starts_with("[\n  {\n    \"proposal_id\""), "got: {text}");
        assert_eq!(load_records(Source::Japanese, &path).unwrap(), records);
    }

    #[test]
    fn tidy_file_in_place_keeps_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f14_proposals_ja.json");
        let original = r#"[{"proposal_id":"1","title_ja":"題名\u3000"}]"#;
        std::fs::write(&path, original).unwrap();

        let report = tidy_file(&path, None).unwrap();
        assert_eq!(report.spaces_removed, 1);

        let backup = dir.path().join("f14_proposals_ja.backup.json");
        assert_eq!(std::fs::read_to_string(backup).unwrap(), original);
        let tidied = load_records(Source::Japanese, &path).unwrap();
        assert_eq!(tidied[0].get_str("title_ja"), Some("題名"));
    }

    #[test]
    fn tidy_file_to_other_output_leaves_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ja.json");
        let out = dir.path().join("ja_clean.json");
        std::fs::write(&path, r#"[{"proposal_id":"1","title_ja":"---","summary_ja":"T\nS"}]"#)
            .unwrap();

        let report = tidy_file(&path, Some(&out)).unwrap();
        assert_eq!(report.titles_restored, 1);
        assert!(!dir.path().join("ja.backup.json").exists());
        let tidied = load_records(Source::Japanese, &out).unwrap();
        assert_eq!(tidied[0].get_str("title_ja"), Some("T"));
        assert_eq!(tidied[0].get_str("summary_ja"), Some("S"));
    }

    #[test]
    fn tidy_file_to_same_file_spelled_differently_keeps_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f14_proposals_ja.json");
        let original = r#"[{"proposal_id":"1","title_ja":"題名\u3000"}]"#;
        std::fs::write(&path, original).unwrap();

        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let alias = dir.path().join("sub/../f14_proposals_ja.json");
        tidy_file(&path, Some(&alias)).unwrap();

        let backup = dir.path().join("f14_proposals_ja.backup.json");
        assert_eq!(std::fs::read_to_string(backup).unwrap(), original);
    }

    #[test]
    fn same_file_resolves_aliases() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.json");
        std::fs::write(&path, "[]").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        assert!(same_file(&path, &dir.path().join("sub/../a.json")));
        assert!(!same_file(&path, &dir.path().join("missing.json")));
        assert!(same_file(Path::new("missing.json"), Path::new("missing.json")));
    }
}
