use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde_json::Value;

use super::Record;

/// String values longer than this get a preview block.
const LONG_VALUE_CHARS: usize = 120;
const PREVIEW_CHARS: usize = 400;

/// Human-readable summary of a dataset: record count, the keys of the first
/// record, and previews of its long text fields.
pub fn describe(records: &[Record]) -> String {
    let mut out = format!("Total proposals: {}\n", records.len());
    let Some(first) = records.first() else {
        return out;
    };

    let keys: BTreeSet<&str> = first.fields().keys().map(String::as_str).collect();
    let listed: Vec<&str> = keys.iter().copied().collect();
    let _ = writeln!(out, "Keys: {}", listed.join(", "));

    let all_keys: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.fields().keys().map(String::as_str))
        .collect();
    let missing: Vec<&str> = all_keys.difference(&keys).copied().collect();
    if !missing.is_empty() {
        let _ = writeln!(out, "Keys absent from first record: {}", missing.join(", "));
    }

    for (key, value) in first.fields() {
        if let Value::String(s) = value {
            let len = s.chars().count();
            if len > LONG_VALUE_CHARS {
                let preview: String = s.chars().take(PREVIEW_CHARS).collect();
                let _ = write!(out, "\n--- {key} (len={len}) ---\n{preview} ...\n");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposals::record;
    use serde_json::json;

    #[test]
    fn empty_dataset_reports_zero() {
        assert_eq!(describe(&[]), "Total proposals: 0\n");
    }

    #[test]
    fn lists_sorted_keys_and_long_previews() {
        let long = "あ".repeat(500);
        let records = vec![
            record(json!({"title_ja": "短い", "proposal_id": "1", "about_ja": long})),
            record(json!({"proposal_id": "2", "team_en": "T"})),
        ];
        let text = describe(&records);

        assert!(text.starts_with("Total proposals: 2\n"));
        assert!(text.contains("Keys: about_ja, proposal_id, title_ja\n"), "got: {text}");
        assert!(text.contains("Keys absent from first record: team_en"));
        assert!(text.contains("--- about_ja (len=500) ---"));
        assert!(text.contains(&format!("{} ...", "あ".repeat(400))));
        assert!(!text.contains("--- title_ja"));
    }
}
