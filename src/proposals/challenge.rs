use serde_json::{Map, Value};

/// Display labels for the raw challenge codes found in the Fund 14 exports.
///
/// The first entry's key is truncated in the source data; the label restores it.
const CHALLENGE_LABELS: &[(&str, &str)] = &[
    (
        "Cardano Use Cases Partners & Pr",
        "Cardano Use Cases: Partners & Products",
    ),
    ("Cardano Use Cases Concept", "Cardano Use Cases: Concept"),
    ("Cardano Open Developers", "Cardano Open: Developers"),
    ("Cardano Open Ecosystem", "Cardano Open: Ecosystem"),
    ("Sponsored by leftovers", "Sponsored by leftovers"),
    ("Withdrawn", "Withdrawn"),
];

/// Exact-match lookup of a raw challenge code.
pub fn challenge_label(code: &str) -> Option<&'static str> {
    CHALLENGE_LABELS
        .iter()
        .find(|(raw, _)| *raw == code)
        .map(|(_, label)| *label)
}

/// Replace a known `challenge` code in place. Anything else is left as is.
pub fn resolve_challenge(fields: &mut Map<String, Value>) {
    if let Some(Value::String(code)) = fields.get_mut("challenge")
        && let Some(label) = challenge_label(code.as_str())
    {
        *code = label.to_string();
    }
}
