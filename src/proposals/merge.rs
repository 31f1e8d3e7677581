use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::debug;

use super::challenge::resolve_challenge;
use super::{ProposalError, Record, Source, ensure_unique};

/// Apply `top` over `base`; the second argument wins.
///
/// Keys keep their position from `base`; keys only in `top` are appended in
/// `top`'s order.
pub fn overlay(base: &Map<String, Value>, top: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = base.clone();
    for (key, value) in top {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Join the Japanese collection against the English one by `proposal_id`.
///
/// Output has one record per Japanese record, in Japanese order. English
/// records with no Japanese counterpart are dropped.
pub fn merge_proposals(en: &[Record], ja: Vec<Record>) -> Result<Vec<Record>, ProposalError> {
    ensure_unique(Source::English, en)?;
    ensure_unique(Source::Japanese, &ja)?;

    let en_by_id: HashMap<&str, &Record> = en.iter().map(|r| (r.id(), r)).collect();
    let empty = Map::new();
    let mut matched = 0usize;

    let merged = ja
        .into_iter()
        .map(|jp| {
            let base = match en_by_id.get(jp.id()) {
                Some(en) => {
                    matched += 1;
                    en.fields()
                }
                None => {
                    debug!(id = jp.id(), "no English counterpart");
                    &empty
                }
            };
            let mut one = Record {
                fields: overlay(base, jp.fields()),
                id: jp.id,
            };
            resolve_challenge(one.fields_mut());
            one
        })
        .collect::<Vec<_>>();

    let dropped = en.len() - matched;
    if dropped > 0 {
        debug!(dropped, "English proposals without a Japanese counterpart");
    }
    Ok(merged)
}
