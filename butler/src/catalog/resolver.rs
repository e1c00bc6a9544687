//! Command text to catalog record resolution
//!
//! Resolution is greedy substring containment, not fuzzy matching: an exact
//! key wins outright, otherwise the longest catalog key contained in the
//! command (case-insensitively) is chosen. Compound device names are
//! often substrings of fuller phrases, so the longest key is the most
//! specific one.

use std::borrow::Cow;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::catalog::{DeviceCatalog, DeviceRecord};
use crate::errors::DeviceNotFound;

/// How a query matched its record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Partial,
}

/// A successful resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub record: DeviceRecord,
    pub kind: MatchKind,
}

/// Unwrap `{"message": "..."}` payloads sent by an upstream dispatcher.
///
/// Anything else, including JSON without a string `message`, is returned
/// verbatim.
pub fn unwrap_payload(raw: &str) -> Cow<'_, str> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => match map.get("message") {
            Some(Value::String(message)) => Cow::Owned(message.clone()),
            _ => Cow::Borrowed(raw),
        },
        _ => Cow::Borrowed(raw),
    }
}

/// Resolve command text against the catalog
pub fn resolve<C>(catalog: &C, raw_query: &str) -> Result<Resolution, DeviceNotFound>
where
    C: DeviceCatalog + ?Sized,
{
    let unwrapped = unwrap_payload(raw_query);
    let query = unwrapped.trim();
    debug!("Resolving device for input: {}", raw_query);

    if let Some(record) = catalog.get(query) {
        info!("Exact match for device: {}", record.name);
        return Ok(Resolution {
            record: record.clone(),
            kind: MatchKind::Exact,
        });
    }

    let lowered = query.to_lowercase();
    let mut best: Option<(&str, usize)> = None;
    for name in catalog.names() {
        if !lowered.contains(&name.to_lowercase()) {
            continue;
        }
        let len = name.chars().count();
        // Strictly longer only: among equal lengths the earliest key wins.
        if best.map_or(true, |(_, best_len)| len > best_len) {
            best = Some((name, len));
        }
    }

    match best.and_then(|(name, _)| catalog.get(name)) {
        Some(record) => {
            info!("Partial match for device: {}", record.name);
            Ok(Resolution {
                record: record.clone(),
                kind: MatchKind::Partial,
            })
        }
        None => Err(DeviceNotFound {
            query: query.to_string(),
            available_names: catalog.names().into_iter().map(str::to_string).collect(),
        }),
    }
}
