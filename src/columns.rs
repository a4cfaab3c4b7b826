//! Header canonicalization.
//!
//! Uploaded files use free-form header names ("Release Year", "duration.ms").
//! Detection and query building rely on fixed literal names, so every header is
//! rewritten to a canonical form before the table reaches the store:
//!
//! - periods removed
//! - leading/trailing whitespace trimmed
//! - each internal space replaced with `_`
//! - lowercased
//!
//! A header that is empty after these steps (the unnamed index column of a
//! pandas export, for instance) takes the positional name `unnamed_{idx}`.

use std::collections::BTreeMap;

pub fn normalize_header(raw: &str) -> String {
    let without_periods = raw.replace('.', "");
    without_periods
        .trim()
        .chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn normalize_headers<S: AsRef<str>>(headers: &[S]) -> Vec<String> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, header)| column_name(idx, header.as_ref()))
        .collect()
}

fn column_name(idx: usize, raw: &str) -> String {
    let normalized = normalize_header(raw);
    if normalized.is_empty() {
        format!("unnamed_{idx}")
    } else {
        normalized
    }
}

/// Canonical names produced by more than one raw header, with the raw headers
/// that produced them in file order.
pub fn find_collisions<S: AsRef<str>>(headers: &[S]) -> Vec<(String, Vec<String>)> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (idx, header) in headers.iter().enumerate() {
        groups
            .entry(column_name(idx, header.as_ref()))
            .or_default()
            .push(header.as_ref().to_string());
    }
    groups
        .into_iter()
        .filter(|(_, raw)| raw.len() > 1)
        .collect()
}
