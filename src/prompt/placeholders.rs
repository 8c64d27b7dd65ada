//! `{{placeholder}}` extraction and validation against a query set's fields.
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::{CaptureMatches, Regex};
use serde::Serialize;

pub(crate) static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^}]+)\}\}").expect("invalid placeholder regex"));

/// Placeholder names filled in at judgment time rather than from sample text.
pub const AUTO_FILLED: &[&str] = &["hits", "results"];

/// Lazy, de-duplicating scan over the placeholders of a piece of text.
///
/// Names are trimmed and yielded once, at their first occurrence. Call
/// [`placeholders`] again to restart the scan.
pub struct Placeholders<'t> {
    matches: CaptureMatches<'static, 't>,
    seen: HashSet<&'t str>,
}

impl<'t> Iterator for Placeholders<'t> {
    type Item = &'t str;

    fn next(&mut self) -> Option<Self::Item> {
        for caps in self.matches.by_ref() {
            let Some(inner) = caps.get(1) else { continue };
            let name = inner.as_str().trim();
            if name.is_empty() {
                continue;
            }
            if self.seen.insert(name) {
                return Some(name);
            }
        }
        None
    }
}

pub fn placeholders(text: &str) -> Placeholders<'_> {
    Placeholders {
        matches: PLACEHOLDER_RE.captures_iter(text),
        seen: HashSet::new(),
    }
}

/// Ordered, de-duplicated placeholder names found in `text`.
pub fn extract_placeholders(text: &str) -> Vec<String> {
    placeholders(text).map(str::to_string).collect()
}

pub fn is_auto_filled(name: &str) -> bool {
    AUTO_FILLED.iter().any(|reserved| reserved.eq_ignore_ascii_case(name))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderPartition {
    pub valid_placeholders: Vec<String>,
    pub invalid_placeholders: Vec<String>,
}

impl PlaceholderPartition {
    /// No unknown placeholders remain.
    pub fn is_ready(&self) -> bool {
        self.invalid_placeholders.is_empty()
    }
}

/// Split `placeholders` into those present in `known_fields` and the rest.
///
/// An empty field set constrains nothing: every placeholder is valid. Matching
/// is exact and case-sensitive; each bucket keeps the input order.
pub fn validate_placeholders<S: AsRef<str>>(placeholders: &[String], known_fields: &[S]) -> PlaceholderPartition {
    if known_fields.is_empty() {
        return PlaceholderPartition {
            valid_placeholders: placeholders.to_vec(),
            invalid_placeholders: Vec::new(),
        };
    }
    let known: HashSet<&str> = known_fields.iter().map(AsRef::as_ref).collect();
    let (valid, invalid): (Vec<String>, Vec<String>) = placeholders
        .iter()
        .cloned()
        .partition(|name| known.contains(name.as_str()));
    PlaceholderPartition {
        valid_placeholders: valid,
        invalid_placeholders: invalid,
    }
}

/// Placeholders that still need a sample value before the prompt can be tried
/// against a judge model. Auto-filled names never do.
pub fn missing_sample_values(placeholders: &[String], values: &BTreeMap<String, String>) -> Vec<String> {
    placeholders
        .iter()
        .filter(|name| !is_auto_filled(name))
        .filter(|name| values.get(name.as_str()).map_or(true, |v| v.trim().is_empty()))
        .cloned()
        .collect()
}
