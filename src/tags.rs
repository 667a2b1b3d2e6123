use indexmap::IndexMap;
use serde_json::Value;

use crate::extract::ExtractedRow;

/// Keyword prefix carrying the PDF V2 category of a layer.
pub const PDF_HAZARD_PREFIX: &str = "pdf:hazardlookup:";
/// Tag reported for layers without a [`PDF_HAZARD_PREFIX`] keyword.
pub const NO_PDF_LABEL: &str = "not attached to PDF V2";

/// Known tags in display priority order.
pub const CANONICAL_TAG_ORDER: [&str; 3] = ["global:risk", "global:additional", "local"];

/// First `pdf:hazardlookup:<tag>` keyword, lower-cased with the prefix
/// stripped, or [`NO_PDF_LABEL`].
///
/// Only string keywords are considered and the list order is respected.
pub fn pdf_tag(keywords: &[Value]) -> String {
    keywords
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_lowercase)
        .find_map(|k| k.strip_prefix(PDF_HAZARD_PREFIX).map(str::to_string))
        .unwrap_or_else(|| NO_PDF_LABEL.to_string())
}

/// Ordering key for tags in summaries.
///
/// Variant order is the sort order: canonical tags by position, then unknown
/// tags alphabetically, then the untagged sentinel.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum TagSortKey {
    Known(usize),
    Unknown(String),
    Untagged,
}

pub fn tag_sort_key(tag: &str) -> TagSortKey {
    if tag == NO_PDF_LABEL {
        return TagSortKey::Untagged;
    }
    match CANONICAL_TAG_ORDER.iter().position(|known| *known == tag) {
        Some(idx) => TagSortKey::Known(idx),
        None => TagSortKey::Unknown(tag.to_string()),
    }
}

/// Tag occurrence counts, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagCounts {
    counts: IndexMap<String, usize>,
}

impl TagCounts {
    pub fn from_rows<'r, I, F>(rows: I, tag_of: F) -> Self
    where
        I: IntoIterator<Item = &'r ExtractedRow>,
        F: Fn(&'r ExtractedRow) -> &'r str,
    {
        let mut counts = IndexMap::new();
        for row in rows {
            *counts.entry(tag_of(row).to_string()).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn get(&self, tag: &str) -> usize {
        self.counts.get(tag).copied().unwrap_or(0)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Appends tags not yet present in `all_tags`, preserving first-seen order.
    pub fn merge_into(&self, all_tags: &mut Vec<String>) {
        for tag in self.tags() {
            if !all_tags.iter().any(|t| t == tag) {
                all_tags.push(tag.to_string());
            }
        }
    }
}
