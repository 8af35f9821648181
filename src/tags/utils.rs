use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::config::{self, TagCategory, UNCATEGORIZED, UNCATEGORIZED_RANK};

/// Marker some suites put in front of tag names
const TAG_MARKER: char = '@';

/// A raw tag after normalization, validation and classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedTag {
    /// Tag exactly as the test declared it
    pub original: String,
    pub normalized: String,
    pub category: Option<TagCategory>,
    pub color: String,
    pub icon: String,
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NormalizedTag {
    /// Category name, `uncategorized` when none matched
    pub fn category_name(&self) -> &'static str {
        self.category.map(TagCategory::as_str).unwrap_or(UNCATEGORIZED)
    }

    fn display_rank(&self) -> u8 {
        self.category
            .map(TagCategory::display_rank)
            .unwrap_or(UNCATEGORIZED_RANK)
    }
}

/// Per-run tag statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagStats {
    pub total: usize,
    pub by_category: BTreeMap<String, usize>,
    pub invalid: usize,
}

/// Strip one leading `@` marker and surrounding whitespace.
///
/// A tag with a second marker behind the first (`@@smoke`, `@ @smoke`) is
/// only trimmed and left for the validator to reject, so normalizing twice
/// gives the same result as normalizing once.
pub fn normalize(tag: &str) -> String {
    let trimmed = tag.trim();
    match trimmed.strip_prefix(TAG_MARKER).map(str::trim) {
        Some(rest) if !rest.starts_with(TAG_MARKER) => rest.to_string(),
        _ => trimmed.to_string(),
    }
}

/// Normalize, validate and classify each tag, preserving input order
pub fn process_tags<S: AsRef<str>>(tags: &[S]) -> Vec<NormalizedTag> {
    tags.iter()
        .map(|tag| {
            let original = tag.as_ref();
            let normalized = normalize(original);
            let validation = config::validate(&normalized);
            let meta = config::classify(&normalized);

            NormalizedTag {
                original: original.to_string(),
                normalized,
                category: meta.category,
                color: meta.color.to_string(),
                icon: meta.icon.to_string(),
                valid: validation.valid,
                error: validation.error,
            }
        })
        .collect()
}

/// Display ordering: category rank first, then alphabetical within a category.
/// Never use this for stored tag order.
pub fn sort_by_category_priority(tags: &[NormalizedTag]) -> Vec<NormalizedTag> {
    let mut sorted = tags.to_vec();
    sorted.sort_by(|a, b| {
        a.display_rank()
            .cmp(&b.display_rank())
            .then_with(|| a.normalized.to_lowercase().cmp(&b.normalized.to_lowercase()))
            .then_with(|| a.normalized.cmp(&b.normalized))
    });
    sorted
}

/// Bucket tags by category name. The `uncategorized` bucket is always present.
pub fn group_by_category(tags: &[NormalizedTag]) -> BTreeMap<&'static str, Vec<NormalizedTag>> {
    let mut grouped: BTreeMap<&'static str, Vec<NormalizedTag>> = BTreeMap::new();
    grouped.insert(UNCATEGORIZED, Vec::new());
    for tag in tags {
        grouped
            .entry(tag.category_name())
            .or_default()
            .push(tag.clone());
    }
    grouped
}

pub fn filter_by_category(tags: &[NormalizedTag], category: TagCategory) -> Vec<NormalizedTag> {
    tags.iter()
        .filter(|t| t.category == Some(category))
        .cloned()
        .collect()
}

/// Distinct normalized tags, sorted
pub fn unique_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut unique: Vec<String> = tags.iter().map(|t| normalize(t.as_ref())).collect();
    unique.sort();
    unique.dedup();
    unique
}

/// Count tags per category; invalid tags are counted separately
pub fn tag_stats(tags: &[NormalizedTag]) -> TagStats {
    let mut stats = TagStats {
        total: tags.len(),
        ..Default::default()
    };
    for tag in tags {
        if !tag.valid {
            stats.invalid += 1;
        } else {
            *stats
                .by_category
                .entry(tag.category_name().to_string())
                .or_insert(0) += 1;
        }
    }
    stats
}

/// One human-readable warning per invalid tag
pub fn tag_warnings(tags: &[NormalizedTag]) -> Vec<String> {
    tags.iter()
        .filter(|t| !t.valid)
        .filter_map(|t| {
            t.error
                .as_ref()
                .map(|error| format!("Invalid tag \"{}\": {}", t.original, error))
        })
        .collect()
}

/// Inline CSS for a tag badge in the given color
pub fn badge_css(color: &str) -> String {
    format!(
        "background-color: {color}15; color: {color}; border: 1px solid {color}40;",
        color = color
    )
}
