//! Static tag vocabulary: categories, their display metadata and validation rules.

use serde::{Deserialize, Serialize};

/// Shortest accepted tag, in characters
pub const MIN_TAG_LENGTH: usize = 2;

/// Longest accepted tag, in characters
pub const MAX_TAG_LENGTH: usize = 50;

/// Display color for tags outside every category
pub const UNCATEGORIZED_COLOR: &str = "#95a5a6";

/// Display icon for tags outside every category
pub const UNCATEGORIZED_ICON: &str = "label";

/// Name used for the uncategorized bucket in groupings and statistics
pub const UNCATEGORIZED: &str = "uncategorized";

/// Fixed set of tag categories.
///
/// Declaration order is lookup order: a tag listed under several categories
/// (`booking`, `admin`) belongs to the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagCategory {
    Priority,
    Type,
    Area,
    Status,
    Environment,
    Feature,
}

impl TagCategory {
    /// All categories in lookup order
    pub const ALL: [TagCategory; 6] = [
        TagCategory::Priority,
        TagCategory::Type,
        TagCategory::Area,
        TagCategory::Status,
        TagCategory::Environment,
        TagCategory::Feature,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TagCategory::Priority => "priority",
            TagCategory::Type => "type",
            TagCategory::Area => "area",
            TagCategory::Status => "status",
            TagCategory::Environment => "environment",
            TagCategory::Feature => "feature",
        }
    }

    /// Parse a category name (case-insensitive)
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// Member tags, lowercase and without the `@` marker
    pub fn members(self) -> &'static [&'static str] {
        match self {
            TagCategory::Priority => &[
                "smoke",
                "critical",
                "regression",
                "low-priority",
                "high-priority",
                "medium-priority",
            ],
            TagCategory::Type => &["e2e", "api", "visual", "unit", "integration", "component"],
            TagCategory::Area => &[
                "ui", "backend", "database", "auth", "booking", "admin", "contact", "room",
                "report", "login", "logout",
            ],
            TagCategory::Status => &["todo", "wip", "skip", "blocked", "bug", "fix"],
            TagCategory::Environment => &["local", "staging", "production", "dev"],
            TagCategory::Feature => &[
                "booking",
                "authentication",
                "admin",
                "reports",
                "contact-form",
            ],
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            TagCategory::Priority => "#3498db",
            TagCategory::Type => "#9b59b6",
            TagCategory::Area => "#e67e22",
            TagCategory::Status => "#7f8c8d",
            TagCategory::Environment => "#16a085",
            TagCategory::Feature => "#e74c3c",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            TagCategory::Priority => "priority",
            TagCategory::Type => "category",
            TagCategory::Area => "place",
            TagCategory::Status => "flag",
            TagCategory::Environment => "public",
            TagCategory::Feature => "star",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            TagCategory::Priority => "Test priority level",
            TagCategory::Type => "Test type classification",
            TagCategory::Area => "Functional area or module",
            TagCategory::Status => "Test development status",
            TagCategory::Environment => "Target environment",
            TagCategory::Feature => "Feature or capability being tested",
        }
    }

    /// Display ranking; uncategorized tags rank after every category
    pub fn display_rank(self) -> u8 {
        match self {
            TagCategory::Priority => 1,
            TagCategory::Type => 2,
            TagCategory::Area => 3,
            TagCategory::Feature => 4,
            TagCategory::Environment => 5,
            TagCategory::Status => 6,
        }
    }
}

impl std::fmt::Display for TagCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rank of the uncategorized bucket in display ordering
pub const UNCATEGORIZED_RANK: u8 = 7;

/// Display metadata resolved for one tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagMeta {
    pub category: Option<TagCategory>,
    pub color: &'static str,
    pub icon: &'static str,
}

/// Outcome of validating a tag. Invalid tags are data, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagValidation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TagValidation {
    fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    fn fail(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
        }
    }
}

/// Category of a tag, matched case-insensitively against the member lists
pub fn tag_category(tag: &str) -> Option<TagCategory> {
    let needle = super::normalize(tag).to_lowercase();
    TagCategory::ALL
        .into_iter()
        .find(|category| category.members().contains(&needle.as_str()))
}

/// Resolve category, color and icon for a tag
pub fn classify(tag: &str) -> TagMeta {
    match tag_category(tag) {
        Some(category) => TagMeta {
            category: Some(category),
            color: category.color(),
            icon: category.icon(),
        },
        None => TagMeta {
            category: None,
            color: UNCATEGORIZED_COLOR,
            icon: UNCATEGORIZED_ICON,
        },
    }
}

/// Check a tag against the validation rules, reporting the first violation
pub fn validate(tag: &str) -> TagValidation {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        return TagValidation::fail("Tag cannot be empty");
    }

    let length = trimmed.chars().count();
    if length < MIN_TAG_LENGTH {
        return TagValidation::fail(format!(
            "Tag must be at least {} characters",
            MIN_TAG_LENGTH
        ));
    }
    if length > MAX_TAG_LENGTH {
        return TagValidation::fail(format!(
            "Tag must be no more than {} characters",
            MAX_TAG_LENGTH
        ));
    }

    let allowed = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-';
    if !trimmed.chars().all(allowed) {
        return TagValidation::fail(
            "Tag can only contain letters, numbers, hyphens, and underscores",
        );
    }

    TagValidation::ok()
}

/// Every known tag, deduplicated and sorted
pub fn all_known_tags() -> Vec<&'static str> {
    let mut tags: Vec<&'static str> = TagCategory::ALL
        .into_iter()
        .flat_map(|c| c.members().iter().copied())
        .collect();
    tags.sort_unstable();
    tags.dedup();
    tags
}

/// Whether a tag is listed under the given category
pub fn is_tag_in_category(tag: &str, category: TagCategory) -> bool {
    let needle = super::normalize(tag).to_lowercase();
    category.members().contains(&needle.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_tags() {
        assert_eq!(classify("smoke").category, Some(TagCategory::Priority));
        assert_eq!(classify("@API").category, Some(TagCategory::Type));
        assert_eq!(classify("staging").color, "#16a085");
        assert_eq!(classify("wip").icon, "flag");
    }

    #[test]
    fn test_first_category_wins_for_shared_tags() {
        assert_eq!(tag_category("booking"), Some(TagCategory::Area));
        assert_eq!(tag_category("admin"), Some(TagCategory::Area));
        assert!(is_tag_in_category("booking", TagCategory::Feature));
    }

    #[test]
    fn test_classify_unknown_tag() {
        let meta = classify("nightly");
        assert_eq!(meta.category, None);
        assert_eq!(meta.color, UNCATEGORIZED_COLOR);
        assert_eq!(meta.icon, UNCATEGORIZED_ICON);
    }

    #[test]
    fn test_validate_rules_in_order() {
        assert_eq!(validate("   ").error.as_deref(), Some("Tag cannot be empty"));
        assert_eq!(
            validate("a").error.as_deref(),
            Some("Tag must be at least 2 characters")
        );
        let long = "x".repeat(51);
        assert_eq!(
            validate(&long).error.as_deref(),
            Some("Tag must be no more than 50 characters")
        );
        assert_eq!(
            validate("has space").error.as_deref(),
            Some("Tag can only contain letters, numbers, hyphens, and underscores")
        );
        assert!(validate("low-priority").valid);
        assert!(validate("snake_case_42").valid);
        assert!(validate(&"x".repeat(50)).valid);
    }

    #[test]
    fn test_validate_rejects_marker_characters() {
        assert!(!validate("@@smoke").valid);
        assert!(!validate("smo@ke").valid);
    }

    #[test]
    fn test_all_known_tags_deduplicated() {
        let tags = all_known_tags();
        assert_eq!(tags.iter().filter(|t| **t == "booking").count(), 1);
        assert!(tags.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_category_parse_roundtrip() {
        for category in TagCategory::ALL {
            assert_eq!(TagCategory::parse(category.as_str()), Some(category));
        }
        assert_eq!(TagCategory::parse("Feature"), Some(TagCategory::Feature));
        assert_eq!(TagCategory::parse("bogus"), None);
    }
}
