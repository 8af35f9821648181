//! Tag normalization, validation and classification.
//!
//! Categorization is a static lookup table rather than inference, so the
//! meaning of a tag stays auditable independent of any one suite.

pub mod config;
pub mod utils;

pub use config::{
    TagCategory, TagMeta, TagValidation, all_known_tags, classify, is_tag_in_category,
    tag_category, validate,
};
pub use utils::{
    NormalizedTag, TagStats, badge_css, filter_by_category, group_by_category, normalize,
    process_tags, sort_by_category_priority, tag_stats, tag_warnings, unique_tags,
};
