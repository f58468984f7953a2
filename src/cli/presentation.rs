//! CLI presentation: text and json formatters per command family.

mod compare;
mod generate;
mod shared;

pub use compare::{format_compare_json, format_compare_text};
pub use generate::{format_generate_result, format_recreate_result};
pub use shared::{format_config, format_skipped_warnings, Palette};
