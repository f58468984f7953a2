//! Merge rules: defaults and layer order.

pub mod merge_policy;
