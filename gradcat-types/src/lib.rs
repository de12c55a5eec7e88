//! Shared DTOs (schemas-as-code) for the gradcat workspace.
//!
//! # Design constraints
//! - These types are intended to be serialized to disk.
//! - Be conservative with breaking changes.
//! - Prefer adding optional fields over changing semantics.

pub mod catalog;
pub mod change;
pub mod module;
pub mod state;
pub mod validation;

/// Schema identifiers.
pub mod schema {
    pub const GRADCAT_STATE_V1: &str = "gradcat.state.v1";
    pub const GRADCAT_SUMMARY_V1: &str = "gradcat.summary.v1";
    pub const GRADCAT_REPORT_V1: &str = "gradcat.report.v1";
}
