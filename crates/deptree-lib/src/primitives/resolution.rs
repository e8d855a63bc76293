use clap::ValueEnum;
use serde::Deserialize;
use std::str::FromStr;

use crate::impl_fromstr_for_value_enum;

/// What to do when a transitive dependency cannot be resolved
///
/// Cycles and root-level failures are errors under every policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Fail the whole resolution on the first unresolved dependency
    #[value(alias = "fail")]
    Abort,
    /// Record the failure as an error-bearing child node and keep going
    #[value(alias = "partial")]
    Annotate,
}

impl_fromstr_for_value_enum!(FailurePolicy, "failure policy");

impl Default for FailurePolicy {
    fn default() -> Self {
        Self::Abort
    }
}

/// Output format for a resolved tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeFormat {
    /// Indented JSON
    #[value(alias = "pretty-json")]
    Pretty,
    /// Single-line JSON
    #[value(alias = "json")]
    Compact,
}

impl_fromstr_for_value_enum!(TreeFormat, "tree format");

impl Default for TreeFormat {
    fn default() -> Self {
        Self::Pretty
    }
}
