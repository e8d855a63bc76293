//! Version selection over npm range expressions
//!
//! npm ranges are translated into one `semver::VersionReq` per `||`
//! alternative. Translation covers what `semver` does not parse itself:
//! bare versions mean exact matches, comparators are space separated,
//! hyphen ranges, and `x`/`*` wildcards in any position.

use semver::{Version, VersionReq};
use thiserror::Error;

/// A range expression that failed to parse
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid version range '{range}': {reason}")]
pub struct RangeError {
    pub range: String,
    pub reason: String,
}

/// Parsed npm range: satisfied when any alternative matches
#[derive(Debug, Clone)]
pub struct VersionRange {
    raw: String,
    alternatives: Vec<VersionReq>,
}

impl VersionRange {
    pub fn parse(raw: &str) -> Result<Self, RangeError> {
        let alternatives = raw
            .split("||")
            .map(|alternative| {
                let translated = translate_alternative(alternative);
                VersionReq::parse(&translated).map_err(|e| RangeError {
                    range: raw.to_string(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            raw: raw.to_string(),
            alternatives,
        })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Highest entry of `available` that satisfies `range`
///
/// Entries that are not valid semantic versions are skipped. The returned
/// string is the entry as given, so it can index the registry's version map.
pub fn select<'a, I>(available: I, range: &VersionRange) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    available
        .into_iter()
        .filter_map(|raw| {
            Version::parse(raw.trim())
                .ok()
                .filter(|version| range.matches(version))
                .map(|version| (raw, version))
        })
        .max_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(raw, _)| raw.to_string())
}

/// Like [`select`], with an unparsable range treated as no match
pub fn select_str<'a, I>(available: I, range: &str) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    VersionRange::parse(range)
        .ok()
        .and_then(|range| select(available, &range))
}

const OPERATORS: [&str; 8] = ["~>", ">=", "<=", "^", "~", ">", "<", "="];

/// Turn one `||` alternative into `semver` comparator syntax
fn translate_alternative(alternative: &str) -> String {
    let alternative = alternative.trim();

    if let Some((lower, upper)) = alternative.split_once(" - ") {
        return format!(
            ">={}, <={}",
            normalize_version(lower.trim()),
            normalize_version(upper.trim())
        );
    }

    let comparators: Vec<String> = merge_detached_operators(alternative)
        .iter()
        .filter_map(|token| translate_comparator(token))
        .collect();

    if comparators.is_empty() {
        "*".to_string()
    } else {
        comparators.join(", ")
    }
}

/// `>= 1.2.3` arrives as two tokens; glue operator-only tokens to the next
fn merge_detached_operators(alternative: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut pending_operator: Option<String> = None;

    for token in alternative.split_whitespace() {
        if OPERATORS.contains(&token) {
            pending_operator = Some(token.to_string());
            continue;
        }
        match pending_operator.take() {
            Some(operator) => tokens.push(format!("{}{}", operator, token)),
            None => tokens.push(token.to_string()),
        }
    }
    tokens
}

/// Translate one comparator; `None` for a pure wildcard
fn translate_comparator(token: &str) -> Option<String> {
    let (operator, version) = OPERATORS
        .iter()
        .find_map(|op| token.strip_prefix(op).map(|rest| (*op, rest)))
        .unwrap_or(("", token));

    let version = normalize_version(version);
    if version == "*" {
        return None;
    }

    let operator = match operator {
        // A bare version is an exact match in npm, a caret in Cargo
        "" => "=",
        "~>" => "~",
        other => other,
    };
    Some(format!("{}{}", operator, version))
}

/// Strip a `v` prefix and truncate at the first wildcard component
fn normalize_version(version: &str) -> String {
    let version = version.trim();
    let version = version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .unwrap_or(version);

    // Pre-release and build tags never contain wildcards
    if version.contains('-') || version.contains('+') {
        return version.to_string();
    }

    let concrete: Vec<&str> = version
        .split('.')
        .take_while(|part| !matches!(*part, "x" | "X" | "*" | ""))
        .collect();

    if concrete.is_empty() {
        "*".to_string()
    } else {
        concrete.join(".")
    }
}

#[cfg(test)]
mod tests {
    include!("select.test.rs");
}
