//! Version-range helpers shared by the resolver and the orchestrator.

use semver::{Version, VersionReq};

/// Sentinel range meaning "always the newest published version".
pub const LATEST: &str = "latest";

/// `true` for ranges that accept any version.
pub fn is_latest(range: &str) -> bool {
    let range = range.trim();
    range.eq_ignore_ascii_case(LATEST) || range == "*" || range.is_empty()
}

/// `^X.Y.Z` anchored at `version`, or `None` if it is not a semantic version.
pub fn caret_range(version: &str) -> Option<String> {
    Version::parse(version.trim())
        .ok()
        .map(|v| format!("^{v}"))
}

/// Whether `version` falls within the npm-style `range`.
///
/// Supports `||` alternatives, hyphen ranges (`1.0.0 - 2.0.0`), and
/// whitespace-separated comparator sets. A bare version means exactly that
/// version. Unparseable versions or ranges never satisfy anything except
/// the latest sentinel.
pub fn satisfies(version: &str, range: &str) -> bool {
    if is_latest(range) {
        return true;
    }
    let Ok(version) = Version::parse(version.trim()) else {
        return false;
    };
    match parse_range(range) {
        Some(alternatives) => alternatives.iter().any(|req| req.matches(&version)),
        None => false,
    }
}

fn parse_range(range: &str) -> Option<Vec<VersionReq>> {
    range.split("||").map(parse_comparator_set).collect()
}

fn parse_comparator_set(set: &str) -> Option<VersionReq> {
    let tokens = attach_operators(set);
    let comparators: Vec<String> = match tokens.as_slice() {
        [] => return Some(VersionReq::STAR),
        [low, dash, high] if dash == "-" => vec![format!(">={low}"), format!("<={high}")],
        _ => tokens.iter().map(|t| pin_bare_version(t)).collect(),
    };
    VersionReq::parse(&comparators.join(", ")).ok()
}

/// Splits on whitespace, gluing a detached operator (`>= 1.0.0`) to its version.
fn attach_operators(set: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut operator: Option<&str> = None;
    for token in set.split_whitespace() {
        if is_operator(token) {
            operator = Some(token);
            continue;
        }
        match operator.take() {
            Some(op) => tokens.push(format!("{op}{token}")),
            None => tokens.push(token.to_string()),
        }
    }
    if let Some(op) = operator {
        tokens.push(op.to_string());
    }
    tokens
}

fn is_operator(token: &str) -> bool {
    matches!(token, ">" | ">=" | "<" | "<=" | "=" | "~" | "^")
}

/// `1.2.3` pins that version; wildcards and operator-led comparators pass through.
fn pin_bare_version(token: &str) -> String {
    let token = token.strip_prefix('v').unwrap_or(token);
    let starts_with_digit = token.starts_with(|c: char| c.is_ascii_digit());
    let wildcard = token.contains(['x', 'X', '*']);
    if starts_with_digit && !wildcard {
        format!("={token}")
    } else {
        token.to_string()
    }
}
