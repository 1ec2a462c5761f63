//! Semantic version types with npm range semantics.
//!
//! Provides Version and VersionReq types. Ranges follow the grammar the npm
//! registry uses: `||` alternatives, space-separated comparator sets, hyphen
//! ranges, x-ranges, and the caret/tilde shorthands. Every shorthand is
//! desugared into primitive comparators when parsed.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Semantic version (major.minor.patch-prerelease+build)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<String>,
    pub build: Option<String>,
}

/// Version requirement (^1.0.0, ~2.3.0, >=1.0.0 <2.0.0 || 3.x)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionReq {
    /// Alternatives; a version matches if it satisfies every comparator of any set
    pub sets: Vec<Vec<Comparator>>,
}

/// Individual version comparator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparator {
    pub op: Op,
    pub version: Version,
}

/// Comparison operator for desugared comparators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Exact,     // =1.0.0
    Greater,   // >1.0.0
    GreaterEq, // >=1.0.0
    Less,      // <1.0.0
    LessEq,    // <=1.0.0
}

/// Partial version as written in a range (may have missing or wildcard components)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialVersion {
    pub major: Option<u64>,
    pub minor: Option<u64>,
    pub patch: Option<u64>,
    pub prerelease: Option<String>,
}

/// Version parsing and validation errors
#[derive(Error, Debug)]
pub enum VersionError {
    #[error("Invalid version format: {input}")]
    InvalidFormat { input: String },

    #[error("Invalid number in version: {component}")]
    InvalidNumber { component: String },

    #[error("Invalid prerelease identifier: {prerelease}")]
    InvalidPrerelease { prerelease: String },

    #[error("Invalid range: {input}")]
    InvalidRange { input: String },
}

impl Version {
    /// Create a new version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: None,
            build: None,
        }
    }

    fn with_prerelease(major: u64, minor: u64, patch: u64, prerelease: &str) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: Some(prerelease.to_string()),
            build: None,
        }
    }

    /// Check if this version satisfies a version requirement
    pub fn satisfies(&self, req: &VersionReq) -> bool {
        req.matches(self)
    }

    /// Check if this is a prerelease version
    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    fn same_release(&self, other: &Self) -> bool {
        (self.major, self.minor, self.patch) == (other.major, other.minor, other.patch)
    }

    /// Get the precedence for comparison (ignores build metadata)
    fn precedence_cmp(&self, other: &Self) -> Ordering {
        match (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch)) {
            Ordering::Equal => match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(a), Some(b)) => compare_prerelease(a, b),
            },
            other => other,
        }
    }
}

/// Dot-separated identifiers: numeric ones compare numerically and sort
/// before alphanumeric ones; a shorter list of equal prefix sorts first.
fn compare_prerelease(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ordering = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => x.cmp(y),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let stripped = input
            .strip_prefix('=')
            .unwrap_or(input)
            .trim_start_matches('v');

        // Split on '+' for build metadata
        let (version_part, build) = match stripped.split_once('+') {
            Some((v, b)) => (v, Some(b.to_string())),
            None => (stripped, None),
        };

        // Split on '-' for prerelease
        let (core_part, prerelease) = match version_part.split_once('-') {
            Some((c, p)) => (c, Some(p.to_string())),
            None => (version_part, None),
        };

        if let Some(ref pre) = prerelease {
            if pre.is_empty() || pre.split('.').any(str::is_empty) {
                return Err(VersionError::InvalidPrerelease {
                    prerelease: pre.clone(),
                });
            }
        }

        // Parse major.minor.patch
        let parts: Vec<&str> = core_part.split('.').collect();
        if parts.len() != 3 {
            return Err(VersionError::InvalidFormat {
                input: input.to_string(),
            });
        }

        Ok(Version {
            major: parse_number(parts[0])?,
            minor: parse_number(parts[1])?,
            patch: parse_number(parts[2])?,
            prerelease,
            build,
        })
    }
}

fn parse_number(component: &str) -> Result<u64, VersionError> {
    if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VersionError::InvalidNumber {
            component: component.to_string(),
        });
    }
    component.parse().map_err(|_| VersionError::InvalidNumber {
        component: component.to_string(),
    })
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;

        if let Some(ref pre) = self.prerelease {
            write!(f, "-{}", pre)?;
        }

        if let Some(ref build) = self.build {
            write!(f, "+{}", build)?;
        }

        Ok(())
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.precedence_cmp(other)
    }
}

impl VersionReq {
    /// Parse a version requirement string
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let sets = input
            .split("||")
            .map(parse_comparator_set)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(VersionReq { sets })
    }

    /// Check if a version matches this requirement.
    ///
    /// A prerelease version only matches a set when some comparator in that
    /// set names the same `major.minor.patch` with a prerelease tag.
    pub fn matches(&self, version: &Version) -> bool {
        self.sets.iter().any(|set| {
            if !set.iter().all(|comp| comp.matches(version)) {
                return false;
            }
            if !version.is_prerelease() {
                return true;
            }
            set.iter().any(|comp| {
                comp.version.is_prerelease() && comp.version.same_release(version)
            })
        })
    }
}

impl FromStr for VersionReq {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionReq::parse(s)
    }
}

impl Comparator {
    fn new(op: Op, version: Version) -> Self {
        Self { op, version }
    }

    /// Check if a version matches this comparator
    pub fn matches(&self, version: &Version) -> bool {
        match self.op {
            Op::Exact => version.cmp(&self.version) == Ordering::Equal,
            Op::Greater => version > &self.version,
            Op::GreaterEq => version >= &self.version,
            Op::Less => version < &self.version,
            Op::LessEq => version <= &self.version,
        }
    }
}

impl PartialVersion {
    fn is_any(&self) -> bool {
        self.major.is_none()
    }

    /// Convert to a full version (filling missing parts with 0)
    pub fn to_version(&self) -> Version {
        Version {
            major: self.major.unwrap_or(0),
            minor: self.minor.unwrap_or(0),
            patch: self.patch.unwrap_or(0),
            prerelease: self.prerelease.clone(),
            build: None,
        }
    }
}

fn parse_partial(input: &str) -> Result<PartialVersion, VersionError> {
    let input = input.trim().trim_start_matches(['v', '=']);
    let without_build = input.split_once('+').map_or(input, |(v, _)| v);

    let (core, prerelease) = match without_build.split_once('-') {
        Some((c, p)) if !p.is_empty() => (c, Some(p.to_string())),
        Some(_) => {
            return Err(VersionError::InvalidRange {
                input: input.to_string(),
            })
        }
        None => (without_build, None),
    };

    if core.is_empty() {
        return Ok(PartialVersion {
            major: None,
            minor: None,
            patch: None,
            prerelease: None,
        });
    }

    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() > 3 {
        return Err(VersionError::InvalidRange {
            input: input.to_string(),
        });
    }

    let mut numbers = [None, None, None];
    let mut wildcard_seen = false;
    for (slot, part) in numbers.iter_mut().zip(parts.iter()) {
        if matches!(*part, "x" | "X" | "*") {
            wildcard_seen = true;
            continue;
        }
        if wildcard_seen {
            // 1.x.3 is not a valid range component
            return Err(VersionError::InvalidRange {
                input: input.to_string(),
            });
        }
        *slot = Some(parse_number(part)?);
    }

    let [major, minor, patch] = numbers;
    Ok(PartialVersion {
        major,
        minor,
        // Prerelease tags only apply to a fully specified version
        prerelease: if patch.is_some() { prerelease } else { None },
        patch,
    })
}

fn parse_comparator_set(input: &str) -> Result<Vec<Comparator>, VersionError> {
    let trimmed = input.trim();

    if let Some((from, to)) = split_hyphen_range(trimmed) {
        let mut set = Vec::new();
        let from = parse_partial(from)?;
        let to = parse_partial(to)?;
        if !from.is_any() {
            set.push(Comparator::new(Op::GreaterEq, from.to_version()));
        }
        set.extend(upper_bound_inclusive(&to));
        return Ok(set);
    }

    let mut set = Vec::new();
    for token in join_operator_tokens(trimmed) {
        set.extend(desugar(&token)?);
    }
    Ok(set)
}

/// `1.2.3 - 2.3.4` style ranges
fn split_hyphen_range(input: &str) -> Option<(&str, &str)> {
    let (from, to) = input.split_once(" - ")?;
    let (from, to) = (from.trim(), to.trim());
    if from.is_empty() || to.is_empty() || from.contains(' ') || to.contains(' ') {
        return None;
    }
    Some((from, to))
}

/// `>= 1.2.3` is written with a space sometimes; glue the operator back on.
fn join_operator_tokens(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut pending: Option<String> = None;

    for word in input.split_whitespace() {
        let is_bare_operator = matches!(word, ">" | ">=" | "<" | "<=" | "=" | "^" | "~" | "~>");
        match pending.take() {
            Some(op) => tokens.push(format!("{}{}", op, word)),
            None if is_bare_operator => pending = Some(word.to_string()),
            None => tokens.push(word.to_string()),
        }
    }
    if let Some(op) = pending {
        tokens.push(op);
    }
    tokens
}

fn split_operator(token: &str) -> (&str, &str) {
    for op in [">=", "<=", "~>", ">", "<", "=", "~", "^"] {
        if let Some(rest) = token.strip_prefix(op) {
            return (op, rest);
        }
    }
    ("", token)
}

fn desugar(token: &str) -> Result<Vec<Comparator>, VersionError> {
    let (op, rest) = split_operator(token);
    let partial = parse_partial(rest)?;

    let comparators = match op {
        "" | "=" => x_range(&partial),
        "~" | "~>" => tilde(&partial),
        "^" => caret(&partial),
        ">=" => match partial.major {
            None => Vec::new(),
            Some(_) => vec![Comparator::new(Op::GreaterEq, partial.to_version())],
        },
        ">" => match (partial.major, partial.minor, partial.patch) {
            (None, _, _) => vec![nothing()],
            (Some(major), None, _) => vec![Comparator::new(Op::GreaterEq, Version::new(major + 1, 0, 0))],
            (Some(major), Some(minor), None) => {
                vec![Comparator::new(Op::GreaterEq, Version::new(major, minor + 1, 0))]
            }
            _ => vec![Comparator::new(Op::Greater, partial.to_version())],
        },
        "<" => match (partial.major, partial.minor, partial.patch) {
            (None, _, _) => vec![nothing()],
            (Some(major), None, _) => vec![Comparator::new(Op::Less, Version::with_prerelease(major, 0, 0, "0"))],
            (Some(major), Some(minor), None) => {
                vec![Comparator::new(Op::Less, Version::with_prerelease(major, minor, 0, "0"))]
            }
            _ => vec![Comparator::new(Op::Less, partial.to_version())],
        },
        "<=" => upper_bound_inclusive(&partial),
        _ => {
            return Err(VersionError::InvalidRange {
                input: token.to_string(),
            })
        }
    };

    Ok(comparators)
}

/// A comparator no version satisfies
fn nothing() -> Comparator {
    Comparator::new(Op::Less, Version::with_prerelease(0, 0, 0, "0"))
}

fn upper_bound_inclusive(partial: &PartialVersion) -> Vec<Comparator> {
    match (partial.major, partial.minor, partial.patch) {
        (None, _, _) => Vec::new(),
        (Some(major), None, _) => vec![Comparator::new(Op::Less, Version::with_prerelease(major + 1, 0, 0, "0"))],
        (Some(major), Some(minor), None) => {
            vec![Comparator::new(Op::Less, Version::with_prerelease(major, minor + 1, 0, "0"))]
        }
        _ => vec![Comparator::new(Op::LessEq, partial.to_version())],
    }
}

fn x_range(partial: &PartialVersion) -> Vec<Comparator> {
    match (partial.major, partial.minor, partial.patch) {
        (None, _, _) => Vec::new(),
        (Some(major), None, _) => vec![
            Comparator::new(Op::GreaterEq, Version::new(major, 0, 0)),
            Comparator::new(Op::Less, Version::with_prerelease(major + 1, 0, 0, "0")),
        ],
        (Some(major), Some(minor), None) => vec![
            Comparator::new(Op::GreaterEq, Version::new(major, minor, 0)),
            Comparator::new(Op::Less, Version::with_prerelease(major, minor + 1, 0, "0")),
        ],
        _ => vec![Comparator::new(Op::Exact, partial.to_version())],
    }
}

/// ~1.2.3 allows >=1.2.3 <1.3.0, ~1 allows >=1.0.0 <2.0.0
fn tilde(partial: &PartialVersion) -> Vec<Comparator> {
    match (partial.major, partial.minor) {
        (None, _) => Vec::new(),
        (Some(major), None) => vec![
            Comparator::new(Op::GreaterEq, Version::new(major, 0, 0)),
            Comparator::new(Op::Less, Version::with_prerelease(major + 1, 0, 0, "0")),
        ],
        (Some(major), Some(minor)) => vec![
            Comparator::new(Op::GreaterEq, partial.to_version()),
            Comparator::new(Op::Less, Version::with_prerelease(major, minor + 1, 0, "0")),
        ],
    }
}

/// ^1.2.3 allows >=1.2.3 <2.0.0; ^0.2.3 allows >=0.2.3 <0.3.0; ^0.0.3 allows only 0.0.3
fn caret(partial: &PartialVersion) -> Vec<Comparator> {
    let lower = Comparator::new(Op::GreaterEq, partial.to_version());
    match (partial.major, partial.minor, partial.patch) {
        (None, _, _) => Vec::new(),
        (Some(major), None, _) => vec![
            lower,
            Comparator::new(Op::Less, Version::with_prerelease(major + 1, 0, 0, "0")),
        ],
        (Some(0), Some(minor), None) => vec![
            lower,
            Comparator::new(Op::Less, Version::with_prerelease(0, minor + 1, 0, "0")),
        ],
        (Some(major), Some(_), None) => vec![
            lower,
            Comparator::new(Op::Less, Version::with_prerelease(major + 1, 0, 0, "0")),
        ],
        (Some(0), Some(0), Some(patch)) => vec![
            lower,
            Comparator::new(Op::Less, Version::with_prerelease(0, 0, patch + 1, "0")),
        ],
        (Some(0), Some(minor), Some(_)) => vec![
            lower,
            Comparator::new(Op::Less, Version::with_prerelease(0, minor + 1, 0, "0")),
        ],
        (Some(major), Some(_), Some(_)) => vec![
            lower,
            Comparator::new(Op::Less, Version::with_prerelease(major + 1, 0, 0, "0")),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::from_str(s).unwrap()
    }

    fn req(s: &str) -> VersionReq {
        VersionReq::parse(s).unwrap()
    }

    #[test]
    fn test_version_parsing() {
        let v = Version::from_str("1.2.3").unwrap();
        assert_eq!(v.major, 1);
        assert_eq!(v.minor, 2);
        assert_eq!(v.patch, 3);
        assert_eq!(v.prerelease, None);
        assert_eq!(v.build, None);
    }

    #[test]
    fn test_version_with_prerelease_and_build() {
        let v = Version::from_str("1.2.3-alpha.1+build.5").unwrap();
        assert_eq!(v.prerelease, Some("alpha.1".to_string()));
        assert_eq!(v.build, Some("build.5".to_string()));
        assert_eq!(v.to_string(), "1.2.3-alpha.1+build.5");
    }

    #[test]
    fn test_invalid_versions() {
        assert!(Version::from_str("1.2").is_err());
        assert!(Version::from_str("latest").is_err());
        assert!(Version::from_str("1.2.x").is_err());
        assert!(Version::from_str("1.2.3-").is_err());
    }

    #[test]
    fn test_prerelease_ordering() {
        assert!(v("1.0.0-alpha") < v("1.0.0-alpha.1"));
        assert!(v("1.0.0-alpha.1") < v("1.0.0-alpha.beta"));
        assert!(v("1.0.0-beta.2") < v("1.0.0-beta.11"));
        assert!(v("1.0.0-rc.1") < v("1.0.0"));
        assert!(v("2.0.0-0") < v("2.0.0-beta"));
    }

    #[test]
    fn test_version_req_exact() {
        let req = req("1.2.3");
        assert!(req.matches(&v("1.2.3")));
        assert!(!req.matches(&v("1.2.4")));
    }

    #[test]
    fn test_version_req_wildcards() {
        for range in ["*", "", "x", "X"] {
            let req = req(range);
            assert!(req.matches(&v("1.2.3")));
            assert!(req.matches(&v("999.0.0")));
        }
        let req = req("1.x");
        assert!(req.matches(&v("1.9.9")));
        assert!(!req.matches(&v("2.0.0")));

        let req = VersionReq::parse("1.2").unwrap();
        assert!(req.matches(&v("1.2.7")));
        assert!(!req.matches(&v("1.3.0")));
    }

    #[test]
    fn test_version_req_caret() {
        let r = req("^1.2.3");
        assert!(r.matches(&v("1.2.3")));
        assert!(r.matches(&v("1.9.0")));
        assert!(!r.matches(&v("2.0.0")));
        assert!(!r.matches(&v("1.2.2")));

        let r = req("^0.2.3");
        assert!(r.matches(&v("0.2.9")));
        assert!(!r.matches(&v("0.3.0")));

        let r = req("^0.0.3");
        assert!(r.matches(&v("0.0.3")));
        assert!(!r.matches(&v("0.0.4")));
    }

    #[test]
    fn test_version_req_tilde() {
        let r = req("~1.2.3");
        assert!(r.matches(&v("1.2.9")));
        assert!(!r.matches(&v("1.3.0")));

        let r = req("~1");
        assert!(r.matches(&v("1.9.0")));
        assert!(!r.matches(&v("2.0.0")));
    }

    #[test]
    fn test_version_req_operators() {
        let r = req(">1.2.3");
        assert!(!r.matches(&v("1.2.3")));
        assert!(r.matches(&v("1.2.4")));

        let r = req(">= 1.2.3 <2");
        assert!(r.matches(&v("1.2.3")));
        assert!(r.matches(&v("1.99.0")));
        assert!(!r.matches(&v("2.0.0")));

        let r = req("<=1.2");
        assert!(r.matches(&v("1.2.99")));
        assert!(!r.matches(&v("1.3.0")));
    }

    #[test]
    fn test_version_req_alternatives_and_hyphen() {
        let r = req("1.x || >=3.1.0");
        assert!(r.matches(&v("1.4.0")));
        assert!(!r.matches(&v("2.0.0")));
        assert!(r.matches(&v("3.1.0")));

        let r = req("1.2.3 - 2.3");
        assert!(r.matches(&v("1.2.3")));
        assert!(r.matches(&v("2.3.9")));
        assert!(!r.matches(&v("2.4.0")));
    }

    #[test]
    fn test_prerelease_excluded_unless_named() {
        let r = req("^1.0.0");
        assert!(!r.matches(&v("1.5.0-beta.1")));

        let r = req("^1.5.0-beta.0");
        assert!(r.matches(&v("1.5.0-beta.1")));
        assert!(r.matches(&v("1.6.0")));
        assert!(!r.matches(&v("1.6.0-beta.1")));
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(VersionReq::parse("latest").is_err());
        assert!(VersionReq::parse("1.x.3").is_err());
        assert!(VersionReq::parse("^abc").is_err());
    }
}
