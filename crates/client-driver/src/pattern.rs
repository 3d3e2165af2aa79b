//! Literal-or-regex values used by every matching clause.
//!
//! A [`Pattern`] is either an exact string or a regular expression. Regexes
//! are anchored when compiled so that `accepts` is always a full-string match,
//! never a substring search.

use crate::error::DriverError;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Expected value for a path, parameter, header or body clause.
#[derive(Clone)]
pub enum Pattern {
    /// Exact, case-sensitive string equality
    Literal(String),
    /// Full-string regular expression match
    Regex(CompiledRegex),
}

/// A regex compiled with `\A(?:...)\z` anchors, keeping the source for display.
#[derive(Clone)]
pub struct CompiledRegex {
    source: String,
    anchored: Arc<Regex>,
}

impl CompiledRegex {
    fn compile(source: &str) -> Result<Self, DriverError> {
        let anchored =
            Regex::new(&format!(r"\A(?:{source})\z")).map_err(|e| DriverError::InvalidPattern {
                pattern: source.to_string(),
                source: e,
            })?;
        Ok(Self {
            source: source.to_string(),
            anchored: Arc::new(anchored),
        })
    }

    /// The pattern as the caller wrote it, without the anchors.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl Pattern {
    pub fn literal(value: impl Into<String>) -> Self {
        Pattern::Literal(value.into())
    }

    /// Compile a regular expression pattern.
    ///
    /// Fails with [`DriverError::InvalidPattern`] when the expression does not compile,
    /// so a bad pattern is reported while the expectation is built, not at match time.
    pub fn regex(pattern: &str) -> Result<Self, DriverError> {
        CompiledRegex::compile(pattern).map(Pattern::Regex)
    }

    pub fn accepts(&self, candidate: &str) -> bool {
        match self {
            Pattern::Literal(expected) => expected == candidate,
            Pattern::Regex(regex) => regex.anchored.is_match(candidate),
        }
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Pattern::Literal(value) => Some(value),
            Pattern::Regex(_) => None,
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, Pattern::Regex(_))
    }
}

impl From<&str> for Pattern {
    fn from(value: &str) -> Self {
        Pattern::Literal(value.to_string())
    }
}

impl From<String> for Pattern {
    fn from(value: String) -> Self {
        Pattern::Literal(value)
    }
}

impl From<&String> for Pattern {
    fn from(value: &String) -> Self {
        Pattern::Literal(value.clone())
    }
}

impl TryFrom<Regex> for Pattern {
    type Error = DriverError;

    fn try_from(regex: Regex) -> Result<Self, Self::Error> {
        Pattern::regex(regex.as_str())
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Pattern::Literal(a), Pattern::Literal(b)) => a == b,
            (Pattern::Regex(a), Pattern::Regex(b)) => a.source == b.source,
            _ => false,
        }
    }
}

impl Eq for Pattern {}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Literal(value) => write!(f, "{value:?}"),
            Pattern::Regex(regex) => write!(f, "/{}/", regex.source),
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Pattern::Regex(regex) => f.debug_tuple("Regex").field(&regex.source).finish(),
        }
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_is_exact_and_case_sensitive() {
        let p = Pattern::literal("no-cache");
        assert!(p.accepts("no-cache"));
        assert!(!p.accepts("No-Cache"));
        assert!(!p.accepts("no-cache "));
        assert!(!p.accepts("no"));
    }

    #[test]
    fn test_regex_requires_full_match() {
        let p = Pattern::regex(r"\d+").unwrap();
        assert!(p.accepts("1234"));
        assert!(!p.accepts("1234abc"));
        assert!(!p.accepts("abc1234"));
        assert!(!p.accepts(""));
    }

    #[test]
    fn test_regex_alternation_is_anchored_as_a_whole() {
        // Without the group, `^a|ab$` would accept "abc".
        let p = Pattern::regex("a|ab").unwrap();
        assert!(p.accepts("a"));
        assert!(p.accepts("ab"));
        assert!(!p.accepts("abc"));
    }

    #[test]
    fn test_invalid_regex_fails_at_construction() {
        let err = Pattern::regex("[unclosed").unwrap_err();
        assert!(matches!(err, DriverError::InvalidPattern { ref pattern, .. } if pattern == "[unclosed"));
    }

    #[test]
    fn test_try_from_regex_anchors() {
        let p = Pattern::try_from(Regex::new("[a]{5}").unwrap()).unwrap();
        assert!(p.accepts("aaaaa"));
        assert!(!p.accepts("aaaaaa"));
    }

    #[test]
    fn test_display_distinguishes_kinds() {
        assert_eq!(Pattern::literal("v").to_string(), "\"v\"");
        assert_eq!(Pattern::regex("v[0-9]").unwrap().to_string(), "/v[0-9]/");
        assert_eq!(
            serde_json::to_string(&Pattern::regex("x+").unwrap()).unwrap(),
            "\"/x+/\""
        );
    }

    #[test]
    fn test_equality_by_kind_and_source() {
        assert_eq!(Pattern::literal("a"), Pattern::from("a"));
        assert_ne!(Pattern::literal("a"), Pattern::regex("a").unwrap());
        assert_eq!(Pattern::regex("a+").unwrap(), Pattern::regex("a+").unwrap());
    }
}
