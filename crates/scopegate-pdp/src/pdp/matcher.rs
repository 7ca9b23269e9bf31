//! Compiled scope matchers.
//!
//! A [`ScopeMatcher`] is a stateless predicate deciding whether a literal
//! requested scope satisfies a policy-declared pattern. Three variants exist,
//! one per [`MatchingStrategy`]:
//!
//! - **Exact**: literal string equality.
//! - **Regexp**: full-string regular expression match. The pattern is
//!   anchored at compile time, so `admin\..*` matches `admin.write` but not
//!   `not-admin.write`.
//! - **Path**: hierarchical `<prefix>:/<path>` match. The pattern
//!   `storage.read:/a` matches `storage.read:/a` and `storage.read:/a/b/c`,
//!   but not `storage.read:/ab`.
//!
//! Matchers are compiled once and reused; compilation failure is a
//! configuration error carrying the offending pattern.
//!
//! # Example
//!
//! ```
//! use scopegate_pdp::model::MatchingStrategy;
//! use scopegate_pdp::pdp::matcher::ScopeMatcher;
//!
//! let matcher = ScopeMatcher::compile("storage.read:/a", MatchingStrategy::Path).unwrap();
//! assert!(matcher.matches("storage.read:/a/b"));
//! assert!(!matcher.matches("storage.read:/ab"));
//! ```

use regex::Regex;

use crate::model::MatchingStrategy;

// =============================================================================
// Matcher Error
// =============================================================================

/// Errors that can occur while compiling a scope pattern.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MatcherError {
    /// The pattern is not a valid regular expression.
    #[error("invalid regular expression '{pattern}': {message}")]
    InvalidRegexp {
        /// The pattern that failed to compile.
        pattern: String,
        /// The regex engine's diagnostic.
        message: String,
    },

    /// The pattern is not of the form `<prefix>:/<path>`.
    #[error("invalid structured path '{pattern}': expected '<prefix>:/<path>'")]
    InvalidPath {
        /// The pattern that failed to parse.
        pattern: String,
    },
}

// =============================================================================
// Structured Path
// =============================================================================

/// A parsed hierarchical scope pattern of the form `<prefix>:/<path>`.
///
/// The prefix is a literal scope name; the path is a `/`-delimited sequence
/// of segments forming a filesystem-like hierarchy. A candidate matches when
/// its prefix is identical and its path equals the pattern path or descends
/// from it. A root path (`prefix:/`) matches every path under the prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredPath {
    prefix: String,
    segments: Vec<String>,
}

impl StructuredPath {
    /// Parses a structured path pattern.
    ///
    /// # Errors
    ///
    /// Returns [`MatcherError::InvalidPath`] if the pattern has no `:`
    /// separator, an empty prefix, or a path not starting with `/`.
    pub fn parse(pattern: &str) -> Result<Self, MatcherError> {
        let invalid = || MatcherError::InvalidPath {
            pattern: pattern.to_string(),
        };

        let (prefix, path) = pattern.split_once(':').ok_or_else(invalid)?;
        if prefix.is_empty() || !path.starts_with('/') {
            return Err(invalid());
        }

        Ok(Self {
            prefix: prefix.to_string(),
            segments: Self::split_segments(path),
        })
    }

    fn split_segments(path: &str) -> Vec<String> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    /// Returns `true` if the candidate scope is this path or a descendant.
    ///
    /// Candidates that are not themselves well-formed `<prefix>:/<path>`
    /// scopes simply do not match; that is normal control flow, not an error.
    #[must_use]
    pub fn matches(&self, scope: &str) -> bool {
        let Some((prefix, path)) = scope.split_once(':') else {
            return false;
        };
        if prefix != self.prefix || !path.starts_with('/') {
            return false;
        }

        let candidate = Self::split_segments(path);
        candidate.len() >= self.segments.len()
            && candidate
                .iter()
                .zip(&self.segments)
                .all(|(c, p)| c == p)
    }
}

// =============================================================================
// Scope Matcher
// =============================================================================

/// A compiled predicate testing whether a scope satisfies a pattern.
///
/// The variant is selected once at compile time from the policy's
/// [`MatchingStrategy`]; `matches` is pure and side-effect-free.
#[derive(Debug, Clone)]
pub enum ScopeMatcher {
    /// Literal equality with the pattern.
    Exact(String),
    /// Full-string regular expression match.
    Regexp(Regex),
    /// Hierarchical path-prefix match.
    Path(StructuredPath),
}

impl ScopeMatcher {
    /// Compiles a pattern under the given matching strategy.
    ///
    /// Regular expressions are anchored so the whole candidate must match.
    ///
    /// # Errors
    ///
    /// Returns a [`MatcherError`] if the pattern is malformed for the
    /// declared strategy.
    pub fn compile(pattern: &str, strategy: MatchingStrategy) -> Result<Self, MatcherError> {
        match strategy {
            MatchingStrategy::Exact => Ok(Self::Exact(pattern.to_string())),
            MatchingStrategy::Regexp => {
                let anchored = format!("^(?:{pattern})$");
                let regex = Regex::new(&anchored).map_err(|e| MatcherError::InvalidRegexp {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                })?;
                Ok(Self::Regexp(regex))
            }
            MatchingStrategy::Path => Ok(Self::Path(StructuredPath::parse(pattern)?)),
        }
    }

    /// Returns `true` if the candidate scope satisfies this matcher.
    #[must_use]
    pub fn matches(&self, scope: &str) -> bool {
        match self {
            Self::Exact(pattern) => scope == pattern,
            Self::Regexp(regex) => regex.is_match(scope),
            Self::Path(path) => path.matches(scope),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_matcher() {
        let matcher = ScopeMatcher::compile("openid", MatchingStrategy::Exact).unwrap();
        assert!(matcher.matches("openid"));
        assert!(!matcher.matches("openid2"));
        assert!(!matcher.matches("open"));
    }

    #[test]
    fn test_regexp_matcher_is_full_match() {
        let matcher = ScopeMatcher::compile("admin\\..*", MatchingStrategy::Regexp).unwrap();
        assert!(matcher.matches("admin.write"));
        assert!(matcher.matches("admin.read"));
        // Substring hits must not count as matches.
        assert!(!matcher.matches("not-admin.write"));
        assert!(!matcher.matches("admin"));
    }

    #[test]
    fn test_regexp_compile_failure() {
        let err = ScopeMatcher::compile("[unclosed", MatchingStrategy::Regexp).unwrap_err();
        assert!(matches!(err, MatcherError::InvalidRegexp { .. }));
        assert!(err.to_string().contains("[unclosed"));
    }

    #[test]
    fn test_path_matcher_hierarchy() {
        let matcher = ScopeMatcher::compile("storage.read:/a", MatchingStrategy::Path).unwrap();
        assert!(matcher.matches("storage.read:/a"));
        assert!(matcher.matches("storage.read:/a/b"));
        assert!(matcher.matches("storage.read:/a/b/c"));
        // Sibling segments sharing a string prefix are not descendants.
        assert!(!matcher.matches("storage.read:/ab"));
        assert!(!matcher.matches("storage.read:/"));
        assert!(!matcher.matches("storage.write:/a"));
    }

    #[test]
    fn test_path_root_matches_everything_under_prefix() {
        let matcher = ScopeMatcher::compile("storage.read:/", MatchingStrategy::Path).unwrap();
        assert!(matcher.matches("storage.read:/"));
        assert!(matcher.matches("storage.read:/a"));
        assert!(matcher.matches("storage.read:/a/b"));
        assert!(!matcher.matches("storage.write:/a"));
    }

    #[test]
    fn test_path_candidate_must_be_structured() {
        let matcher = ScopeMatcher::compile("storage.read:/a", MatchingStrategy::Path).unwrap();
        assert!(!matcher.matches("openid"));
        assert!(!matcher.matches("storage.read"));
        assert!(!matcher.matches("storage.read:a"));
    }

    #[test]
    fn test_path_parse_failures() {
        for bad in ["no-colon", ":/missing-prefix", "prefix:not-rooted", "prefix:"] {
            let err = StructuredPath::parse(bad).unwrap_err();
            assert!(matches!(err, MatcherError::InvalidPath { .. }), "{bad}");
        }
    }

    #[test]
    fn test_path_ignores_duplicate_separators() {
        let matcher = ScopeMatcher::compile("storage.read://a//b", MatchingStrategy::Path).unwrap();
        assert!(matcher.matches("storage.read:/a/b"));
        assert!(matcher.matches("storage.read:/a/b/c"));
        assert!(!matcher.matches("storage.read:/a"));
    }
}
