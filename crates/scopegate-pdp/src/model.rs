//! Scope policy and principal model types.
//!
//! A [`ScopePolicy`] is a declarative rule: an effect (permit or deny), a
//! matching strategy, and a set of scope patterns the rule applies to. An
//! empty pattern set means the policy applies to every requested scope.
//!
//! Policies are attached to an [`Account`], to a [`Group`], or stored
//! unattached as system defaults. The decision point treats all three as
//! read-only inputs loaded by the caller or the storage backend.
//!
//! # Example
//!
//! ```
//! use scopegate_pdp::model::{MatchingStrategy, PolicyEffect, ScopePolicy};
//!
//! let policy = ScopePolicy {
//!     id: "allow-openid".to_string(),
//!     effect: PolicyEffect::Permit,
//!     strategy: MatchingStrategy::Exact,
//!     scope_patterns: ["openid".to_string()].into(),
//!     ..Default::default()
//! };
//!
//! policy.validate().unwrap();
//! assert!(policy.is_permit());
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PdpError;
use crate::pdp::matcher::ScopeMatcher;

// =============================================================================
// Policy Effect
// =============================================================================

/// The effect a policy has on scopes it applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyEffect {
    /// Grant the scope, unless a deny already decided it.
    Permit,
    /// Refuse the scope. Deny always wins within a tier.
    Deny,
}

// =============================================================================
// Matching Strategy
// =============================================================================

/// How a policy's scope patterns are matched against requested scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchingStrategy {
    /// Literal string equality against the pattern set.
    Exact,
    /// Full-string regular expression match.
    Regexp,
    /// Hierarchical `<prefix>:/<path>` prefix match.
    Path,
}

impl fmt::Display for MatchingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Regexp => write!(f, "regexp"),
            Self::Path => write!(f, "path"),
        }
    }
}

impl FromStr for MatchingStrategy {
    type Err = PdpError;

    /// Parses a strategy from its stored textual form.
    ///
    /// Policy records loaded from external stores carry the strategy as
    /// text; an unrecognized value is a configuration error surfaced here,
    /// before any evaluation runs.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Self::Exact),
            "regexp" => Ok(Self::Regexp),
            "path" => Ok(Self::Path),
            other => Err(PdpError::unknown_strategy(other)),
        }
    }
}

// =============================================================================
// Scope Policy
// =============================================================================

/// A declarative scope authorization rule.
///
/// Immutable for the duration of one evaluation once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopePolicy {
    /// Opaque identifier, stable across evaluations. Used for diagnostics
    /// and for deduplicating group policy unions.
    pub id: String,

    /// Whether applicable scopes are permitted or denied.
    pub effect: PolicyEffect,

    /// How `scope_patterns` are matched against requested scopes.
    #[serde(rename = "matchingStrategy")]
    pub strategy: MatchingStrategy,

    /// Patterns this policy applies to. Empty means every scope.
    #[serde(default)]
    pub scope_patterns: BTreeSet<String>,

    /// Free-text description, diagnostic only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for ScopePolicy {
    fn default() -> Self {
        Self {
            id: String::new(),
            effect: PolicyEffect::Deny,
            strategy: MatchingStrategy::Exact,
            scope_patterns: BTreeSet::new(),
            description: None,
        }
    }
}

impl ScopePolicy {
    /// Returns `true` if this policy permits applicable scopes.
    #[must_use]
    pub fn is_permit(&self) -> bool {
        self.effect == PolicyEffect::Permit
    }

    /// Checks that every pattern compiles under the declared strategy.
    ///
    /// Exact patterns are arbitrary literals and always valid. Regexp and
    /// path patterns are compiled eagerly so a malformed policy fails at
    /// save time rather than mid-evaluation.
    ///
    /// # Errors
    ///
    /// Returns [`PdpError::InvalidPattern`] naming this policy and the first
    /// pattern that fails to compile.
    pub fn validate(&self) -> Result<(), PdpError> {
        if self.strategy == MatchingStrategy::Exact {
            return Ok(());
        }
        for pattern in &self.scope_patterns {
            ScopeMatcher::compile(pattern, self.strategy)
                .map_err(|e| PdpError::invalid_pattern(&self.id, pattern, e.to_string()))?;
        }
        Ok(())
    }
}

// =============================================================================
// Principal Aggregates
// =============================================================================

/// A group of accounts with its attached scope policies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Unique group identifier.
    pub id: Uuid,

    /// Group display name.
    pub name: String,

    /// Scope policies attached to this group.
    #[serde(default)]
    pub scope_policies: Vec<ScopePolicy>,
}

impl Group {
    /// Creates an empty group with a fresh identifier.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            scope_policies: Vec::new(),
        }
    }
}

/// An authenticated principal with its policies and group memberships.
///
/// Fully loaded before evaluation; the decision point performs no account
/// lookups of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Unique account identifier.
    pub id: Uuid,

    /// Account name, used for decision-log attribution.
    pub username: String,

    /// Scope policies attached directly to this account.
    #[serde(default)]
    pub scope_policies: Vec<ScopePolicy>,

    /// Groups this account belongs to.
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl Account {
    /// Creates an account with a fresh identifier and no policies or groups.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            scope_policies: Vec::new(),
            groups: Vec::new(),
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
    fn test_strategy_from_str() {
        assert_eq!(
            "exact".parse::<MatchingStrategy>().unwrap(),
            MatchingStrategy::Exact
        );
        assert_eq!(
            "regexp".parse::<MatchingStrategy>().unwrap(),
            MatchingStrategy::Regexp
        );
        assert_eq!(
            "path".parse::<MatchingStrategy>().unwrap(),
            MatchingStrategy::Path
        );

        let err = "glob".parse::<MatchingStrategy>().unwrap_err();
        assert!(matches!(err, PdpError::UnknownStrategy { .. }));
    }

    #[test]
    fn test_strategy_display_round_trip() {
        for strategy in [
            MatchingStrategy::Exact,
            MatchingStrategy::Regexp,
            MatchingStrategy::Path,
        ] {
            assert_eq!(
                strategy.to_string().parse::<MatchingStrategy>().unwrap(),
                strategy
            );
        }
    }

    #[test]
    fn test_policy_serialization() {
        let policy = ScopePolicy {
            id: "p1".to_string(),
            effect: PolicyEffect::Permit,
            strategy: MatchingStrategy::Regexp,
            scope_patterns: ["admin\\..*".to_string()].into(),
            description: Some("admin scopes".to_string()),
        };

        let json = serde_json::to_string(&policy).unwrap();
        assert!(json.contains(r#""matchingStrategy":"regexp""#));
        assert!(json.contains(r#""effect":"permit""#));

        let parsed: ScopePolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, policy);
    }

    #[test]
    fn test_validate_exact_always_valid() {
        let policy = ScopePolicy {
            id: "p1".to_string(),
            strategy: MatchingStrategy::Exact,
            // Would be a broken regex, but exact patterns are literals.
            scope_patterns: ["[unclosed".to_string()].into(),
            ..Default::default()
        };
        policy.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_regexp() {
        let policy = ScopePolicy {
            id: "broken".to_string(),
            strategy: MatchingStrategy::Regexp,
            scope_patterns: ["[unclosed".to_string()].into(),
            ..Default::default()
        };

        let err = policy.validate().unwrap_err();
        match err {
            PdpError::InvalidPattern { policy_id, pattern, .. } => {
                assert_eq!(policy_id, "broken");
                assert_eq!(pattern, "[unclosed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_rejects_bad_path() {
        let policy = ScopePolicy {
            id: "broken-path".to_string(),
            strategy: MatchingStrategy::Path,
            scope_patterns: ["no-colon-or-slash".to_string()].into(),
            ..Default::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_account_and_group_construction() {
        let mut account = Account::new("alice");
        assert!(account.scope_policies.is_empty());
        assert!(account.groups.is_empty());

        let group = Group::new("analysts");
        assert_ne!(account.id, group.id);
        account.groups.push(group);
        assert_eq!(account.groups.len(), 1);
    }
}
