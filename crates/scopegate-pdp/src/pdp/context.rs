//! Per-request decision state.
//!
//! A [`DecisionContext`] is created fresh for one tier of one
//! `filter_scopes` call and owned exclusively by it. It tracks a tri-state
//! status per requested scope (unprocessed, permit, deny) while policies are
//! applied in sequence, combining them deny-overrides: a permit never
//! replaces an earlier deny, while a deny replaces anything.
//!
//! [`DecisionContext::resolve`] folds the tier into a [`TierOutcome`]:
//! permitted scopes go to the caller's accumulated allowed set, unprocessed
//! scopes stay open for the next tier, and denied scopes are dropped
//! entirely. A scope denied in one tier is therefore never reconsidered
//! downstream; it is simply absent from the final result.

use std::collections::{HashMap, HashSet};

use crate::error::PdpError;
use crate::model::{Account, MatchingStrategy, ScopePolicy};
use crate::pdp::cache::MatcherCache;

/// Evaluation status of a single requested scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeStatus {
    Unprocessed,
    Permit,
    Deny,
}

// =============================================================================
// Tier Outcome
// =============================================================================

/// The result of folding one tier of policy application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierOutcome {
    /// Scopes permitted by this tier.
    pub permitted: HashSet<String>,

    /// Scopes no policy in this tier decided; open for the next tier.
    pub open: HashSet<String>,
}

// =============================================================================
// Decision Context
// =============================================================================

/// Mutable evaluation state for one tier of policy application.
pub struct DecisionContext<'a> {
    status: HashMap<String, ScopeStatus>,
    matchers: &'a MatcherCache,
}

impl<'a> DecisionContext<'a> {
    /// Creates a context tracking the given scopes as unprocessed.
    #[must_use]
    pub fn new(matchers: &'a MatcherCache, scopes: impl IntoIterator<Item = String>) -> Self {
        let status: HashMap<_, _> = scopes
            .into_iter()
            .map(|s| (s, ScopeStatus::Unprocessed))
            .collect();
        tracing::debug!(scopes = ?status.keys().collect::<Vec<_>>(), "decision context created");
        Self { status, matchers }
    }

    /// Applies one policy to every scope currently tracked.
    ///
    /// Scope order within a single policy application does not matter; the
    /// order of successive `apply_policy` calls does, per deny-overrides.
    ///
    /// # Errors
    ///
    /// Returns [`PdpError::InvalidPattern`] if any of the policy's patterns
    /// fails to compile under its declared strategy. The whole evaluation
    /// aborts; a malformed policy is never silently skipped.
    pub fn apply_policy(&mut self, policy: &ScopePolicy, account: &Account) -> Result<(), PdpError> {
        let scopes: Vec<String> = self.status.keys().cloned().collect();
        for scope in scopes {
            self.apply_policy_to_scope(&scope, policy, account)?;
        }
        Ok(())
    }

    fn apply_policy_to_scope(
        &mut self,
        scope: &str,
        policy: &ScopePolicy,
        account: &Account,
    ) -> Result<(), PdpError> {
        if !self.policy_applies(policy, scope)? {
            tracing::trace!(
                policy_id = %policy.id,
                scope = %scope,
                account = %account.username,
                "policy not applicable"
            );
            return Ok(());
        }

        if policy.is_permit() {
            tracing::debug!(
                policy_id = %policy.id,
                scope = %scope,
                account = %account.username,
                "policy permits scope"
            );
            self.permit_scope(scope);
        } else {
            tracing::debug!(
                policy_id = %policy.id,
                scope = %scope,
                account = %account.username,
                "policy denies scope"
            );
            self.deny_scope(scope);
        }

        Ok(())
    }

    /// Applicability per the policy's matching strategy.
    ///
    /// An empty pattern set applies to every scope. Exact matching checks
    /// the set directly; regexp and path patterns are compiled through the
    /// matcher cache. Every pattern is compiled even after a match is found,
    /// so a malformed pattern always surfaces as an error.
    fn policy_applies(&self, policy: &ScopePolicy, scope: &str) -> Result<bool, PdpError> {
        if policy.scope_patterns.is_empty() {
            return Ok(true);
        }

        match policy.strategy {
            MatchingStrategy::Exact => Ok(policy.scope_patterns.contains(scope)),
            MatchingStrategy::Regexp | MatchingStrategy::Path => {
                let mut found = false;
                for pattern in &policy.scope_patterns {
                    let matcher = self
                        .matchers
                        .get_or_compile(pattern, policy.strategy)
                        .map_err(|e| {
                            PdpError::invalid_pattern(&policy.id, pattern, e.to_string())
                        })?;
                    if matcher.matches(scope) {
                        found = true;
                    }
                }
                Ok(found)
            }
        }
    }

    fn permit_scope(&mut self, scope: &str) {
        match self.status.get_mut(scope) {
            Some(status) if *status != ScopeStatus::Deny => *status = ScopeStatus::Permit,
            Some(_) => {
                tracing::debug!(scope = %scope, "permit ignored, former deny overrides");
            }
            None => {}
        }
    }

    fn deny_scope(&mut self, scope: &str) {
        if let Some(status) = self.status.get_mut(scope) {
            *status = ScopeStatus::Deny;
        }
    }

    /// Folds the tier: permitted scopes out, unprocessed scopes kept open,
    /// denied scopes discarded.
    #[must_use]
    pub fn resolve(self) -> TierOutcome {
        let mut permitted = HashSet::new();
        let mut open = HashSet::new();

        for (scope, status) in self.status {
            match status {
                ScopeStatus::Permit => {
                    permitted.insert(scope);
                }
                ScopeStatus::Unprocessed => {
                    open.insert(scope);
                }
                ScopeStatus::Deny => {}
            }
        }

        TierOutcome { permitted, open }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PolicyEffect;

    fn permit_policy(id: &str, strategy: MatchingStrategy, patterns: &[&str]) -> ScopePolicy {
        ScopePolicy {
            id: id.to_string(),
            effect: PolicyEffect::Permit,
            strategy,
            scope_patterns: patterns.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn deny_policy(id: &str, strategy: MatchingStrategy, patterns: &[&str]) -> ScopePolicy {
        ScopePolicy {
            effect: PolicyEffect::Deny,
            ..permit_policy(id, strategy, patterns)
        }
    }

    fn context<'a>(cache: &'a MatcherCache, scopes: &[&str]) -> DecisionContext<'a> {
        DecisionContext::new(cache, scopes.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_permit_resolves_scope() {
        let cache = MatcherCache::new(8);
        let account = Account::new("alice");
        let mut ctx = context(&cache, &["openid", "profile"]);

        ctx.apply_policy(
            &permit_policy("p1", MatchingStrategy::Exact, &["openid"]),
            &account,
        )
        .unwrap();

        let outcome = ctx.resolve();
        assert_eq!(outcome.permitted, ["openid".to_string()].into());
        assert_eq!(outcome.open, ["profile".to_string()].into());
    }

    #[test]
    fn test_deny_overrides_within_tier_regardless_of_order() {
        let cache = MatcherCache::new(8);
        let account = Account::new("alice");
        let permit = permit_policy("permit", MatchingStrategy::Exact, &["openid"]);
        let deny = deny_policy("deny", MatchingStrategy::Exact, &["openid"]);

        // Deny first: later permit must not resurrect the scope.
        let mut ctx = context(&cache, &["openid"]);
        ctx.apply_policy(&deny, &account).unwrap();
        ctx.apply_policy(&permit, &account).unwrap();
        let outcome = ctx.resolve();
        assert!(outcome.permitted.is_empty());
        assert!(outcome.open.is_empty());

        // Permit first: a later deny downgrades it.
        let mut ctx = context(&cache, &["openid"]);
        ctx.apply_policy(&permit, &account).unwrap();
        ctx.apply_policy(&deny, &account).unwrap();
        let outcome = ctx.resolve();
        assert!(outcome.permitted.is_empty());
        assert!(outcome.open.is_empty());
    }

    #[test]
    fn test_empty_pattern_set_applies_to_all_scopes() {
        let cache = MatcherCache::new(8);
        let account = Account::new("alice");
        let mut ctx = context(&cache, &["openid", "profile", "email"]);

        ctx.apply_policy(&permit_policy("p1", MatchingStrategy::Exact, &[]), &account)
            .unwrap();

        let outcome = ctx.resolve();
        assert_eq!(outcome.permitted.len(), 3);
        assert!(outcome.open.is_empty());
    }

    #[test]
    fn test_regexp_applicability() {
        let cache = MatcherCache::new(8);
        let account = Account::new("alice");
        let mut ctx = context(&cache, &["admin.write", "openid"]);

        ctx.apply_policy(
            &deny_policy("deny-admin", MatchingStrategy::Regexp, &["admin\\..*"]),
            &account,
        )
        .unwrap();

        let outcome = ctx.resolve();
        assert!(outcome.permitted.is_empty());
        assert_eq!(outcome.open, ["openid".to_string()].into());
    }

    #[test]
    fn test_path_applicability() {
        let cache = MatcherCache::new(8);
        let account = Account::new("alice");
        let mut ctx = context(&cache, &["storage.read:/private/data", "storage.read:/public"]);

        ctx.apply_policy(
            &deny_policy("deny-private", MatchingStrategy::Path, &["storage.read:/private"]),
            &account,
        )
        .unwrap();

        let outcome = ctx.resolve();
        assert_eq!(outcome.open, ["storage.read:/public".to_string()].into());
    }

    #[test]
    fn test_malformed_pattern_aborts_application() {
        let cache = MatcherCache::new(8);
        let account = Account::new("alice");
        let mut ctx = context(&cache, &["openid"]);

        let err = ctx
            .apply_policy(
                &permit_policy("broken", MatchingStrategy::Regexp, &["[unclosed"]),
                &account,
            )
            .unwrap_err();

        match err {
            PdpError::InvalidPattern { policy_id, .. } => assert_eq!(policy_id, "broken"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_pattern_errors_even_when_another_matches() {
        let cache = MatcherCache::new(8);
        let account = Account::new("alice");
        let mut ctx = context(&cache, &["openid"]);

        // "openid" already matches, but the broken sibling pattern is still
        // a configuration error and must not be silently ignored.
        let policy = permit_policy("half-broken", MatchingStrategy::Regexp, &["openid", "[bad"]);
        assert!(ctx.apply_policy(&policy, &account).is_err());
    }

    #[test]
    fn test_resolve_drops_denied_scopes() {
        let cache = MatcherCache::new(8);
        let account = Account::new("alice");
        let mut ctx = context(&cache, &["a", "b", "c"]);

        ctx.apply_policy(&permit_policy("p", MatchingStrategy::Exact, &["a"]), &account)
            .unwrap();
        ctx.apply_policy(&deny_policy("d", MatchingStrategy::Exact, &["b"]), &account)
            .unwrap();

        let outcome = ctx.resolve();
        assert_eq!(outcome.permitted, ["a".to_string()].into());
        assert_eq!(outcome.open, ["c".to_string()].into());
        // "b" is gone entirely: neither permitted nor open.
    }
}
