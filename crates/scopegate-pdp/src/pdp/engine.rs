//! Scope policy decision point.
//!
//! [`ScopePolicyPdp::filter_scopes`] decides, for an authenticated account
//! and a set of requested scopes, which scopes are granted. Policies are
//! resolved in three tiers of decreasing priority:
//!
//! 1. policies attached directly to the account,
//! 2. the union of policies attached to the account's groups,
//! 3. system default policies loaded from storage.
//!
//! Each tier only considers scopes the previous tiers left undecided, and
//! evaluation short-circuits once every scope is resolved: if the account
//! tier decides everything, group and default policies are never consulted
//! and the default-policy lookup never happens.
//!
//! A scope no tier permits is simply absent from the result; absence is the
//! deny.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use scopegate_pdp::config::PdpConfig;
//! use scopegate_pdp::pdp::engine::ScopePolicyPdp;
//!
//! let pdp = ScopePolicyPdp::new(storage, PdpConfig::default());
//! let allowed = pdp.filter_scopes(&requested, &account).await?;
//! ```

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::config::PdpConfig;
use crate::error::PdpError;
use crate::model::{Account, ScopePolicy};
use crate::pdp::cache::{MatcherCache, MatcherCacheStats};
use crate::pdp::context::{DecisionContext, TierOutcome};
use crate::storage::PolicyStorage;

// =============================================================================
// Scope Policy PDP
// =============================================================================

/// The scope policy decision point.
///
/// Owns the matcher cache, so compiled patterns are amortized across every
/// evaluation for the lifetime of this instance. Safe to share across
/// concurrent request handlers.
pub struct ScopePolicyPdp {
    /// Source of system default policies.
    storage: Arc<dyn PolicyStorage>,

    /// Bounded cache of compiled scope matchers.
    matchers: MatcherCache,
}

impl ScopePolicyPdp {
    /// Creates a decision point backed by the given policy storage.
    #[must_use]
    pub fn new(storage: Arc<dyn PolicyStorage>, config: PdpConfig) -> Self {
        Self {
            storage,
            matchers: MatcherCache::new(config.matcher_cache_capacity),
        }
    }

    /// Filters the requested scopes down to the allowed subset.
    ///
    /// The result is always a subset of `requested`, and identical inputs
    /// against unchanged policy state yield identical results.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any consulted policy carries a
    /// pattern that does not compile under its declared strategy, and a
    /// storage error if the default-policy lookup fails. Either failure
    /// aborts the whole call; callers must treat it as "cannot compute
    /// authorization" and fail the request rather than fall back to the raw
    /// requested set.
    pub async fn filter_scopes(
        &self,
        requested: &HashSet<String>,
        account: &Account,
    ) -> Result<HashSet<String>, PdpError> {
        if requested.is_empty() {
            return Ok(HashSet::new());
        }

        let mut allowed = HashSet::new();

        // Tier 1: account policies.
        let outcome = self.apply_tier(
            requested.iter().cloned().collect(),
            &account.scope_policies,
            account,
        )?;
        allowed.extend(outcome.permitted);

        if outcome.open.is_empty() {
            tracing::debug!(
                account = %account.username,
                allowed = allowed.len(),
                "all scopes resolved by account policies"
            );
            return Ok(allowed);
        }

        // Tier 2: group policies, on still-open scopes only.
        let group_policies = Self::resolve_group_policies(account);
        let outcome = self.apply_tier(outcome.open, &group_policies, account)?;
        allowed.extend(outcome.permitted);

        if outcome.open.is_empty() {
            tracing::debug!(
                account = %account.username,
                allowed = allowed.len(),
                "all scopes resolved by group policies"
            );
            return Ok(allowed);
        }

        // Tier 3: system default policies, on whatever is left.
        let default_policies = self.storage.find_default_policies().await?;
        let outcome = self.apply_tier(outcome.open, &default_policies, account)?;
        allowed.extend(outcome.permitted);

        tracing::debug!(
            account = %account.username,
            requested = requested.len(),
            allowed = allowed.len(),
            "scope filtering complete"
        );
        Ok(allowed)
    }

    /// Statistics for the owned matcher cache.
    #[must_use]
    pub fn matcher_cache_stats(&self) -> MatcherCacheStats {
        self.matchers.stats()
    }

    /// Applies one tier of policies to the open scopes and folds the result.
    fn apply_tier(
        &self,
        open: HashSet<String>,
        policies: &[ScopePolicy],
        account: &Account,
    ) -> Result<TierOutcome, PdpError> {
        let mut context = DecisionContext::new(&self.matchers, open);
        for policy in policies {
            context.apply_policy(policy, account)?;
        }
        Ok(context.resolve())
    }

    /// Union of the policies attached to the account's groups, deduplicated
    /// by policy id and ordered by id so tier application is deterministic.
    fn resolve_group_policies(account: &Account) -> Vec<ScopePolicy> {
        let mut by_id: BTreeMap<&str, &ScopePolicy> = BTreeMap::new();
        for group in &account.groups {
            for policy in &group.scope_policies {
                by_id.entry(policy.id.as_str()).or_insert(policy);
            }
        }
        by_id.into_values().cloned().collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
