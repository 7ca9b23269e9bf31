//! # scopegate-pdp
//!
//! Scope policy decision point for OAuth-style authorization scopes.
//!
//! Given an authenticated account and a set of requested scopes, the
//! decision point filters the request down to the allowed subset by
//! evaluating declarative [`ScopePolicy`] rules in three tiers: policies
//! attached to the account, policies attached to its groups, and system
//! defaults loaded through the [`PolicyStorage`] seam. Policies combine
//! deny-overrides within a tier, earlier tiers win over later ones, and
//! evaluation short-circuits once every scope is decided.
//!
//! This crate decides; it does not authenticate, issue tokens, or interpret
//! what a scope means to downstream resource servers.
//!
//! ## Modules
//!
//! - [`model`] - Scope policies and the account/group aggregates
//! - [`pdp`] - Matchers, matcher cache, decision context, and the engine
//! - [`storage`] - Default-policy storage trait and in-memory store
//! - [`config`] - Decision point configuration
//! - [`error`] - Error taxonomy
//!
//! ## Example
//!
//! ```
//! use std::collections::HashSet;
//! use std::sync::Arc;
//!
//! use scopegate_pdp::config::PdpConfig;
//! use scopegate_pdp::model::{Account, MatchingStrategy, PolicyEffect, ScopePolicy};
//! use scopegate_pdp::pdp::ScopePolicyPdp;
//! use scopegate_pdp::storage::InMemoryPolicyStorage;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), scopegate_pdp::PdpError> {
//! let storage = Arc::new(InMemoryPolicyStorage::new());
//! storage.add_policy(ScopePolicy {
//!     id: "default-permit-openid".to_string(),
//!     effect: PolicyEffect::Permit,
//!     strategy: MatchingStrategy::Exact,
//!     scope_patterns: ["openid".to_string()].into(),
//!     ..Default::default()
//! })?;
//!
//! let pdp = ScopePolicyPdp::new(storage, PdpConfig::default());
//! let requested: HashSet<String> =
//!     ["openid".to_string(), "profile".to_string()].into();
//!
//! let allowed = pdp.filter_scopes(&requested, &Account::new("alice")).await?;
//! assert_eq!(allowed, ["openid".to_string()].into());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod pdp;
pub mod storage;

pub use config::PdpConfig;
pub use error::PdpError;
pub use model::{Account, Group, MatchingStrategy, PolicyEffect, ScopePolicy};
pub use pdp::{
    DecisionContext, MatcherCache, MatcherCacheStats, MatcherError, ScopeMatcher, ScopePolicyPdp,
    StructuredPath, TierOutcome,
};
pub use storage::{InMemoryPolicyStorage, PolicyStorage};

/// Type alias for decision point results.
pub type PdpResult<T> = Result<T, PdpError>;

/// Prelude module for convenient imports.
///
/// ```
/// use scopegate_pdp::prelude::*;
/// ```
pub mod prelude {
    pub use crate::PdpResult;
    pub use crate::config::PdpConfig;
    pub use crate::error::PdpError;
    pub use crate::model::{Account, Group, MatchingStrategy, PolicyEffect, ScopePolicy};
    pub use crate::pdp::{
        DecisionContext, MatcherCache, MatcherCacheStats, MatcherError, ScopeMatcher,
        ScopePolicyPdp, StructuredPath, TierOutcome,
    };
    pub use crate::storage::{InMemoryPolicyStorage, PolicyStorage};
}
