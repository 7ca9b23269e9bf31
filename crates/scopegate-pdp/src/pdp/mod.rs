//! Scope policy decision point internals.
//!
//! The decision pipeline, leaf-first:
//!
//! - [`matcher`] — compiled predicates testing a scope against a pattern
//!   (exact, regular expression, hierarchical path).
//! - [`cache`] — bounded, concurrency-safe cache of compiled matchers,
//!   shared across evaluations.
//! - [`context`] — per-tier tri-state evaluation state with deny-overrides
//!   combination and an explicit fold into permitted/open scope sets.
//! - [`engine`] — the [`ScopePolicyPdp`] orchestrator resolving the
//!   account, group, and default policy tiers with short-circuit.
//!
//! [`ScopePolicyPdp`]: engine::ScopePolicyPdp

pub mod cache;
pub mod context;
pub mod engine;
pub mod matcher;

pub use cache::{MatcherCache, MatcherCacheStats};
pub use context::{DecisionContext, TierOutcome};
pub use engine::ScopePolicyPdp;
pub use matcher::{MatcherError, ScopeMatcher, StructuredPath};
