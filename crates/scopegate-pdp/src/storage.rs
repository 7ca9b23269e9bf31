//! Storage seam for system default policies.
//!
//! Account and group policies ride on the already-loaded [`Account`]
//! aggregate; only the unattached system defaults need a backend lookup,
//! and [`PolicyStorage`] is that read-only boundary. The decision point
//! performs no retries and no fallback on storage failure.
//!
//! [`Account`]: crate::model::Account

use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::PdpError;
use crate::model::ScopePolicy;

/// Read-only source of system default scope policies.
///
/// Default policies apply to scopes that neither account nor group policies
/// decided. Implementations return them in evaluation order.
#[async_trait]
pub trait PolicyStorage: Send + Sync {
    /// Returns all policies stored as system defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PdpError::Storage`] if the backend cannot be read. The
    /// error propagates to the caller of `filter_scopes` unchanged.
    async fn find_default_policies(&self) -> Result<Vec<ScopePolicy>, PdpError>;
}

// =============================================================================
// In-Memory Storage
// =============================================================================

/// In-memory default-policy store for embedding and tests.
///
/// Policies are validated on insert, so a malformed pattern is rejected at
/// save time instead of failing evaluations later.
#[derive(Default)]
pub struct InMemoryPolicyStorage {
    policies: RwLock<Vec<ScopePolicy>>,
}

impl InMemoryPolicyStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a default policy, keeping insertion order as evaluation order.
    ///
    /// # Errors
    ///
    /// Returns [`PdpError::InvalidPattern`] if any of the policy's patterns
    /// does not compile under its declared strategy.
    pub fn add_policy(&self, policy: ScopePolicy) -> Result<(), PdpError> {
        policy.validate()?;
        if let Ok(mut policies) = self.policies.write() {
            policies.push(policy);
        }
        Ok(())
    }

    /// Number of stored default policies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.read().map(|p| p.len()).unwrap_or(0)
    }

    /// Returns `true` if no default policies are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PolicyStorage for InMemoryPolicyStorage {
    async fn find_default_policies(&self) -> Result<Vec<ScopePolicy>, PdpError> {
        self.policies
            .read()
            .map(|p| p.clone())
            .map_err(|_| PdpError::storage("default policy store lock poisoned"))
    }
}

// =============================================================================
// Tests
// =============================================================================
