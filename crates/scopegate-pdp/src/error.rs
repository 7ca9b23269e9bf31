//! Error types for scope policy evaluation.
//!
//! Evaluation distinguishes two failure classes: configuration errors
//! (a policy whose patterns cannot be compiled under its declared matching
//! strategy, or a strategy the engine does not recognize) and storage errors
//! from the default-policy backend. Both abort the whole `filter_scopes`
//! call; there is no partial or best-effort result.

/// Errors that can occur during scope policy evaluation.
#[derive(Debug, thiserror::Error)]
pub enum PdpError {
    /// A policy declares a pattern that does not compile under its matching
    /// strategy. Attributed to the offending policy for operator diagnosis.
    #[error("Invalid pattern '{pattern}' in scope policy '{policy_id}': {message}")]
    InvalidPattern {
        /// Identifier of the policy carrying the bad pattern.
        policy_id: String,
        /// The pattern that failed to compile.
        pattern: String,
        /// Description of the compile failure.
        message: String,
    },

    /// A matching strategy string is not one of `exact`, `regexp`, `path`.
    #[error("Unknown scope matching strategy: {value}")]
    UnknownStrategy {
        /// The unrecognized strategy value.
        value: String,
    },

    /// The policy storage backend failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },
}

impl PdpError {
    /// Creates a new `InvalidPattern` error attributed to a policy.
    #[must_use]
    pub fn invalid_pattern(
        policy_id: impl Into<String>,
        pattern: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidPattern {
            policy_id: policy_id.into(),
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Creates a new `UnknownStrategy` error.
    #[must_use]
    pub fn unknown_strategy(value: impl Into<String>) -> Self {
        Self::UnknownStrategy {
            value: value.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Returns `true` if this error stems from policy configuration.
    ///
    /// Configuration errors are not retryable: the offending policy must be
    /// fixed before evaluation can succeed.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidPattern { .. } | Self::UnknownStrategy { .. }
        )
    }

    /// Returns `true` if this error came from the storage backend.
    #[must_use]
    pub fn is_storage_error(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }
}
