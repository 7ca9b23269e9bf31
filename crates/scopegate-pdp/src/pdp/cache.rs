//! Bounded cache of compiled scope matchers.
//!
//! Pattern strings recur across evaluations, so compiled regular expressions
//! and structured paths are cached for the lifetime of the decision point.
//! The cache is capacity-bounded and safe for concurrent lookups and
//! first-time compilations from simultaneous evaluations.
//!
//! Two evaluations racing on the same uncached pattern may both compile it;
//! the second insert simply wins. That costs a duplicate compilation, never
//! a wrong decision.
//!
//! # Example
//!
//! ```
//! use scopegate_pdp::model::MatchingStrategy;
//! use scopegate_pdp::pdp::cache::MatcherCache;
//!
//! let cache = MatcherCache::new(30);
//! let matcher = cache
//!     .get_or_compile("admin\\..*", MatchingStrategy::Regexp)
//!     .unwrap();
//! assert!(matcher.matches("admin.write"));
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::model::MatchingStrategy;
use crate::pdp::matcher::{MatcherError, ScopeMatcher};

type CacheKey = (String, MatchingStrategy);

/// Map plus insertion-order queue backing the bound.
#[derive(Default)]
struct CacheInner {
    matchers: HashMap<CacheKey, Arc<ScopeMatcher>>,
    insertion_order: VecDeque<CacheKey>,
}

// =============================================================================
// Matcher Cache
// =============================================================================

/// Capacity-bounded cache mapping scope patterns to compiled matchers.
///
/// Owned by the decision point and shared across all of its evaluations.
/// Eviction is first-in-first-out: only the size bound matters for
/// correctness, not the eviction order.
pub struct MatcherCache {
    inner: RwLock<CacheInner>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MatcherCache {
    /// Creates a cache holding at most `capacity` compiled matchers.
    ///
    /// A zero capacity disables caching entirely; every lookup compiles.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(CacheInner::default()),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the cached matcher for a pattern, compiling on first use.
    ///
    /// # Errors
    ///
    /// Returns a [`MatcherError`] if the pattern fails to compile under the
    /// strategy. Nothing is inserted on failure, so a bad pattern never
    /// poisons the cache.
    pub fn get_or_compile(
        &self,
        pattern: &str,
        strategy: MatchingStrategy,
    ) -> Result<Arc<ScopeMatcher>, MatcherError> {
        if let Ok(inner) = self.inner.read()
            && let Some(matcher) = inner.matchers.get(&(pattern.to_string(), strategy))
        {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(matcher));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);

        // Compile outside the lock; compilation can be expensive.
        let matcher = Arc::new(ScopeMatcher::compile(pattern, strategy)?);

        if self.capacity == 0 {
            return Ok(matcher);
        }

        let key = (pattern.to_string(), strategy);
        if let Ok(mut inner) = self.inner.write() {
            // Another evaluation may have inserted while we compiled.
            if let Some(existing) = inner.matchers.get(&key) {
                return Ok(Arc::clone(existing));
            }

            while inner.matchers.len() >= self.capacity {
                match inner.insertion_order.pop_front() {
                    Some(oldest) => {
                        inner.matchers.remove(&oldest);
                    }
                    None => break,
                }
            }

            inner.matchers.insert(key.clone(), Arc::clone(&matcher));
            inner.insertion_order.push_back(key);
        }

        Ok(matcher)
    }

    /// Current number of cached matchers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.matchers.len()).unwrap_or(0)
    }

    /// Returns `true` if no matchers are cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of cache counters.
    #[must_use]
    pub fn stats(&self) -> MatcherCacheStats {
        MatcherCacheStats {
            size: self.len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

// =============================================================================
// Cache Statistics
// =============================================================================

/// Statistics about the matcher cache.
#[derive(Debug, Clone, Copy)]
pub struct MatcherCacheStats {
    /// Number of cached matchers.
    pub size: usize,

    /// Maximum number of matchers held.
    pub capacity: usize,

    /// Lookups served from the cache.
    pub hits: u64,

    /// Lookups that required compilation.
    pub misses: u64,
}

// =============================================================================
// Tests
// =============================================================================
