//! Endpoint discovery: cache short-circuit, else one bounded probe.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tracing::{debug, info};

use crate::endpoint::Endpoint;

use super::cache::ProbeCache;
use super::probe::Prober;

// ============================================================================
// Discoverer
// ============================================================================

/// Determines whether a control endpoint is reachable, memoizing the
/// answer per endpoint.
///
/// The cache short-circuit is the dominant path once a session has visited
/// a host once: a cached result returns immediately with zero network
/// activity. Otherwise exactly one probe runs and its result is stored
/// first-writer-wins, so concurrent discoveries of the same endpoint agree
/// on whichever result landed first.
pub struct Discoverer {
    /// Shared probe result memo.
    cache: Arc<ProbeCache>,
    /// Reachability probe implementation.
    prober: Arc<dyn Prober>,
}

impl Discoverer {
    /// Creates a discoverer over a shared cache and prober.
    #[must_use]
    pub fn new(cache: Arc<ProbeCache>, prober: Arc<dyn Prober>) -> Self {
        Self { cache, prober }
    }

    /// Returns the shared probe cache.
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &Arc<ProbeCache> {
        &self.cache
    }

    /// Resolves whether `endpoint` is reachable.
    ///
    /// Consults the cache first; on a miss performs one bounded probe and
    /// memoizes the outcome. Probe timeout and explicit refusal both
    /// resolve to unreachable.
    pub async fn discover(&self, endpoint: &Endpoint) -> bool {
        if let Some(reachable) = self.cache.lookup(endpoint) {
            debug!(%endpoint, reachable, "Probe skipped, endpoint already checked");
            return reachable;
        }

        let reachable = match self.prober.probe(endpoint).await {
            Ok(()) => {
                info!(%endpoint, "Control endpoint reachable");
                true
            }
            Err(e) => {
                debug!(%endpoint, error = %e, "Control endpoint unreachable");
                false
            }
        };

        self.cache.store(endpoint, reachable);

        // Report what the cache actually holds: if a concurrent probe won
        // the store race, every caller sees that first result.
        self.cache.lookup(endpoint).unwrap_or(reachable)
    }
}

// ============================================================================
// Tests
// ============================================================================
