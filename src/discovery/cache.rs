//! Probe result memoization.
//!
//! Repeated navigation within one session keeps hitting the same handful of
//! hosts, so reachability is probed at most once per `(host, port, secure)`
//! key and memoized for the lifetime of the process. The map is unbounded;
//! the number of distinct hosts visited in a session is small.

// ============================================================================
// Imports
// ============================================================================

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::endpoint::Endpoint;

// ============================================================================
// CacheEntry
// ============================================================================

/// A memoized probe result with its storage time.
#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    reachable: bool,
    stored_at: Instant,
}

// ============================================================================
// ProbeCache
// ============================================================================

/// Memo of probe results keyed by [`Endpoint`].
///
/// Stores are first-writer-wins: once a key holds a result it is never
/// overwritten for the run, so a success that arrives after a timeout has
/// already recorded `false` does not flip the entry. Absence of an entry
/// means "not yet probed".
///
/// An optional TTL makes expired entries read as absent (and overwritable),
/// so a control server restarting on a different port is not permanently
/// marked unreachable for the rest of the session.
///
/// # Thread Safety
///
/// Interior mutability behind a [`parking_lot::Mutex`]; safe to share
/// across tasks via `Arc`.
#[derive(Debug)]
pub struct ProbeCache {
    /// Memoized results.
    entries: Mutex<FxHashMap<Endpoint, CacheEntry>>,
    /// Entry lifetime; `None` means entries never expire.
    ttl: Option<Duration>,
}

impl ProbeCache {
    /// Creates a cache whose entries never expire.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(FxHashMap::default()),
            ttl: None,
        }
    }

    /// Creates a cache whose entries expire after `ttl`.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(FxHashMap::default()),
            ttl: Some(ttl),
        }
    }

    /// Looks up the memoized result for an endpoint.
    ///
    /// Returns `None` when the endpoint has not been probed yet or its
    /// entry has expired.
    #[must_use]
    pub fn lookup(&self, endpoint: &Endpoint) -> Option<bool> {
        let entries = self.entries.lock();
        let entry = entries.get(endpoint)?;

        if self.is_expired(entry) {
            trace!(%endpoint, "Cache entry expired");
            return None;
        }

        Some(entry.reachable)
    }

    /// Stores a probe result for an endpoint.
    ///
    /// First-writer-wins: an existing live entry is kept and the new result
    /// discarded. Expired entries are replaced.
    pub fn store(&self, endpoint: &Endpoint, reachable: bool) {
        let mut entries = self.entries.lock();

        if let Some(existing) = entries.get(endpoint)
            && !self.is_expired(existing)
        {
            trace!(%endpoint, existing = existing.reachable, "Probe result already cached");
            return;
        }

        debug!(%endpoint, reachable, "Probe result cached");
        entries.insert(
            endpoint.clone(),
            CacheEntry {
                reachable,
                stored_at: Instant::now(),
            },
        );
    }

    /// Returns the number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let entries = self.entries.lock();
        entries
            .values()
            .filter(|entry| !self.is_expired(entry))
            .count()
    }

    /// Returns `true` if the cache holds no live entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if an entry has outlived the configured TTL.
    fn is_expired(&self, entry: &CacheEntry) -> bool {
        self.ttl
            .is_some_and(|ttl| entry.stored_at.elapsed() >= ttl)
    }
}

impl Default for ProbeCache {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
