//! Endpoint discovery: reachability probes and their memoization.
//!
//! Given a navigated host and candidate port, this layer decides whether a
//! control endpoint answers there, at most once per `(host, port, secure)`
//! key for the run.
//!
//! # Discovery Flow
//!
//! ```text
//! ┌────────────┐  miss   ┌──────────┐  result  ┌────────────┐
//! │ ProbeCache │────────►│  Prober  │─────────►│ ProbeCache │
//! │  lookup    │         │ (2s race)│          │   store    │
//! └────────────┘         └──────────┘          └────────────┘
//!       │ hit                                  (first writer
//!       ▼                                          wins)
//!   cached result, no network activity
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `cache` | Write-once probe result memo with optional TTL |
//! | `probe` | One-shot WebSocket handshake probe with time bound |
//! | `discoverer` | Cache-or-probe orchestration |

// ============================================================================
// Submodules
// ============================================================================

/// Write-once probe result memo.
pub mod cache;

/// Cache-or-probe orchestration.
pub mod discoverer;

/// One-shot reachability probes.
pub mod probe;

// ============================================================================
// Re-exports
// ============================================================================

pub use cache::ProbeCache;
pub use discoverer::Discoverer;
pub use probe::{DEFAULT_PROBE_TIMEOUT, Prober, WsProber};
