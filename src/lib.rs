//! Frequency Link - endpoint discovery and frequency relay.
//!
//! This library bridges browser navigation events to a separately running
//! radio-control server (an FM-DX webserver): when a visited address
//! carries a frequency value, the value is extracted, a control endpoint
//! is discovered at the navigated host, and the frequency is relayed as a
//! `T<kilohertz>` command over a short-lived WebSocket connection.
//!
//! # Architecture
//!
//! One navigation event flows through three layers:
//!
//! - **Extraction**: pull a decimal MHz value out of the URL with a
//!   tolerant, locale-aware grammar (`?f=106,4`, `/f=106.4`, `#freq=87`)
//! - **Discovery**: check once per `(host, port, secure)` whether the
//!   well-known `/text` WebSocket path answers, memoized for the run
//! - **Relay**: keep the most recently confirmed endpoint and deliver the
//!   frequency over a transient connection, fire-and-forget
//!
//! Key design principles:
//!
//! - All shared state (probe cache, confirmed endpoint) lives in one
//!   [`FrequencyLink`] service object, never in ambient globals
//! - Probe results are write-once per run; confirmation is last-write-wins
//! - Failures are swallowed and logged; the pipeline is best-effort and
//!   silent by design
//!
//! # Quick Start
//!
//! ```no_run
//! use frequency_link::{FrequencyLink, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let link = FrequencyLink::builder().build();
//!
//!     // One call per completed navigation, URL as the browser saw it.
//!     let report = link.handle_navigation("https://example.org:8080/?f=98,0").await?;
//!
//!     if report.delivered() {
//!         println!("tuned {} via {}", report.frequency.unwrap(), report.endpoint);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`frequency`] | URL grammar and [`FrequencyValue`] |
//! | [`endpoint`] | Control endpoint addressing |
//! | [`discovery`] | Reachability probes and their memoization |
//! | [`relay`] | Confirmed-endpoint state machine and delivery |
//! | [`link`] | Frequency link injection (producer side) |
//! | [`service`] | The owning [`FrequencyLink`] service |
//! | [`error`] | Error types and [`Result`] alias |

// ============================================================================
// Modules
// ============================================================================

/// Endpoint discovery: reachability probes and their memoization.
pub mod discovery;

/// Control endpoint addressing.
pub mod endpoint;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Frequency extraction from navigated URLs.
pub mod frequency;

/// Frequency link injection.
///
/// Turns frequency-looking page text into link targets that manufacture
/// navigation events for the core pipeline.
pub mod link;

/// Relay session management.
pub mod relay;

/// The owning service and per-navigation orchestration.
pub mod service;

// ============================================================================
// Re-exports
// ============================================================================

// Service types
pub use service::{FrequencyLink, FrequencyLinkBuilder, NavigationReport};

// Core data types
pub use endpoint::Endpoint;
pub use frequency::{FrequencyValue, extract};

// Discovery types
pub use discovery::{Discoverer, ProbeCache, Prober, WsProber};

// Relay types
pub use relay::{DeliveryOutcome, DeliverySink, RelayManager, RelayState, WsDeliverySink};

// Link injection types
pub use link::{FrequencyLinker, LinkSpan};

// Error types
pub use error::{Error, Result};
