//! Error types for Frequency Link.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use frequency_link::{Result, FrequencyLink};
//!
//! async fn example(link: &FrequencyLink) -> Result<()> {
//!     let report = link.handle_navigation("https://example.org/?f=98,0").await?;
//!     println!("reachable: {}", report.reachable);
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Navigation | [`Error::InvalidUrl`], [`Error::MissingHost`] |
//! | Probe | [`Error::ProbeTimeout`], [`Error::Connection`] |
//! | Delivery | [`Error::Connection`], [`Error::ConnectionClosed`] |
//! | External | [`Error::Io`], [`Error::WebSocket`] |
//!
//! Two outcomes are deliberately NOT errors: a URL with no extractable
//! frequency (`extract` returns `None`) and a delivery attempted before any
//! endpoint has been confirmed ([`DeliveryOutcome::NoEndpoint`]). Both are
//! normal, expected results of best-effort operation.
//!
//! [`DeliveryOutcome::NoEndpoint`]: crate::relay::DeliveryOutcome::NoEndpoint

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging. All variants are
/// swallowed by the navigation handler (logged, never fatal); they surface
/// only through the lower-level APIs.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Navigation Errors
    // ========================================================================
    /// Navigated URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Navigated URL has no host component.
    ///
    /// Returned for URLs such as `file:///...` or `about:blank` where no
    /// control endpoint can be derived.
    #[error("URL has no host: {url}")]
    MissingHost {
        /// The offending URL.
        url: String,
    },

    // ========================================================================
    // Probe / Delivery Errors
    // ========================================================================
    /// Connection attempt failed.
    ///
    /// Covers both probe handshakes and transient delivery connections.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Reachability probe exceeded its time bound.
    ///
    /// Treated identically to an explicit connection refusal: the endpoint
    /// is recorded as unreachable.
    #[error("Probe timed out after {timeout_ms}ms")]
    ProbeTimeout {
        /// Milliseconds waited before giving up.
        timeout_ms: u64,
    },

    /// Connection closed before the payload could be sent.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a probe timeout error.
    #[inline]
    pub fn probe_timeout(timeout_ms: u64) -> Self {
        Self::ProbeTimeout { timeout_ms }
    }

    /// Creates a missing host error.
    #[inline]
    pub fn missing_host(url: impl Into<String>) -> Self {
        Self::MissingHost { url: url.into() }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ProbeTimeout { .. })
    }

    /// Returns `true` if this is a connection-level error.
    ///
    /// Probe timeouts count: the discoverer treats them the same as an
    /// explicit refusal.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ProbeTimeout { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
