//! Control endpoint addressing.
//!
//! A control endpoint is a `(host, port, secure)` triple believed to run a
//! command-receiving service behind the well-known `/text` WebSocket path.
//! The triple is both the probe cache key and the delivery target: secure
//! and insecure probes on the same host and port are distinct entries.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Well-known path of the control service's WebSocket listener.
pub const CONTROL_PATH: &str = "/text";

/// Default control port when a securely loaded page carries no explicit port.
pub const DEFAULT_SECURE_PORT: u16 = 443;

/// Default control port when an insecurely loaded page carries no explicit port.
pub const DEFAULT_INSECURE_PORT: u16 = 80;

// ============================================================================
// Endpoint
// ============================================================================

/// Address of a candidate control endpoint.
///
/// Equality covers all three fields; the probe cache and the relay manager
/// both key on the full triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    /// Hostname of the navigated page.
    pub host: String,
    /// Candidate control port.
    pub port: u16,
    /// Whether to probe over `wss` (page was loaded securely) or `ws`.
    pub secure: bool,
}

impl Endpoint {
    /// Creates an endpoint from its parts.
    #[inline]
    pub fn new(host: impl Into<String>, port: u16, secure: bool) -> Self {
        Self {
            host: host.into(),
            port,
            secure,
        }
    }

    /// Derives the candidate endpoint from a navigated page URL.
    ///
    /// The secure flag mirrors the page's scheme (`https`/`wss` probe over
    /// `wss`, everything else over `ws`). When the URL carries no explicit
    /// port, the default likewise mirrors the scheme: [`DEFAULT_SECURE_PORT`]
    /// for secure pages, [`DEFAULT_INSECURE_PORT`] otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingHost`] for URLs without a host component
    /// (`about:blank`, `file:///...`).
    pub fn from_navigated(url: &Url) -> Result<Self> {
        let host = url
            .host_str()
            .ok_or_else(|| Error::missing_host(url.as_str()))?;

        let secure = matches!(url.scheme(), "https" | "wss");
        let port = url.port().unwrap_or(if secure {
            DEFAULT_SECURE_PORT
        } else {
            DEFAULT_INSECURE_PORT
        });

        Ok(Self::new(host, port, secure))
    }

    /// Returns the WebSocket URL of the control path.
    ///
    /// Format: `ws://host:port/text` or `wss://host:port/text`.
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{scheme}://{}:{}{CONTROL_PATH}", self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)?;
        if self.secure {
            write!(f, " (secure)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
