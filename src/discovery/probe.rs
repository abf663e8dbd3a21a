//! One-shot reachability probes.
//!
//! A probe attempts the WebSocket open handshake against the control
//! path ([`CONTROL_PATH`]) and closes immediately on success; no data is
//! exchanged beyond the handshake. The attempt races a fixed timeout, and
//! timeout is treated the same as an explicit refusal.
//!
//! [`CONTROL_PATH`]: crate::endpoint::CONTROL_PATH

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tracing::{debug, trace};

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default time bound for a reachability probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

// ============================================================================
// Prober Trait
// ============================================================================

/// One-shot reachability check against a control endpoint.
///
/// The production implementation is [`WsProber`]; tests substitute doubles
/// to control scheduling and count probe attempts.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Checks whether the endpoint answers the open handshake.
    ///
    /// # Errors
    ///
    /// - [`Error::ProbeTimeout`] when neither open nor error fires in time
    /// - [`Error::Connection`] on an explicit lower-layer failure
    async fn probe(&self, endpoint: &Endpoint) -> Result<()>;
}

// ============================================================================
// WsProber
// ============================================================================

/// WebSocket handshake prober.
///
/// Opens `ws(s)://host:port/text` and closes as soon as the handshake
/// completes. When the timeout fires first, the pending connect future is
/// dropped, which tears down the half-open attempt.
#[derive(Debug, Clone)]
pub struct WsProber {
    /// Time bound for the whole handshake.
    timeout: Duration,
}

impl WsProber {
    /// Creates a prober with the given time bound.
    #[inline]
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Returns the configured time bound.
    #[inline]
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for WsProber {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

#[async_trait]
impl Prober for WsProber {
    async fn probe(&self, endpoint: &Endpoint) -> Result<()> {
        let ws_url = endpoint.ws_url();
        trace!(%ws_url, "Probing control endpoint");

        match timeout(self.timeout, connect_async(ws_url.as_str())).await {
            Ok(Ok((mut stream, _response))) => {
                debug!(%ws_url, "Control endpoint answered");
                // Handshake success is the sole reachability signal.
                let _ = stream.close(None).await;
                Ok(())
            }
            Ok(Err(e)) => {
                debug!(%ws_url, error = %e, "Control endpoint refused");
                Err(Error::connection(e.to_string()))
            }
            Err(_) => {
                debug!(%ws_url, timeout_ms = self.timeout.as_millis() as u64, "Probe timed out");
                Err(Error::probe_timeout(self.timeout.as_millis() as u64))
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Instant;

    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_probe_open_server_is_reachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(tokio_tungstenite::accept_async(stream));
            }
        });

        let prober = WsProber::default();
        let endpoint = Endpoint::new("127.0.0.1", port, false);
        assert!(prober.probe(&endpoint).await.is_ok());
    }

    #[tokio::test]
    async fn test_probe_refused_port_is_unreachable() {
        // Bind then drop to get a port with no listener.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let prober = WsProber::default();
        let endpoint = Endpoint::new("127.0.0.1", port, false);

        let err = prober.probe(&endpoint).await.unwrap_err();
        assert!(err.is_connection_error());
    }

    #[tokio::test]
    async fn test_probe_stalled_handshake_times_out() {
        // Listener that never accepts: the TCP connect lands in the backlog
        // but the WebSocket handshake never completes.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let prober = WsProber::new(Duration::from_millis(200));
        let endpoint = Endpoint::new("127.0.0.1", port, false);

        let started = Instant::now();
        let err = prober.probe(&endpoint).await.unwrap_err();

        assert!(err.is_timeout());
        // Resolved by the bound, not by a hanging connection attempt.
        assert!(started.elapsed() < Duration::from_secs(2));
        drop(listener);
    }
}
