//! Relay session management.
//!
//! Holds the single most-recently-confirmed control endpoint and delivers
//! frequency commands to it over short-lived connections. The connection is
//! never reused or kept alive: one frame per delivery, then close.
//!
//! # State Machine
//!
//! ```text
//!            confirm(ep)                 deliver(f)
//!   ┌──────┐ ──────────► ┌───────────┐ ──────────► ┌────────────┐
//!   │ Idle │             │ Confirmed │             │ Delivering │
//!   └──────┘             └───────────┘ ◄────────── └────────────┘
//!      │                      ▲          send done
//!      │ deliver(f)           │ confirm(ep') overwrites
//!      ▼                      │ unconditionally
//!   NoEndpoint           (last-write-wins)
//! ```
//!
//! Confirmation is last-write-wins, unlike the probe cache: the manager
//! always trusts the most recent navigation's success, never the oldest.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::SinkExt;
use parking_lot::Mutex;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, trace};

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::frequency::FrequencyValue;

// ============================================================================
// RelayState
// ============================================================================

/// Tagged state of the relay session manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayState {
    /// No endpoint has answered yet; deliveries are no-ops.
    Idle,
    /// An endpoint is known to have answered at least once.
    Confirmed(Endpoint),
    /// A send to the endpoint is in flight.
    Delivering(Endpoint),
}

impl RelayState {
    /// Returns the endpoint held by this state, if any.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> Option<&Endpoint> {
        match self {
            Self::Idle => None,
            Self::Confirmed(ep) | Self::Delivering(ep) => Some(ep),
        }
    }
}

// ============================================================================
// DeliveryOutcome
// ============================================================================

/// Observable result of a delivery attempt that did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// One frame was sent over a transient connection, now closed.
    Sent {
        /// Endpoint the frame was delivered to.
        endpoint: Endpoint,
        /// The exact frame sent, e.g. `T98000`.
        frame: String,
    },
    /// No confirmed endpoint yet; nothing to deliver.
    ///
    /// A soft no-op, not an error.
    NoEndpoint,
}

// ============================================================================
// DeliverySink
// ============================================================================

/// Transport seam for a single fire-and-forget frame.
///
/// The production implementation is [`WsDeliverySink`]; tests substitute
/// recording doubles to drive the state machine without network.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    /// Opens a transient connection, sends `frame` once, and closes the
    /// connection unconditionally.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] or [`Error::WebSocket`] when the
    /// connection cannot be opened or the send fails. No acknowledgment is
    /// expected or consumed.
    async fn send(&self, endpoint: &Endpoint, frame: &str) -> Result<()>;
}

// ============================================================================
// WsDeliverySink
// ============================================================================

/// Delivery over a freshly opened WebSocket connection.
#[derive(Debug, Clone, Default)]
pub struct WsDeliverySink;

#[async_trait]
impl DeliverySink for WsDeliverySink {
    async fn send(&self, endpoint: &Endpoint, frame: &str) -> Result<()> {
        let ws_url = endpoint.ws_url();
        trace!(%ws_url, frame, "Opening transient delivery connection");

        let (mut stream, _response) = connect_async(ws_url.as_str())
            .await
            .map_err(|e| Error::connection(e.to_string()))?;

        let sent = stream
            .send(Message::Text(frame.to_owned().into()))
            .await
            .map_err(Error::from);

        // Close regardless of send outcome; the connection is single-use.
        let _ = stream.close(None).await;

        sent
    }
}

// ============================================================================
// RelayManager
// ============================================================================

/// Owns the confirmed endpoint and performs deliveries to it.
///
/// # Thread Safety
///
/// State lives behind a [`parking_lot::Mutex`]; the manager is shared
/// across tasks via `Arc` or borrowed references.
pub struct RelayManager {
    /// Current session state.
    state: Mutex<RelayState>,
    /// Frame transport.
    sink: Arc<dyn DeliverySink>,
}

impl RelayManager {
    /// Creates a manager in the [`RelayState::Idle`] state.
    #[must_use]
    pub fn new(sink: Arc<dyn DeliverySink>) -> Self {
        Self {
            state: Mutex::new(RelayState::Idle),
            sink,
        }
    }

    /// Returns a snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> RelayState {
        self.state.lock().clone()
    }

    /// Returns the currently confirmed endpoint, if any.
    #[must_use]
    pub fn confirmed(&self) -> Option<Endpoint> {
        self.state.lock().endpoint().cloned()
    }

    /// Confirms an endpoint as the delivery target.
    ///
    /// Always overwrites: a later success on a different host replaces the
    /// stored endpoint (last-write-wins). The endpoint is never cleared,
    /// only replaced, for the lifetime of the manager.
    pub fn confirm(&self, endpoint: Endpoint) {
        let mut state = self.state.lock();
        match &*state {
            RelayState::Idle => info!(%endpoint, "Control endpoint confirmed"),
            previous => {
                if previous.endpoint() != Some(&endpoint) {
                    info!(%endpoint, ?previous, "Confirmed endpoint replaced");
                }
            }
        }
        *state = RelayState::Confirmed(endpoint);
    }

    /// Delivers a frequency command to the confirmed endpoint.
    ///
    /// While idle this is a soft no-op reporting
    /// [`DeliveryOutcome::NoEndpoint`]. Otherwise exactly one transient
    /// connection is opened, one `T<kilohertz>` frame sent, and the
    /// connection closed. A failed send is not retried; the endpoint stays
    /// confirmed for the next attempt.
    ///
    /// # Errors
    ///
    /// Propagates the sink's connection or send error.
    pub async fn deliver(&self, frequency: FrequencyValue) -> Result<DeliveryOutcome> {
        let endpoint = {
            let mut state = self.state.lock();
            match state.endpoint().cloned() {
                None => {
                    debug!(%frequency, "No confirmed endpoint, nothing to deliver");
                    return Ok(DeliveryOutcome::NoEndpoint);
                }
                Some(endpoint) => {
                    *state = RelayState::Delivering(endpoint.clone());
                    endpoint
                }
            }
        };

        let frame = frequency.command();
        debug!(%endpoint, frame, "Delivering frequency");

        let sent = self.sink.send(&endpoint, &frame).await;

        {
            // Restore Confirmed unless a newer confirmation landed while
            // the send was in flight.
            let mut state = self.state.lock();
            if *state == RelayState::Delivering(endpoint.clone()) {
                *state = RelayState::Confirmed(endpoint.clone());
            }
        }

        sent?;
        Ok(DeliveryOutcome::Sent { endpoint, frame })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use tokio::sync::Notify;

    /// Recording sink with optional scripted failure and send gating.
    struct RecordingSink {
        sent: Mutex<Vec<(Endpoint, String)>>,
        fail: bool,
        gate: Option<Arc<Notify>>,
    }

    impl RecordingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                fail: false,
                gate: None,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                fail: true,
                gate: None,
            })
        }

        fn gated(gate: Arc<Notify>) -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                fail: false,
                gate: Some(gate),
            })
        }

        fn sent(&self) -> Vec<(Endpoint, String)> {
            self.sent.lock().clone()
        }
    }

    #[async_trait]
    impl DeliverySink for RecordingSink {
        async fn send(&self, endpoint: &Endpoint, frame: &str) -> Result<()> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.sent.lock().push((endpoint.clone(), frame.to_owned()));
            if self.fail {
                return Err(Error::connection("refused"));
            }
            Ok(())
        }
    }

    fn freq(mhz: f64) -> FrequencyValue {
        FrequencyValue::from_mhz(mhz).unwrap()
    }

    #[tokio::test]
    async fn test_deliver_while_idle_is_noop() {
        let sink = RecordingSink::new();
        let manager = RelayManager::new(sink.clone());

        let outcome = manager.deliver(freq(98.0)).await.unwrap();

        assert_eq!(outcome, DeliveryOutcome::NoEndpoint);
        assert!(sink.sent().is_empty());
        assert_eq!(manager.state(), RelayState::Idle);
    }

    #[tokio::test]
    async fn test_deliver_while_confirmed_sends_one_frame() {
        let sink = RecordingSink::new();
        let manager = RelayManager::new(sink.clone());
        let endpoint = Endpoint::new("example.org", 8080, false);

        manager.confirm(endpoint.clone());
        let outcome = manager.deliver(freq(87.7)).await.unwrap();

        assert_eq!(
            outcome,
            DeliveryOutcome::Sent {
                endpoint: endpoint.clone(),
                frame: "T87700".to_owned(),
            }
        );
        assert_eq!(sink.sent(), vec![(endpoint.clone(), "T87700".to_owned())]);
        assert_eq!(manager.state(), RelayState::Confirmed(endpoint));
    }

    #[tokio::test]
    async fn test_confirm_is_last_write_wins() {
        let manager = RelayManager::new(RecordingSink::new());
        let a = Endpoint::new("a.example", 8080, false);
        let b = Endpoint::new("b.example", 8080, false);

        manager.confirm(a);
        manager.confirm(b.clone());

        assert_eq!(manager.confirmed(), Some(b));
    }

    #[tokio::test]
    async fn test_failed_send_is_not_retried_and_keeps_endpoint() {
        let sink = RecordingSink::failing();
        let manager = RelayManager::new(sink.clone());
        let endpoint = Endpoint::new("example.org", 8080, false);

        manager.confirm(endpoint.clone());
        let err = manager.deliver(freq(98.0)).await.unwrap_err();

        assert!(err.is_connection_error());
        // Exactly one attempt, endpoint still confirmed for the next one.
        assert_eq!(sink.sent().len(), 1);
        assert_eq!(manager.confirmed(), Some(endpoint));
    }

    #[tokio::test]
    async fn test_confirm_during_delivery_wins() {
        let gate = Arc::new(Notify::new());
        let sink = RecordingSink::gated(gate.clone());
        let manager = Arc::new(RelayManager::new(sink));
        let a = Endpoint::new("a.example", 8080, false);
        let b = Endpoint::new("b.example", 8080, false);

        manager.confirm(a.clone());

        let delivering = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.deliver(freq(98.0)).await })
        };

        // Wait for the send to be in flight, then confirm a newer endpoint.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(manager.state(), RelayState::Delivering(a));
        manager.confirm(b.clone());

        gate.notify_one();
        delivering.await.unwrap().unwrap();

        // The in-flight delivery must not clobber the newer confirmation.
        assert_eq!(manager.confirmed(), Some(b));
    }

    #[tokio::test]
    async fn test_frame_format_rounds_to_khz() {
        let sink = RecordingSink::new();
        let manager = RelayManager::new(sink.clone());
        manager.confirm(Endpoint::new("example.org", 8080, false));

        manager.deliver(freq(106.4)).await.unwrap();

        assert_eq!(sink.sent()[0].1, "T106400");
    }
}
