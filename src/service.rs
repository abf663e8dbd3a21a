//! The owning service: per-navigation orchestration.
//!
//! [`FrequencyLink`] is constructed once per process and owns all shared
//! state (probe cache, confirmed endpoint) as fields rather than ambient
//! globals, so tests can build isolated instances and control scheduling.
//!
//! # Per-Navigation Flow
//!
//! ```text
//! navigation(url)
//!   ├─ extract frequency ──► deliver via currently confirmed endpoint
//!   │                         (does not wait for discovery)
//!   └─ discover(host, port, secure)
//!        └─ reachable ──► confirm (last-write-wins)
//!                          └─ frequency found? ──► deliver again to the
//!                                                  refreshed endpoint
//! ```
//!
//! The second delivery covers the first-ever visit to a host: nothing was
//! confirmed when the immediate delivery ran, so it was a no-op, and the
//! refreshed delivery is the one that lands. Sending the same frequency
//! twice is tolerated by the control server.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use url::Url;

use crate::discovery::{Discoverer, ProbeCache, Prober, WsProber};
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::frequency::{self, FrequencyValue};
use crate::relay::{DeliveryOutcome, DeliverySink, RelayManager, WsDeliverySink};

// ============================================================================
// NavigationReport
// ============================================================================

/// What a single navigation event caused.
///
/// Returned so the orchestration's interleavings are observable in tests
/// and logs; embedders are free to ignore it.
#[derive(Debug, Clone)]
pub struct NavigationReport {
    /// Endpoint derived from the navigated URL.
    pub endpoint: Endpoint,
    /// Frequency extracted from the URL, if any.
    pub frequency: Option<FrequencyValue>,
    /// Whether the navigated endpoint answered (possibly from cache).
    pub reachable: bool,
    /// Delivery attempts in the order they completed.
    pub deliveries: Vec<DeliveryOutcome>,
}

impl NavigationReport {
    /// Returns `true` if at least one frame was actually sent.
    #[must_use]
    pub fn delivered(&self) -> bool {
        self.deliveries
            .iter()
            .any(|outcome| matches!(outcome, DeliveryOutcome::Sent { .. }))
    }
}

// ============================================================================
// FrequencyLink
// ============================================================================

/// Bridges navigation events to a radio-control endpoint.
///
/// Construct once via [`FrequencyLink::builder()`] and feed it one
/// [`handle_navigation`] call per completed page load.
///
/// [`handle_navigation`]: FrequencyLink::handle_navigation
///
/// # Example
///
/// ```no_run
/// use frequency_link::{FrequencyLink, Result};
///
/// # async fn example() -> Result<()> {
/// let link = FrequencyLink::builder().build();
///
/// let report = link.handle_navigation("https://example.org:8080/?f=98,0").await?;
/// if report.delivered() {
///     println!("tuned to {}", report.frequency.unwrap());
/// }
/// # Ok(())
/// # }
/// ```
pub struct FrequencyLink {
    /// Cache-or-probe reachability resolution.
    discoverer: Discoverer,
    /// Confirmed endpoint and delivery state machine.
    relay: RelayManager,
}

impl FrequencyLink {
    /// Returns a builder with default configuration.
    #[inline]
    #[must_use]
    pub fn builder() -> FrequencyLinkBuilder {
        FrequencyLinkBuilder::new()
    }

    /// Returns the currently confirmed endpoint, if any.
    #[inline]
    #[must_use]
    pub fn confirmed_endpoint(&self) -> Option<Endpoint> {
        self.relay.confirmed()
    }

    /// Returns the shared probe cache.
    #[inline]
    #[must_use]
    pub fn probe_cache(&self) -> &Arc<ProbeCache> {
        self.discoverer.cache()
    }

    /// Delivers a frequency to the confirmed endpoint, bypassing discovery.
    ///
    /// # Errors
    ///
    /// Propagates the delivery connection error.
    pub async fn deliver(&self, frequency: FrequencyValue) -> Result<DeliveryOutcome> {
        self.relay.deliver(frequency).await
    }

    /// Handles one navigation-completed event.
    ///
    /// Extracts a frequency (if any), delivers it immediately with whatever
    /// endpoint is currently confirmed, then discovers the navigated
    /// endpoint and, on success, confirms it and delivers again.
    ///
    /// Probe and delivery failures are swallowed (logged, reflected in the
    /// report); the system is best-effort and silent by design.
    ///
    /// # Errors
    ///
    /// Only URL-level problems surface: [`Error::InvalidUrl`] for an
    /// unparseable URL and [`Error::MissingHost`] for one without a host.
    ///
    /// [`Error::InvalidUrl`]: crate::Error::InvalidUrl
    /// [`Error::MissingHost`]: crate::Error::MissingHost
    pub async fn handle_navigation(&self, url: &str) -> Result<NavigationReport> {
        let parsed = Url::parse(url)?;
        let endpoint = Endpoint::from_navigated(&parsed)?;
        let frequency = frequency::extract(url);

        debug!(%endpoint, frequency = ?frequency.map(|f| f.to_string()), url, "Navigation");

        let mut deliveries = Vec::new();

        // Immediate attempt with the previously confirmed endpoint; do not
        // block on discovery of the navigated one.
        if let Some(freq) = frequency {
            self.try_deliver(freq, &mut deliveries).await;
        }

        let reachable = self.discoverer.discover(&endpoint).await;

        if reachable {
            self.relay.confirm(endpoint.clone());

            // Refreshed attempt: covers the first visit to a host, where
            // the immediate attempt found nothing confirmed.
            if let Some(freq) = frequency {
                self.try_deliver(freq, &mut deliveries).await;
            }
        }

        Ok(NavigationReport {
            endpoint,
            frequency,
            reachable,
            deliveries,
        })
    }

    /// Runs one delivery attempt, swallowing connection failures.
    async fn try_deliver(&self, frequency: FrequencyValue, deliveries: &mut Vec<DeliveryOutcome>) {
        match self.relay.deliver(frequency).await {
            Ok(outcome) => deliveries.push(outcome),
            Err(e) => warn!(%frequency, error = %e, "Delivery failed"),
        }
    }
}

// ============================================================================
// FrequencyLinkBuilder
// ============================================================================

/// Builder for configuring a [`FrequencyLink`] instance.
///
/// All settings have working defaults; `build()` cannot fail.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use frequency_link::FrequencyLink;
///
/// let link = FrequencyLink::builder()
///     .probe_timeout(Duration::from_secs(1))
///     .cache_ttl(Duration::from_secs(300))
///     .build();
/// ```
#[derive(Default)]
pub struct FrequencyLinkBuilder {
    /// Probe time bound; `None` means the prober default.
    probe_timeout: Option<Duration>,
    /// Probe cache TTL; `None` means entries never expire.
    cache_ttl: Option<Duration>,
    /// Prober override for tests.
    prober: Option<Arc<dyn Prober>>,
    /// Delivery sink override for tests.
    sink: Option<Arc<dyn DeliverySink>>,
}

impl FrequencyLinkBuilder {
    /// Creates a builder with default configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reachability probe time bound (default 2 s).
    #[inline]
    #[must_use]
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = Some(timeout);
        self
    }

    /// Sets a TTL on probe cache entries.
    ///
    /// Without a TTL a host whose control server restarts on a different
    /// port stays marked unreachable for the rest of the session.
    #[inline]
    #[must_use]
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Replaces the reachability prober.
    #[inline]
    #[must_use]
    pub fn prober(mut self, prober: Arc<dyn Prober>) -> Self {
        self.prober = Some(prober);
        self
    }

    /// Replaces the delivery sink.
    #[inline]
    #[must_use]
    pub fn delivery_sink(mut self, sink: Arc<dyn DeliverySink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Builds the service.
    #[must_use]
    pub fn build(self) -> FrequencyLink {
        let cache = Arc::new(match self.cache_ttl {
            Some(ttl) => ProbeCache::with_ttl(ttl),
            None => ProbeCache::new(),
        });

        let prober = self.prober.unwrap_or_else(|| {
            let ws = match self.probe_timeout {
                Some(timeout) => WsProber::new(timeout),
                None => WsProber::default(),
            };
            Arc::new(ws) as Arc<dyn Prober>
        });

        let sink = self
            .sink
            .unwrap_or_else(|| Arc::new(WsDeliverySink) as Arc<dyn DeliverySink>);

        FrequencyLink {
            discoverer: Discoverer::new(cache, prober),
            relay: RelayManager::new(sink),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use futures_util::StreamExt;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;
    use tokio_tungstenite::tungstenite::Message;

    use crate::error::Error;

    /// Spawns an in-process control server that records received text
    /// frames, mirroring the real webserver's `/text` listener.
    async fn spawn_control_server() -> (u16, mpsc::UnboundedReceiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let tx = tx.clone();
                tokio::spawn(async move {
                    let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                        return;
                    };
                    while let Some(Ok(message)) = ws.next().await {
                        if let Message::Text(text) = message {
                            let _ = tx.send(text.to_string());
                        }
                    }
                });
            }
        });

        (port, rx)
    }

    /// Port that is bound and immediately released, so nothing listens.
    async fn dead_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        port
    }

    #[tokio::test]
    async fn test_first_navigation_discovers_and_delivers() {
        let (port, mut rx) = spawn_control_server().await;
        let link = FrequencyLink::builder().build();

        let report = link
            .handle_navigation(&format!("http://127.0.0.1:{port}/?f=98,0"))
            .await
            .unwrap();

        assert!(report.reachable);
        assert_eq!(report.frequency.unwrap().mhz(), 98.0);
        // First attempt ran while idle, the refreshed one landed.
        assert_eq!(report.deliveries[0], DeliveryOutcome::NoEndpoint);
        assert!(report.delivered());

        assert_eq!(rx.recv().await.unwrap(), "T98000");
        assert_eq!(
            link.confirmed_endpoint(),
            Some(Endpoint::new("127.0.0.1", port, false))
        );
    }

    #[tokio::test]
    async fn test_navigation_without_frequency_only_discovers() {
        let (port, mut rx) = spawn_control_server().await;
        let link = FrequencyLink::builder().build();

        let report = link
            .handle_navigation(&format!("http://127.0.0.1:{port}/stations"))
            .await
            .unwrap();

        assert!(report.reachable);
        assert!(report.frequency.is_none());
        assert!(report.deliveries.is_empty());

        // Endpoint confirmed for later navigations, but nothing sent.
        assert!(link.confirmed_endpoint().is_some());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unreachable_host_confirms_nothing() {
        let port = dead_port().await;
        let link = FrequencyLink::builder()
            .probe_timeout(Duration::from_millis(500))
            .build();

        let report = link
            .handle_navigation(&format!("http://127.0.0.1:{port}/?f=98,0"))
            .await
            .unwrap();

        assert!(!report.reachable);
        assert_eq!(report.deliveries, vec![DeliveryOutcome::NoEndpoint]);
        assert!(link.confirmed_endpoint().is_none());
    }

    #[tokio::test]
    async fn test_second_navigation_uses_cache() {
        let (port, _rx) = spawn_control_server().await;
        let link = FrequencyLink::builder().build();
        let url = format!("http://127.0.0.1:{port}/stations");

        link.handle_navigation(&url).await.unwrap();
        assert_eq!(link.probe_cache().len(), 1);

        // Cached short-circuit; still reachable, still one entry.
        let report = link.handle_navigation(&url).await.unwrap();
        assert!(report.reachable);
        assert_eq!(link.probe_cache().len(), 1);
    }

    #[tokio::test]
    async fn test_confirmed_endpoint_is_last_navigation() {
        let (port_a, _rx_a) = spawn_control_server().await;
        let (port_b, _rx_b) = spawn_control_server().await;
        let link = FrequencyLink::builder().build();

        link.handle_navigation(&format!("http://127.0.0.1:{port_a}/"))
            .await
            .unwrap();
        link.handle_navigation(&format!("http://127.0.0.1:{port_b}/"))
            .await
            .unwrap();

        // Last-write-wins for confirmation...
        assert_eq!(
            link.confirmed_endpoint(),
            Some(Endpoint::new("127.0.0.1", port_b, false))
        );
        // ...while the first probe result stays cached as reachable.
        assert_eq!(
            link.probe_cache()
                .lookup(&Endpoint::new("127.0.0.1", port_a, false)),
            Some(true)
        );
    }

    #[tokio::test]
    async fn test_frequency_from_earlier_host_delivered_before_discovery() {
        let (port_a, mut rx_a) = spawn_control_server().await;
        let port_b = dead_port().await;
        let link = FrequencyLink::builder()
            .probe_timeout(Duration::from_millis(500))
            .build();

        // Confirm A first.
        link.handle_navigation(&format!("http://127.0.0.1:{port_a}/"))
            .await
            .unwrap();

        // Navigate to unreachable B carrying a frequency: the immediate
        // attempt still lands on A.
        let report = link
            .handle_navigation(&format!("http://127.0.0.1:{port_b}/?f=106,4"))
            .await
            .unwrap();

        assert!(!report.reachable);
        assert!(report.delivered());
        assert_eq!(rx_a.recv().await.unwrap(), "T106400");
    }

    #[tokio::test]
    async fn test_invalid_url_is_an_error() {
        let link = FrequencyLink::builder().build();

        assert!(matches!(
            link.handle_navigation("not a url").await,
            Err(Error::InvalidUrl(_))
        ));
        assert!(matches!(
            link.handle_navigation("about:blank").await,
            Err(Error::MissingHost { .. })
        ));
    }

    #[tokio::test]
    async fn test_end_to_end_scenario_from_readme() {
        // navigate to http://127.0.0.1:<port>/?f=98,0 where the endpoint is
        // reachable: extractor yields 98.0, discoverer confirms on first
        // probe, relay sends T98000 and closes.
        let (port, mut rx) = spawn_control_server().await;
        let link = FrequencyLink::builder().build();

        let report = link
            .handle_navigation(&format!("http://127.0.0.1:{port}/?f=98,0"))
            .await
            .unwrap();

        assert_eq!(report.frequency.unwrap().command(), "T98000");
        assert!(report.reachable);
        assert_eq!(rx.recv().await.unwrap(), "T98000");

        // A follow-up delivery reuses the confirmed endpoint directly.
        let outcome = link
            .deliver(FrequencyValue::from_mhz(87.7).unwrap())
            .await
            .unwrap();
        assert!(matches!(outcome, DeliveryOutcome::Sent { .. }));
        assert_eq!(rx.recv().await.unwrap(), "T87700");
    }
}
