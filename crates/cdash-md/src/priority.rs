//! Priority fallback client.
//!
//! Holds an ordered list of named data-source endpoints. A fetch walks the
//! list in ascending priority, racing each handler against its own timeout,
//! and returns the first success together with its provenance. Attempts are
//! strictly sequential: endpoint N+1 starts only after endpoint N has failed
//! or timed out.
//!
//! ```text
//! fetch_crypto_data(params)
//!   ├─ [p=1] CoinGecko         ── error / timeout ──┐
//!   ├─ [p=2] Scraping-Fallback ◄────────────────────┘ ── Ok(data) ──► FetchResult
//!   └─ [p=3] ...               (not attempted)
//! ```
//!
//! # Timeouts and cancellation
//!
//! Each attempt runs under [`tokio::time::timeout`]. Whichever side settles
//! first wins and the other is dropped, so no timer outlives its attempt. On
//! timeout the handler future is dropped (it stops at its next await point)
//! and the attempt's [`CancelSignal`] fires, letting handlers that detached
//! work into spawned tasks wind it down. Detached work that ignores the
//! signal keeps running until it finishes on its own.
//!
//! # Setup
//!
//! Endpoints are registered through `&mut self` before the client is shared
//! (typically behind `Arc`); there is no removal and no mutation during
//! queries. Nothing is cached: every call starts again from the top of the
//! list.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cdash_core::config::DEFAULT_TIMEOUT_MS;
use cdash_core::time_util;
use cdash_core::{CanonicalCurrency, FetchResult, MarketDataParams};
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Handler contract
// ---------------------------------------------------------------------------

/// Cancellation signal handed to every endpoint attempt.
///
/// Fires when the attempt times out. Dropping the attempt without firing
/// (success, failure) leaves the signal permanently un-cancelled.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    /// A signal that never fires, for invoking handlers outside the client.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the attempt has been cancelled.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Sender gone without cancelling: never resolves.
                std::future::pending::<()>().await;
            }
        }
    }
}

/// A data-source endpoint handler.
///
/// Fetches raw provider data for `params` and returns canonical records
/// (normally by running the provider payload through a normalizer). The
/// client treats handlers as black boxes.
#[async_trait]
pub trait EndpointHandler: Send + Sync {
    async fn fetch(
        &self,
        params: &MarketDataParams,
        cancel: CancelSignal,
    ) -> anyhow::Result<Vec<CanonicalCurrency>>;
}

/// Adapter turning an async closure into an [`EndpointHandler`].
struct FnHandler<F, Fut> {
    f: F,
    _fut: PhantomData<fn() -> Fut>,
}

#[async_trait]
impl<F, Fut> EndpointHandler for FnHandler<F, Fut>
where
    F: Fn(MarketDataParams, CancelSignal) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Vec<CanonicalCurrency>>> + Send + 'static,
{
    async fn fetch(
        &self,
        params: &MarketDataParams,
        cancel: CancelSignal,
    ) -> anyhow::Result<Vec<CanonicalCurrency>> {
        (self.f)(params.clone(), cancel).await
    }
}

/// Wrap an async closure `(params, cancel) -> Result<Vec<CanonicalCurrency>>`
/// as a shareable handler.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn EndpointHandler>
where
    F: Fn(MarketDataParams, CancelSignal) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Vec<CanonicalCurrency>>> + Send + 'static,
{
    Arc::new(FnHandler { f, _fut: PhantomData })
}

/// A named, prioritized, timeout-bound handler.
#[derive(Clone)]
pub struct SourceEndpoint {
    /// Provenance label, also used in error messages.
    pub name: String,
    /// Lower is tried first.
    pub priority: i32,
    /// Per-attempt deadline.
    pub timeout: Duration,
    pub handler: Arc<dyn EndpointHandler>,
}

impl SourceEndpoint {
    /// New endpoint with the default 10 s timeout.
    pub fn new(name: impl Into<String>, priority: i32, handler: Arc<dyn EndpointHandler>) -> Self {
        let timeout = Duration::from_millis(DEFAULT_TIMEOUT_MS);
        Self { name: name.into(), priority, timeout, handler }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for SourceEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceEndpoint")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a single endpoint attempt failed.
#[derive(Debug, Error)]
pub enum AttemptError {
    /// The handler did not settle within the endpoint timeout.
    #[error("timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The overall call deadline ran out before or during this attempt.
    #[error("overall deadline exceeded")]
    DeadlineExceeded,

    /// The handler returned an error (network, HTTP status, parse, normalization).
    #[error("{0:#}")]
    Failed(anyhow::Error),
}

impl AttemptError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::DeadlineExceeded)
    }
}

/// One entry of the aggregate failure list.
#[derive(Debug)]
pub struct EndpointFailure {
    /// Name of the endpoint that failed.
    pub source: String,
    pub error: AttemptError,
}

impl std::fmt::Display for EndpointFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.source, self.error)
    }
}

/// Failure of a whole priority fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no endpoints registered")]
    NoEndpoints,

    /// Every attempted endpoint failed; one entry per attempt, in order.
    #[error("all endpoints failed: {}", join_failures(.failures))]
    AllEndpointsFailed { failures: Vec<EndpointFailure> },
}

impl FetchError {
    pub fn failures(&self) -> &[EndpointFailure] {
        match self {
            Self::NoEndpoints => &[],
            Self::AllEndpointsFailed { failures } => failures,
        }
    }
}

fn join_failures(failures: &[EndpointFailure]) -> String {
    failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

// ---------------------------------------------------------------------------
// PriorityClient
// ---------------------------------------------------------------------------

/// Ordered endpoint chain with first-success-wins semantics.
#[derive(Debug)]
pub struct PriorityClient {
    /// Always sorted ascending by priority; ties keep insertion order.
    endpoints: Vec<SourceEndpoint>,
    fallback_enabled: bool,
    overall_deadline: Option<Duration>,
}

impl Default for PriorityClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PriorityClient {
    pub fn new() -> Self {
        Self { endpoints: Vec::new(), fallback_enabled: true, overall_deadline: None }
    }

    /// Bound the total duration of one fetch. Attempt timeouts are clamped to
    /// the remaining budget; endpoints reached after it ran out are recorded
    /// as [`AttemptError::DeadlineExceeded`] without being invoked.
    pub fn with_overall_deadline(mut self, deadline: Duration) -> Self {
        self.overall_deadline = Some(deadline);
        self
    }

    /// Append an endpoint and re-sort by priority.
    ///
    /// Duplicate names are accepted and both entries are attempted.
    pub fn add_endpoint(&mut self, endpoint: SourceEndpoint) {
        if self.endpoints.iter().any(|e| e.name == endpoint.name) {
            warn!("[priority] endpoint '{}' registered more than once", endpoint.name);
        }
        info!(
            "[priority] registered '{}' (priority={}, timeout={}ms)",
            endpoint.name,
            endpoint.priority,
            endpoint.timeout.as_millis()
        );
        self.endpoints.push(endpoint);
        // Stable: equal priorities stay in registration order.
        self.endpoints.sort_by_key(|e| e.priority);
    }

    /// When disabled, only the highest-priority endpoint is attempted.
    pub fn set_fallback_enabled(&mut self, enabled: bool) {
        self.fallback_enabled = enabled;
    }

    pub fn endpoints(&self) -> &[SourceEndpoint] {
        &self.endpoints
    }

    pub fn endpoint_names(&self) -> Vec<&str> {
        self.endpoints.iter().map(|e| e.name.as_str()).collect()
    }

    /// Try endpoints in priority order and return the first success.
    pub async fn fetch_crypto_data(
        &self,
        params: &MarketDataParams,
    ) -> Result<FetchResult, FetchError> {
        if self.endpoints.is_empty() {
            return Err(FetchError::NoEndpoints);
        }

        let started = Instant::now();
        let limit = if self.fallback_enabled { self.endpoints.len() } else { 1 };
        let mut failures = Vec::new();

        for endpoint in self.endpoints.iter().take(limit) {
            let budget = match self.overall_deadline {
                Some(deadline) => deadline.saturating_sub(started.elapsed()).min(endpoint.timeout),
                None => endpoint.timeout,
            };
            if budget.is_zero() {
                warn!("[priority] skipping '{}': overall deadline exceeded", endpoint.name);
                failures.push(EndpointFailure {
                    source: endpoint.name.clone(),
                    error: AttemptError::DeadlineExceeded,
                });
                continue;
            }

            info!("[priority] trying '{}'", endpoint.name);
            match attempt(endpoint, params, budget).await {
                Ok(data) => {
                    info!(
                        "[priority] '{}' returned {} record(s) after {} failed attempt(s)",
                        endpoint.name,
                        data.len(),
                        failures.len()
                    );
                    return Ok(FetchResult {
                        data,
                        source: endpoint.name.clone(),
                        timestamp: time_util::now_ms(),
                    });
                }
                Err(error) => {
                    warn!("[priority] '{}' failed: {error}", endpoint.name);
                    failures.push(EndpointFailure { source: endpoint.name.clone(), error });
                }
            }
        }

        Err(FetchError::AllEndpointsFailed { failures })
    }
}

/// Run one handler against its deadline.
async fn attempt(
    endpoint: &SourceEndpoint,
    params: &MarketDataParams,
    budget: Duration,
) -> Result<Vec<CanonicalCurrency>, AttemptError> {
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let call = endpoint.handler.fetch(params, CancelSignal::new(cancel_rx));

    match tokio::time::timeout(budget, call).await {
        Ok(Ok(data)) => Ok(data),
        Ok(Err(e)) => Err(AttemptError::Failed(e)),
        Err(_) => {
            // No receiver left is fine: nothing was detached.
            let _ = cancel_tx.send(true);
            if budget < endpoint.timeout {
                Err(AttemptError::DeadlineExceeded)
            } else {
                let timeout_ms = u64::try_from(budget.as_millis()).unwrap_or(u64::MAX);
                Err(AttemptError::Timeout { timeout_ms })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use anyhow::anyhow;

    fn coin(symbol: &str) -> CanonicalCurrency {
        CanonicalCurrency {
            id: symbol.to_lowercase(),
            rank: "1".into(),
            name: symbol.into(),
            symbol: symbol.into(),
            price: "$1.00".into(),
            image: None,
            change24h: "+0.00%".into(),
            volume24h: "$0".into(),
            market_cap: None,
        }
    }

    fn ok_handler(
        symbols: &'static [&'static str],
        calls: Arc<AtomicUsize>,
    ) -> Arc<dyn EndpointHandler> {
        handler_fn(move |_, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            let data: Vec<CanonicalCurrency> = symbols.iter().map(|s| coin(s)).collect();
            async move { Ok::<_, anyhow::Error>(data) }
        })
    }

    fn failing_handler(msg: &'static str) -> Arc<dyn EndpointHandler> {
        handler_fn(move |_, _| async move { Err::<Vec<CanonicalCurrency>, _>(anyhow!(msg)) })
    }

    fn sleeping_handler(delay: Duration) -> Arc<dyn EndpointHandler> {
        handler_fn(move |_, _| async move {
            tokio::time::sleep(delay).await;
            Ok::<_, anyhow::Error>(vec![coin("LATE")])
        })
    }

    fn params() -> MarketDataParams {
        MarketDataParams::new("usd").with_page(20, 1)
    }

    #[tokio::test]
    async fn first_success_wins() {
        let high = Arc::new(AtomicUsize::new(0));
        let low = Arc::new(AtomicUsize::new(0));

        let mut client = PriorityClient::new();
        client.add_endpoint(SourceEndpoint::new("Low", 2, ok_handler(&["ETH"], low.clone())));
        client.add_endpoint(SourceEndpoint::new("High", 1, ok_handler(&["BTC"], high.clone())));

        let result = client.fetch_crypto_data(&params()).await.unwrap();
        assert_eq!(result.source, "High");
        assert_eq!(result.data[0].symbol, "BTC");
        assert!(result.timestamp > 0);
        assert_eq!(high.load(Ordering::SeqCst), 1);
        assert_eq!(low.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn falls_back_after_rejection() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut client = PriorityClient::new();
        client.add_endpoint(SourceEndpoint::new("A", 1, failing_handler("connection refused")));
        client.add_endpoint(SourceEndpoint::new("B", 2, ok_handler(&["BTC", "ETH"], calls)));

        let result = client.fetch_crypto_data(&params()).await.unwrap();
        assert_eq!(result.source, "B");
        assert_eq!(result.data.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_moves_to_next_endpoint() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut client = PriorityClient::new();
        client.add_endpoint(
            SourceEndpoint::new("Hanging", 1, handler_fn(|_, _| std::future::pending()))
                .with_timeout(Duration::from_millis(100)),
        );
        client.add_endpoint(SourceEndpoint::new("Backup", 2, ok_handler(&["SOL"], calls)));

        let started = Instant::now();
        let result = client.fetch_crypto_data(&params()).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(result.source, "Backup");
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn single_slow_endpoint_reports_timeout() {
        let mut client = PriorityClient::new();
        client.add_endpoint(
            SourceEndpoint::new("Slow", 1, sleeping_handler(Duration::from_millis(500)))
                .with_timeout(Duration::from_millis(100)),
        );

        let err = client.fetch_crypto_data(&params()).await.unwrap_err();
        let failures = err.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].source, "Slow");
        assert!(matches!(failures[0].error, AttemptError::Timeout { timeout_ms: 100 }));
        assert!(err.to_string().contains("Slow: timeout after 100ms"));
    }

    #[tokio::test]
    async fn exhaustion_lists_every_endpoint() {
        let mut client = PriorityClient::new();
        client.add_endpoint(SourceEndpoint::new("C", 3, failing_handler("parse error")));
        client.add_endpoint(SourceEndpoint::new("A", 1, failing_handler("HTTP 429")));
        client.add_endpoint(SourceEndpoint::new("B", 2, failing_handler("HTTP 503")));

        let err = client.fetch_crypto_data(&params()).await.unwrap_err();
        let names: Vec<&str> = err.failures().iter().map(|f| f.source.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);
        assert_eq!(
            err.to_string(),
            "all endpoints failed: A: HTTP 429; B: HTTP 503; C: parse error"
        );
    }

    #[tokio::test]
    async fn equal_priorities_keep_registration_order() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let mut client = PriorityClient::new();
        client.add_endpoint(SourceEndpoint::new("first", 5, ok_handler(&["A"], first.clone())));
        client.add_endpoint(SourceEndpoint::new("second", 5, ok_handler(&["B"], second.clone())));
        client.add_endpoint(SourceEndpoint::new("zero", 0, failing_handler("down")));

        assert_eq!(client.endpoint_names(), ["zero", "first", "second"]);
        let result = client.fetch_crypto_data(&params()).await.unwrap();
        assert_eq!(result.source, "first");
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fallback_disabled_tries_only_the_first() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut client = PriorityClient::new();
        client.add_endpoint(SourceEndpoint::new("A", 1, failing_handler("down")));
        client.add_endpoint(SourceEndpoint::new("B", 2, ok_handler(&["BTC"], calls.clone())));
        client.set_fallback_enabled(false);

        let err = client.fetch_crypto_data(&params()).await.unwrap_err();
        assert_eq!(err.failures().len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn overall_deadline_bounds_the_chain() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut client = PriorityClient::new().with_overall_deadline(Duration::from_millis(1500));
        for (name, priority) in [("one", 1), ("two", 2)] {
            client.add_endpoint(
                SourceEndpoint::new(name, priority, handler_fn(|_, _| std::future::pending()))
                    .with_timeout(Duration::from_secs(1)),
            );
        }
        client.add_endpoint(SourceEndpoint::new("three", 3, ok_handler(&["BTC"], calls.clone())));

        let started = Instant::now();
        let err = client.fetch_crypto_data(&params()).await.unwrap_err();
        assert!(started.elapsed() < Duration::from_millis(1600));

        let failures = err.failures();
        assert_eq!(failures.len(), 3);
        assert!(matches!(failures[0].error, AttemptError::Timeout { timeout_ms: 1000 }));
        assert!(matches!(failures[1].error, AttemptError::DeadlineExceeded));
        assert!(matches!(failures[2].error, AttemptError::DeadlineExceeded));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_fires_cancel_signal() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let handler = handler_fn(move |_, cancel| {
            let flag = flag.clone();
            async move {
                let mut cancel = cancel;
                tokio::spawn(async move {
                    cancel.cancelled().await;
                    flag.store(true, Ordering::SeqCst);
                });
                std::future::pending::<anyhow::Result<Vec<CanonicalCurrency>>>().await
            }
        });

        let mut client = PriorityClient::new();
        client.add_endpoint(
            SourceEndpoint::new("Detached", 1, handler).with_timeout(Duration::from_millis(50)),
        );

        assert!(client.fetch_crypto_data(&params()).await.is_err());
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(cancelled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn duplicate_names_are_both_attempted() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut client = PriorityClient::new();
        client.add_endpoint(SourceEndpoint::new("Mirror", 1, failing_handler("down")));
        client.add_endpoint(SourceEndpoint::new("Mirror", 2, ok_handler(&["BTC"], calls.clone())));

        let result = client.fetch_crypto_data(&params()).await.unwrap();
        assert_eq!(result.source, "Mirror");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_registry() {
        let client = PriorityClient::new();
        assert!(matches!(client.fetch_crypto_data(&params()).await, Err(FetchError::NoEndpoints)));
    }

    #[test]
    fn never_signal_is_not_cancelled() {
        assert!(!CancelSignal::never().is_cancelled());
    }
}
