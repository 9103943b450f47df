//! External provider adapter boundary. The sole dynamic-dispatch boundary
//! in the routing layer — everything else is concretely typed.

use crate::router::RoutedRequest;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// (provider-id, normalized payload, raw payload hash, latency, cost,
/// cache-hit flag, acquired-at). The freshness window is supplied
/// separately by the adapter via `ProviderResultRecord::freshness_seconds`
/// consumed by the router when writing the cache entry.
#[derive(Debug, Clone)]
pub struct ProviderResultRecord {
    pub provider_id: String,
    pub payload: serde_json::Value,
    pub raw_payload_hash: String,
    pub latency_ms: u64,
    pub cost_cents: u64,
    pub cache_hit: bool,
    pub acquired_at: DateTime<Utc>,
}

/// Outcome error taxonomy an adapter reports; the router classifies these
/// into the execution state machine's retry/fallback/breaker decisions.
#[derive(Debug, Clone)]
pub enum ProviderOutcomeError {
    Timeout,
    /// Retryable: connection error, 5xx.
    Transient(String),
    /// Not retryable: 4xx other than 429.
    Permanent(String),
    RateLimited { retry_after_ms: Option<u64> },
}

/// Result produced by a successful adapter call, paired with the freshness
/// window the provider declared for the returned data.
pub struct ProviderExecution {
    pub result: ProviderResultRecord,
    pub fresh_for_seconds: i64,
    pub stale_for_seconds: i64,
}

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn provider_id(&self) -> &str;

    /// Check-types this provider can service.
    fn supported_checks(&self) -> &[&str];

    async fn execute(&self, request: &RoutedRequest) -> Result<ProviderExecution, ProviderOutcomeError>;

    async fn health_check(&self) -> bool;
}
