//! `RequestRouter`: executes one `RoutedRequest` against a provider with
//! cache lookup, provider selection, rate limiting, retry/backoff, and
//! circuit breaking.

use crate::breaker::CircuitBreaker;
use crate::cache::{CacheEntry, CacheOrigin, CacheStore, Freshness};
use crate::provider::{ProviderAdapter, ProviderOutcomeError};
use crate::rate_limit::RateLimitBucket;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use investigation_core::{ScreeningId, TenantId, Tier};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use uuid::Uuid;

/// (check-type, subject identifiers, locale, entity-id, tenant-id, service
/// tier, screening-id, attempt counter, deadline).
#[derive(Debug, Clone)]
pub struct RoutedRequest {
    pub check_type: String,
    /// Canonicalized subject-identifier string used to build the cache fingerprint.
    pub subject_fingerprint_input: String,
    pub locale: String,
    pub entity_id: String,
    pub tenant_id: TenantId,
    pub tier: Tier,
    pub screening_id: ScreeningId,
    pub attempt: u32,
    pub deadline: DateTime<Utc>,
}

/// Failure taxonomy surfaced in `RoutedResult.failure.reason`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingFailureReason {
    NoProvider,
    Timeout,
    AllRateLimited,
    CircuitOpen,
    ProviderError,
    InvalidRequest,
}

#[derive(Debug, Clone)]
pub struct RoutingFailure {
    pub reason: RoutingFailureReason,
    pub message: String,
    /// Vendor-supplied `Retry-After`, carried through from `ProviderOutcomeError::RateLimited`.
    pub retry_after_ms: Option<u64>,
}

pub struct RoutedResult {
    pub success: bool,
    pub provider_result: Option<crate::provider::ProviderResultRecord>,
    pub failure: Option<RoutingFailure>,
    pub stale_data_used: bool,
    pub cache_hit: bool,
    pub attempts: u32,
}

impl RoutedResult {
    fn success(result: crate::provider::ProviderResultRecord, stale_data_used: bool, cache_hit: bool, attempts: u32) -> Self {
        Self {
            success: true,
            provider_result: Some(result),
            failure: None,
            stale_data_used,
            cache_hit,
            attempts,
        }
    }

    fn failure(reason: RoutingFailureReason, message: impl Into<String>, attempts: u32) -> Self {
        Self::failure_with_retry(reason, message, attempts, None)
    }

    fn failure_with_retry(reason: RoutingFailureReason, message: impl Into<String>, attempts: u32, retry_after_ms: Option<u64>) -> Self {
        Self {
            success: false,
            provider_result: None,
            failure: Some(RoutingFailure {
                reason,
                message: message.into(),
                retry_after_ms,
            }),
            stale_data_used: false,
            cache_hit: false,
            attempts,
        }
    }
}

/// Exponential backoff parameters: base = 200ms, multiplier = 2.0, jitter
/// uniform in `[0, base)`.
pub struct BackoffConfig {
    pub base_ms: u64,
    pub multiplier: f64,
    pub max_retries: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_ms: 200,
            multiplier: 2.0,
            max_retries: 3,
        }
    }
}

pub struct RequestRouter {
    /// Ordered primary-then-fallback providers per check-type.
    providers: DashMap<String, Vec<Arc<dyn ProviderAdapter>>>,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    buckets: DashMap<String, Arc<RateLimitBucket>>,
    cache: Arc<CacheStore>,
    backoff: BackoffConfig,
    breaker_failure_threshold: u32,
    breaker_open_for_seconds: u64,
    default_bucket_rpm: u32,
}

impl RequestRouter {
    pub fn new(
        cache: Arc<CacheStore>,
        backoff: BackoffConfig,
        breaker_failure_threshold: u32,
        breaker_open_for_seconds: u64,
        default_bucket_rpm: u32,
    ) -> Self {
        Self {
            providers: DashMap::new(),
            breakers: DashMap::new(),
            buckets: DashMap::new(),
            cache,
            backoff,
            breaker_failure_threshold,
            breaker_open_for_seconds,
            default_bucket_rpm,
        }
    }

    pub fn register_provider(&self, check_type: &str, provider: Arc<dyn ProviderAdapter>) {
        self.breakers
            .entry(provider.provider_id().to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(self.breaker_failure_threshold, self.breaker_open_for_seconds)));
        self.buckets
            .entry(provider.provider_id().to_string())
            .or_insert_with(|| Arc::new(RateLimitBucket::from_rpm(self.default_bucket_rpm)));
        self.providers.entry(check_type.to_string()).or_default().push(provider);
    }

    fn breaker_for(&self, provider_id: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(provider_id.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(self.breaker_failure_threshold, self.breaker_open_for_seconds)))
            .clone()
    }

    fn bucket_for(&self, provider_id: &str) -> Arc<RateLimitBucket> {
        self.buckets
            .entry(provider_id.to_string())
            .or_insert_with(|| Arc::new(RateLimitBucket::from_rpm(self.default_bucket_rpm)))
            .clone()
    }

    /// Executes one request, preserving no particular ordering guarantee on
    /// its own — callers needing ordering use `route_batch`.
    pub async fn route(&self, request: &RoutedRequest) -> RoutedResult {
        let Some(providers) = self.providers.get(&request.check_type).map(|p| p.clone()) else {
            return RoutedResult::failure(RoutingFailureReason::NoProvider, "no provider configured for check type", 0);
        };
        if providers.is_empty() {
            return RoutedResult::failure(RoutingFailureReason::NoProvider, "no provider configured for check type", 0);
        }

        // Step 1: cache lookup across candidate providers in fallback order.
        for provider in &providers {
            let fingerprint = CacheStore::fingerprint(
                &request.check_type,
                provider.provider_id(),
                &request.subject_fingerprint_input,
                &request.locale,
            );
            if let Some((result, freshness)) = self.cache.get(&fingerprint, Some(request.tenant_id), Utc::now()) {
                match freshness {
                    Freshness::Fresh => return RoutedResult::success(result, false, true, 0),
                    Freshness::Stale => return RoutedResult::success(result, true, true, 0),
                    Freshness::Expired => {}
                }
            }
        }

        let mut attempts = 0u32;
        let mut last_failure = RoutingFailureReason::NoProvider;
        let mut last_message = "no provider attempted".to_string();
        let mut last_retry_after_ms: Option<u64> = None;

        // Steps 2-6: provider selection (skipping open breakers) with per-provider retry/backoff, then fallback.
        for provider in &providers {
            let breaker = self.breaker_for(provider.provider_id());
            if !breaker.allow_request() {
                last_failure = RoutingFailureReason::CircuitOpen;
                last_message = format!("circuit open for provider {}", provider.provider_id());
                continue;
            }

            let bucket = self.bucket_for(provider.provider_id());
            let mut attempt = 0u32;

            loop {
                if Utc::now() >= request.deadline {
                    return RoutedResult::failure(RoutingFailureReason::Timeout, "deadline exceeded", attempts);
                }

                if !bucket.try_acquire() {
                    last_failure = RoutingFailureReason::AllRateLimited;
                    last_message = format!("no token available for provider {}", provider.provider_id());
                    break;
                }

                attempts += 1;
                match provider.execute(request).await {
                    Ok(execution) => {
                        breaker.record_success();
                        let fingerprint = CacheStore::fingerprint(
                            &request.check_type,
                            provider.provider_id(),
                            &request.subject_fingerprint_input,
                            &request.locale,
                        );
                        let now = Utc::now();
                        self.cache.put(
                            fingerprint,
                            CacheEntry {
                                provider_result: execution.result.clone(),
                                origin: CacheOrigin::PaidExternal,
                                fresh_until: now + ChronoDuration::seconds(execution.fresh_for_seconds),
                                stale_until: now + ChronoDuration::seconds(execution.stale_for_seconds),
                                tenant_id: None,
                            },
                        );
                        return RoutedResult::success(execution.result, false, false, attempts);
                    }
                    Err(ProviderOutcomeError::Timeout) | Err(ProviderOutcomeError::Transient(_)) => {
                        breaker.record_failure();
                        last_failure = RoutingFailureReason::Timeout;
                        last_message = format!("transient failure from provider {}", provider.provider_id());
                        attempt += 1;
                        if attempt > self.backoff.max_retries {
                            break;
                        }
                        self.sleep_backoff(attempt).await;
                    }
                    Err(ProviderOutcomeError::Permanent(msg)) => {
                        last_failure = RoutingFailureReason::ProviderError;
                        last_message = msg;
                        break;
                    }
                    Err(ProviderOutcomeError::RateLimited { retry_after_ms }) => {
                        last_failure = RoutingFailureReason::AllRateLimited;
                        last_message = format!("provider {} rate limited", provider.provider_id());
                        last_retry_after_ms = retry_after_ms;
                        if let Some(ms) = retry_after_ms {
                            self.sleep_retry_after(ms, request.deadline).await;
                        }
                        break;
                    }
                }
            }
        }

        RoutedResult::failure_with_retry(last_failure, last_message, attempts, last_retry_after_ms)
    }

    async fn sleep_backoff(&self, attempt: u32) {
        let base = self.backoff.base_ms as f64 * self.backoff.multiplier.powi(attempt as i32 - 1);
        let jitter = rand::thread_rng().gen_range(0.0..self.backoff.base_ms as f64);
        tokio::time::sleep(StdDuration::from_millis((base + jitter) as u64)).await;
    }

    /// Paces the next fallback attempt by the vendor's `Retry-After`, capped
    /// to whatever's left before `deadline`.
    async fn sleep_retry_after(&self, retry_after_ms: u64, deadline: DateTime<Utc>) {
        let remaining = (deadline - Utc::now()).to_std().unwrap_or_default();
        let wait = StdDuration::from_millis(retry_after_ms).min(remaining);
        tokio::time::sleep(wait).await;
    }

    /// Executes a batch, preserving request order in the returned vector.
    pub async fn route_batch(&self, requests: &[RoutedRequest]) -> Vec<RoutedResult> {
        let futures = requests.iter().map(|r| self.route(r));
        futures::future::join_all(futures).await
    }
}

/// Canonicalizes subject-identifier fields into the string consumed by
/// `CacheStore::fingerprint`. Lower-cases and trims to make equivalent
/// identifiers collide in the cache.
pub fn canonicalize_subject(full_name: &str, dob: &str, ssn_last4: &str) -> String {
    format!("{}|{}|{}", full_name.trim().to_lowercase(), dob.trim(), ssn_last4.trim())
}

pub fn new_query_id() -> Uuid {
    Uuid::new_v4()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderExecution;
    use async_trait::async_trait;
    use investigation_core::SubjectId;

    struct RateLimitedProvider {
        retry_after_ms: Option<u64>,
    }

    #[async_trait]
    impl ProviderAdapter for RateLimitedProvider {
        fn provider_id(&self) -> &str {
            "rate-limited-provider"
        }

        fn supported_checks(&self) -> &[&str] {
            &["IDENTITY_VERIFICATION"]
        }

        async fn execute(&self, _request: &RoutedRequest) -> Result<ProviderExecution, ProviderOutcomeError> {
            Err(ProviderOutcomeError::RateLimited {
                retry_after_ms: self.retry_after_ms,
            })
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    fn test_request() -> RoutedRequest {
        RoutedRequest {
            check_type: "IDENTITY_VERIFICATION".to_string(),
            subject_fingerprint_input: canonicalize_subject("Jane Doe", "1990-01-01", "1234"),
            locale: "US".to_string(),
            entity_id: SubjectId::new().0.to_string(),
            tenant_id: TenantId(Uuid::new_v4()),
            tier: Tier::Standard,
            screening_id: ScreeningId::new(),
            attempt: 0,
            deadline: Utc::now() + ChronoDuration::seconds(5),
        }
    }

    #[tokio::test]
    async fn rate_limited_failure_surfaces_retry_after_ms() {
        let router = RequestRouter::new(Arc::new(CacheStore::new()), BackoffConfig::default(), 5, 30, 60);
        router.register_provider("IDENTITY_VERIFICATION", Arc::new(RateLimitedProvider { retry_after_ms: Some(50) }));

        let result = router.route(&test_request()).await;

        assert!(!result.success);
        let failure = result.failure.expect("rate-limited route should fail");
        assert_eq!(failure.reason, RoutingFailureReason::AllRateLimited);
        assert_eq!(failure.retry_after_ms, Some(50));
    }

    #[tokio::test]
    async fn rate_limited_failure_with_no_retry_after_leaves_it_none() {
        let router = RequestRouter::new(Arc::new(CacheStore::new()), BackoffConfig::default(), 5, 30, 60);
        router.register_provider("IDENTITY_VERIFICATION", Arc::new(RateLimitedProvider { retry_after_ms: None }));

        let result = router.route(&test_request()).await;

        let failure = result.failure.expect("rate-limited route should fail");
        assert_eq!(failure.retry_after_ms, None);
    }
}
