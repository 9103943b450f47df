//! Execution of a single routed request against an external provider with
//! retry, rate limiting, circuit breaking, caching, and fallback — plus the
//! cross-provider priority dispatcher that sits in front of it.

pub mod breaker;
pub mod cache;
pub mod dispatcher;
pub mod provider;
pub mod rate_limit;
pub mod router;

pub use breaker::{BreakerState, CircuitBreaker};
pub use cache::{CacheEntry, CacheOrigin, CacheStore, Freshness};
pub use dispatcher::{apply_modifiers, base_priority, PriorityDispatcher, QueuedItem};
pub use provider::{ProviderAdapter, ProviderExecution, ProviderOutcomeError, ProviderResultRecord};
pub use rate_limit::RateLimitBucket;
pub use router::{
    canonicalize_subject, BackoffConfig, RequestRouter, RoutedRequest, RoutedResult, RoutingFailure,
    RoutingFailureReason,
};
