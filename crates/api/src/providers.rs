//! `HttpProviderAdapter`: a `ProviderAdapter` that calls out to a background
//! screening vendor over HTTP. Vendors vary wildly in their wire formats, so
//! this adapter speaks a single normalized request/response shape and expects
//! the vendor (or a thin shim in front of it) to conform to it; deployments
//! integrating a vendor with an incompatible wire format implement their own
//! `ProviderAdapter` instead of extending this one.

use async_trait::async_trait;
use chrono::Utc;
use investigation_routing::{ProviderAdapter, ProviderExecution, ProviderOutcomeError, ProviderResultRecord, RoutedRequest};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Request body sent to the vendor endpoint.
#[derive(Debug, Serialize)]
struct VendorRequest<'a> {
    check_type: &'a str,
    subject_fingerprint: &'a str,
    locale: &'a str,
    entity_id: &'a str,
}

/// Response body expected back from the vendor endpoint.
#[derive(Debug, Deserialize)]
struct VendorResponse {
    data: serde_json::Value,
    cost_cents: u64,
    fresh_for_seconds: i64,
    #[serde(default = "default_stale_for_seconds")]
    stale_for_seconds: i64,
}

fn default_stale_for_seconds() -> i64 {
    0
}

pub struct HttpProviderAdapter {
    provider_id: String,
    base_url: String,
    // Leaked once at construction: adapters are built once at startup and
    // live for the process lifetime, so this isn't a growing leak.
    checks: Vec<&'static str>,
    client: reqwest::Client,
}

impl HttpProviderAdapter {
    pub fn new(provider_id: impl Into<String>, base_url: impl Into<String>, checks: Vec<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .expect("reqwest client builds with static config");
        let checks = checks.into_iter().map(|c| -> &'static str { Box::leak(c.into_boxed_str()) }).collect();
        Self {
            provider_id: provider_id.into(),
            base_url: base_url.into(),
            checks,
            client,
        }
    }
}

#[async_trait]
impl ProviderAdapter for HttpProviderAdapter {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn supported_checks(&self) -> &[&str] {
        &self.checks
    }

    async fn execute(&self, request: &RoutedRequest) -> Result<ProviderExecution, ProviderOutcomeError> {
        let started = std::time::Instant::now();
        let url = format!("{}/v1/checks/{}", self.base_url, request.check_type);
        let body = VendorRequest {
            check_type: &request.check_type,
            subject_fingerprint: &request.subject_fingerprint_input,
            locale: &request.locale,
            entity_id: &request.entity_id,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|err| classify_transport_error(&err))?;

        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after_ms = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(|secs| secs * 1000);
            return Err(ProviderOutcomeError::RateLimited { retry_after_ms });
        }
        if status.is_server_error() {
            return Err(ProviderOutcomeError::Transient(format!("vendor returned {status}")));
        }
        if !status.is_success() {
            return Err(ProviderOutcomeError::Permanent(format!("vendor returned {status}")));
        }

        let raw_bytes = response
            .bytes()
            .await
            .map_err(|err| ProviderOutcomeError::Transient(err.to_string()))?;
        let parsed: VendorResponse = serde_json::from_slice(&raw_bytes)
            .map_err(|err| ProviderOutcomeError::Permanent(format!("malformed vendor response: {err}")))?;

        let raw_payload_hash = format!("{:x}", Sha256::digest(&raw_bytes));
        let latency_ms = started.elapsed().as_millis() as u64;

        Ok(ProviderExecution {
            result: ProviderResultRecord {
                provider_id: self.provider_id.clone(),
                payload: parsed.data,
                raw_payload_hash,
                latency_ms,
                cost_cents: parsed.cost_cents,
                cache_hit: false,
                acquired_at: Utc::now(),
            },
            fresh_for_seconds: parsed.fresh_for_seconds,
            stale_for_seconds: parsed.stale_for_seconds,
        })
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        matches!(self.client.get(&url).send().await, Ok(resp) if resp.status().is_success())
    }
}

fn classify_transport_error(err: &reqwest::Error) -> ProviderOutcomeError {
    if err.is_timeout() {
        ProviderOutcomeError::Timeout
    } else {
        ProviderOutcomeError::Transient(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_its_configured_checks() {
        let adapter = HttpProviderAdapter::new("acme-vendor", "https://vendor.example.test", vec!["criminal".to_string(), "employment".to_string()]);
        assert_eq!(adapter.provider_id(), "acme-vendor");
        assert_eq!(adapter.supported_checks(), &["criminal", "employment"]);
    }
}
