use super::{
    event::{AuditEvent, EventSeverity},
    traits::AuditBackend,
};
use crate::error::{Error, ErrorCode, ErrorMetrics, Result};
use crate::types::AuditEventKind;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// High-level audit logger that provides convenient methods for logging screening events
#[derive(Clone)]
pub struct AuditLogger {
    backend: Arc<dyn AuditBackend>,
    error_metrics: Arc<ErrorMetrics>,
    context: Arc<RwLock<AuditContext>>,
}

/// Context that persists across audit operations in a screening
#[derive(Debug, Clone, Default)]
pub struct AuditContext {
    pub tenant_id: Option<String>,
    pub screening_id: Option<String>,
    pub request_id: Option<String>,
}

impl AuditLogger {
    pub fn new(backend: Arc<dyn AuditBackend>, error_metrics: Arc<ErrorMetrics>) -> Self {
        Self {
            backend,
            error_metrics,
            context: Arc::new(RwLock::new(AuditContext::default())),
        }
    }

    /// Set the audit context for subsequent operations
    pub async fn set_context(&self, context: AuditContext) {
        let mut ctx = self.context.write().await;
        *ctx = context;
    }

    /// Update specific context fields
    pub async fn update_context<F>(&self, updater: F)
    where
        F: FnOnce(&mut AuditContext),
    {
        let mut ctx = self.context.write().await;
        updater(&mut *ctx);
    }

    /// Log a generic audit event
    pub async fn log_event(&self, mut event: AuditEvent) -> Result<()> {
        {
            let ctx = self.context.read().await;

            if event.tenant_id.is_none() {
                event.tenant_id = ctx.tenant_id.clone();
            }
            if event.screening_id.is_none() {
                event.screening_id = ctx.screening_id.clone();
            }
            if event.request_id.is_none() {
                event.request_id = ctx.request_id.clone();
            }
        }

        match event.severity {
            EventSeverity::Info => {
                info!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    screening_id = ?event.screening_id,
                    resource = ?event.resource_type,
                    description = %event.description,
                    "Audit event"
                );
            }
            EventSeverity::Warning => {
                warn!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    screening_id = ?event.screening_id,
                    resource = ?event.resource_type,
                    description = %event.description,
                    "Audit event (warning)"
                );
            }
            EventSeverity::Critical => {
                error!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    screening_id = ?event.screening_id,
                    resource = ?event.resource_type,
                    description = %event.description,
                    metadata = ?event.metadata,
                    "Critical audit event"
                );
            }
        }

        match self.backend.store_event(&event).await {
            Ok(_) => Ok(()),
            Err(e) => {
                let audit_error =
                    Error::new(ErrorCode::StorageError, format!("Failed to store audit event: {}", e));
                self.error_metrics.record_error(&audit_error).await;

                error!(
                    event_id = %event.id,
                    error = %e,
                    "Failed to store audit event - this is a critical compliance issue"
                );

                Err(e)
            }
        }
    }

    // Convenience methods for common screening audit events

    pub async fn log_screening_initiated(&self, screening_id: &str, tenant_id: &str, tier: &str) -> Result<()> {
        let event = AuditEvent::builder(
            AuditEventKind::ScreeningInitiated,
            format!("screening {} initiated at tier {}", screening_id, tier),
        )
        .screening_id(screening_id)
        .tenant_id(tenant_id)
        .metadata("tier", serde_json::Value::String(tier.to_string()))
        .build();

        self.log_event(event).await
    }

    pub async fn log_screening_completed(&self, screening_id: &str, risk_score: f64) -> Result<()> {
        let event = AuditEvent::builder(
            AuditEventKind::ScreeningCompleted,
            format!("screening {} completed", screening_id),
        )
        .screening_id(screening_id)
        .metadata("risk_score", serde_json::json!(risk_score))
        .build();

        self.log_event(event).await
    }

    pub async fn log_screening_failed(&self, screening_id: &str, reason: &str) -> Result<()> {
        let event = AuditEvent::builder(
            AuditEventKind::ScreeningFailed,
            format!("screening {} failed: {}", screening_id, reason),
        )
        .screening_id(screening_id)
        .severity(EventSeverity::Warning)
        .outcome(super::event::EventOutcome::Failure)
        .metadata("reason", serde_json::Value::String(reason.to_string()))
        .build();

        self.log_event(event).await
    }

    pub async fn log_screening_cancelled(&self, screening_id: &str, reason: &str) -> Result<()> {
        let event = AuditEvent::builder(
            AuditEventKind::ScreeningCancelled,
            format!("screening {} cancelled: {}", screening_id, reason),
        )
        .screening_id(screening_id)
        .metadata("reason", serde_json::Value::String(reason.to_string()))
        .build();

        self.log_event(event).await
    }

    pub async fn log_data_accessed(&self, screening_id: &str, resource_type: &str, resource_id: &str) -> Result<()> {
        let event = AuditEvent::builder(
            AuditEventKind::DataAccessed,
            format!("{} {} accessed", resource_type, resource_id),
        )
        .screening_id(screening_id)
        .resource(resource_type, resource_id)
        .build();

        self.log_event(event).await
    }

    pub async fn log_cache_hit(&self, check_type: &str, subject_fingerprint: &str) -> Result<()> {
        let event = AuditEvent::builder(AuditEventKind::CacheHit, format!("cache hit for {}", check_type))
            .resource("cache_entry", subject_fingerprint)
            .metadata("check_type", serde_json::Value::String(check_type.to_string()))
            .build();

        self.log_event(event).await
    }

    pub async fn log_cache_miss(&self, check_type: &str, subject_fingerprint: &str) -> Result<()> {
        let event = AuditEvent::builder(AuditEventKind::CacheMiss, format!("cache miss for {}", check_type))
            .resource("cache_entry", subject_fingerprint)
            .metadata("check_type", serde_json::Value::String(check_type.to_string()))
            .build();

        self.log_event(event).await
    }

    pub async fn log_provider_query(&self, provider: &str, check_type: &str, outcome_success: bool) -> Result<()> {
        let outcome = if outcome_success {
            super::event::EventOutcome::Success
        } else {
            super::event::EventOutcome::Failure
        };

        let event = AuditEvent::builder(
            AuditEventKind::ProviderQuery,
            format!("queried {} for {}", provider, check_type),
        )
        .resource("provider", provider)
        .outcome(outcome)
        .metadata("check_type", serde_json::Value::String(check_type.to_string()))
        .build();

        self.log_event(event).await
    }

    pub async fn log_consent_granted(&self, subject_id: &str, scope: &str) -> Result<()> {
        let event = AuditEvent::builder(
            AuditEventKind::ConsentGranted,
            format!("consent granted for scope {}", scope),
        )
        .resource("subject", subject_id)
        .metadata("scope", serde_json::Value::String(scope.to_string()))
        .build();

        self.log_event(event).await
    }

    pub async fn log_consent_revoked(&self, subject_id: &str, scope: &str) -> Result<()> {
        let event = AuditEvent::builder(
            AuditEventKind::ConsentRevoked,
            format!("consent revoked for scope {}", scope),
        )
        .resource("subject", subject_id)
        .severity(EventSeverity::Warning)
        .metadata("scope", serde_json::Value::String(scope.to_string()))
        .build();

        self.log_event(event).await
    }

    pub async fn log_compliance_violation(&self, screening_id: &str, reason: &str) -> Result<()> {
        let event = AuditEvent::builder(AuditEventKind::ComplianceViolation, reason.to_string())
            .screening_id(screening_id)
            .severity(EventSeverity::Critical)
            .outcome(super::event::EventOutcome::Failure)
            .build();

        self.log_event(event).await
    }
}

impl AuditContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn with_screening_id(mut self, screening_id: impl Into<String>) -> Self {
        self.screening_id = Some(screening_id.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}
