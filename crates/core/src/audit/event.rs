use crate::types::AuditEventKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Severity levels for audit events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSeverity {
    Info,
    Warning,
    Critical,
}

/// Core audit event structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique identifier for this event
    pub id: String,
    /// Event kind (closed set, see `AuditEventKind`)
    pub event_type: AuditEventKind,
    /// Event severity
    pub severity: EventSeverity,
    /// Timestamp when event occurred
    pub timestamp: DateTime<Utc>,
    /// Tenant context
    pub tenant_id: Option<String>,
    /// Screening this event relates to, if any
    pub screening_id: Option<String>,
    /// Request ID for correlation
    pub request_id: Option<String>,
    /// Resource being acted upon (e.g. "provider", "finding")
    pub resource_type: Option<String>,
    /// ID of the resource
    pub resource_id: Option<String>,
    /// Human-readable description
    pub description: String,
    /// Structured metadata
    pub metadata: HashMap<String, serde_json::Value>,
    /// Operation outcome
    pub outcome: EventOutcome,
    /// Additional tags for filtering
    pub tags: Vec<String>,
}

/// Event outcome enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOutcome {
    Success,
    Failure,
    Partial,
    Unknown,
}

impl std::fmt::Display for EventOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventOutcome::Success => write!(f, "success"),
            EventOutcome::Failure => write!(f, "failure"),
            EventOutcome::Partial => write!(f, "partial"),
            EventOutcome::Unknown => write!(f, "unknown"),
        }
    }
}

/// Builder for creating audit events
pub struct AuditEventBuilder {
    event: AuditEvent,
}

impl AuditEventBuilder {
    pub fn new(event_type: AuditEventKind, description: impl Into<String>) -> Self {
        Self {
            event: AuditEvent {
                id: Uuid::new_v4().to_string(),
                event_type,
                severity: EventSeverity::Info,
                timestamp: Utc::now(),
                tenant_id: None,
                screening_id: None,
                request_id: None,
                resource_type: None,
                resource_id: None,
                description: description.into(),
                metadata: HashMap::new(),
                outcome: EventOutcome::Success,
                tags: Vec::new(),
            },
        }
    }

    pub fn severity(mut self, severity: EventSeverity) -> Self {
        self.event.severity = severity;
        self
    }

    pub fn tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.event.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn screening_id(mut self, screening_id: impl Into<String>) -> Self {
        self.event.screening_id = Some(screening_id.into());
        self
    }

    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.event.request_id = Some(request_id.into());
        self
    }

    pub fn resource(mut self, resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        self.event.resource_type = Some(resource_type.into());
        self.event.resource_id = Some(resource_id.into());
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.event.metadata.insert(key.into(), value);
        self
    }

    pub fn outcome(mut self, outcome: EventOutcome) -> Self {
        self.event.outcome = outcome;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.event.tags.push(tag.into());
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.event.tags.extend(tags);
        self
    }

    pub fn build(self) -> AuditEvent {
        self.event
    }
}

impl AuditEvent {
    /// Create a new builder
    pub fn builder(event_type: AuditEventKind, description: impl Into<String>) -> AuditEventBuilder {
        AuditEventBuilder::new(event_type, description)
    }

    /// Check if event should be alerted
    pub fn should_alert(&self) -> bool {
        matches!(self.severity, EventSeverity::Critical)
            || matches!(self.outcome, EventOutcome::Failure)
            || matches!(
                self.event_type,
                AuditEventKind::ComplianceViolation | AuditEventKind::ScreeningFailed
            )
    }

    /// Get event category for grouping
    pub fn category(&self) -> &'static str {
        match self.event_type {
            AuditEventKind::ScreeningInitiated
            | AuditEventKind::ScreeningCompleted
            | AuditEventKind::ScreeningFailed
            | AuditEventKind::ScreeningCancelled => "screening",

            AuditEventKind::DataAccessed => "data",

            AuditEventKind::CacheHit | AuditEventKind::CacheMiss => "cache",

            AuditEventKind::ProviderQuery => "provider",

            AuditEventKind::ConsentGranted | AuditEventKind::ConsentRevoked => "consent",

            AuditEventKind::ComplianceViolation => "compliance",
        }
    }

    /// Convert to a loggable format
    pub fn to_log_format(&self) -> String {
        format!(
            "[{}] {} on {}: {}",
            self.severity,
            self.event_type,
            self.resource_type.as_deref().unwrap_or("unknown"),
            self.description
        )
    }
}

impl std::fmt::Display for EventSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
