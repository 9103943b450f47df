use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub Uuid);

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreeningId(pub Uuid);

impl std::fmt::Display for ScreeningId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ScreeningId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ScreeningId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectId(pub Uuid);

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl SubjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubjectId {
    fn default() -> Self {
        Self::new()
    }
}

/// Closed set of audit event kinds the investigation core emits, consumed via
/// the repository trait's audit sink. Never free-form strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
    ScreeningInitiated,
    ScreeningCompleted,
    ScreeningFailed,
    ScreeningCancelled,
    DataAccessed,
    CacheHit,
    CacheMiss,
    ProviderQuery,
    ConsentGranted,
    ConsentRevoked,
    ComplianceViolation,
}

impl AuditEventKind {
    /// Dotted wire representation, e.g. `screening.initiated`.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEventKind::ScreeningInitiated => "screening.initiated",
            AuditEventKind::ScreeningCompleted => "screening.completed",
            AuditEventKind::ScreeningFailed => "screening.failed",
            AuditEventKind::ScreeningCancelled => "screening.cancelled",
            AuditEventKind::DataAccessed => "data.accessed",
            AuditEventKind::CacheHit => "cache.hit",
            AuditEventKind::CacheMiss => "cache.miss",
            AuditEventKind::ProviderQuery => "provider.query",
            AuditEventKind::ConsentGranted => "consent.granted",
            AuditEventKind::ConsentRevoked => "consent.revoked",
            AuditEventKind::ComplianceViolation => "compliance.violation",
        }
    }
}

impl std::fmt::Display for AuditEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Closed set of data-type tags consumed by the retention collaborator via
/// `put_retention_record`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionDataType {
    ScreeningResult,
    ScreeningFinding,
    ScreeningRawData,
    AuditLog,
    ConsentRecord,
}

/// Service tier requested for a screening. Gates enhanced-only check types
/// and information types, and selects the per-tier screening deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Standard,
    Enhanced,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Standard => write!(f, "standard"),
            Tier::Enhanced => write!(f, "enhanced"),
        }
    }
}

/// Request-scoped context threaded through a screening: correlation id,
/// tenant, and timing, for logging/audit enrichment.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub tenant_id: Option<TenantId>,
    pub screening_id: Option<ScreeningId>,
    pub correlation_id: Option<String>,
    pub source_ip: Option<String>,
    pub user_agent: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            tenant_id: None,
            screening_id: None,
            correlation_id: None,
            source_ip: None,
            user_agent: None,
            started_at: Utc::now(),
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn with_tenant_id(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    pub fn with_screening_id(mut self, screening_id: ScreeningId) -> Self {
        self.screening_id = Some(screening_id);
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn with_source_ip(mut self, source_ip: impl Into<String>) -> Self {
        self.source_ip = Some(source_ip.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
