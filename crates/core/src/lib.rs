pub mod audit;
pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

pub use audit::{AuditEvent, AuditLogger};
pub use config::{Config, CorsConfig};
pub use error::{Error, ErrorCode, ErrorContext, ErrorMetrics, Result};
pub use metrics::{MetricsRegistry, MetricsService};
pub use types::{
    AuditEventKind, RequestContext, RetentionDataType, ScreeningId, SubjectId, TenantId, Tier,
};

// Re-export commonly used types from dependencies
pub use uuid::Uuid;
pub use chrono::{DateTime, Utc};
