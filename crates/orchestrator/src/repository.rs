//! `ScreeningRepository`: the sole persistence seam the orchestrator (and
//! later the API crate's handlers) depend on. Concrete implementations
//! (sqlx-backed, in-memory for tests) live outside this crate.

use crate::types::ScreeningOutcome;
use async_trait::async_trait;
use investigation_core::{AuditEventKind, Result, RetentionDataType, ScreeningId, TenantId};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct Tenant {
    pub tenant_id: TenantId,
    pub active: bool,
    pub webhook_secret: Option<String>,
}

#[async_trait]
pub trait ScreeningRepository: Send + Sync {
    async fn get_tenant(&self, tenant_id: TenantId) -> Result<Tenant>;
    async fn save_screening(&self, screening_id: ScreeningId, outcome: &ScreeningOutcome) -> Result<()>;
    async fn load_screening(&self, screening_id: ScreeningId) -> Result<Option<ScreeningOutcome>>;
    async fn put_cache(&self, key: &str, value: Value) -> Result<()>;
    async fn get_cache(&self, key: &str) -> Result<Option<Value>>;
    async fn append_audit(&self, tenant_id: TenantId, kind: AuditEventKind, detail: Value) -> Result<()>;
    async fn put_retention_record(&self, tenant_id: TenantId, data_type: RetentionDataType, reference: &str) -> Result<()>;
}
