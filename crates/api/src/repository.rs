//! `PgScreeningRepository`: the default `ScreeningRepository` implementation.
//!
//! Intentionally thin — persistence schemas are out of the core's scope, so
//! this adapter stores each screening outcome as a JSONB blob rather than
//! normalizing it into relational tables. A deployment that needs queryable
//! screening history should replace this with a richer schema; the trait
//! boundary is what the rest of the system depends on.

use async_trait::async_trait;
use investigation_core::{AuditEventKind, Error, ErrorCode, Result, RetentionDataType, ScreeningId, TenantId};
use investigation_orchestrator::{ScreeningOutcome, ScreeningRepository, Tenant};
use serde_json::Value;
use sqlx::PgPool;

#[derive(Clone)]
pub struct PgScreeningRepository {
    pool: PgPool,
}

impl PgScreeningRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the adapter's own tables if they don't already exist. Run
    /// once at startup; there is no migration history to manage since the
    /// schema is a single JSONB blob per concern.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS investigation_tenants (
                id UUID PRIMARY KEY,
                active BOOLEAN NOT NULL DEFAULT true,
                webhook_secret TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS investigation_screenings (
                id UUID PRIMARY KEY,
                outcome JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS investigation_cache_entries (
                key TEXT PRIMARY KEY,
                value JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS investigation_audit_log (
                id BIGSERIAL PRIMARY KEY,
                tenant_id UUID NOT NULL,
                kind TEXT NOT NULL,
                detail JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS investigation_retention_records (
                id BIGSERIAL PRIMARY KEY,
                tenant_id UUID NOT NULL,
                data_type TEXT NOT NULL,
                reference TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }
}

fn db_error(err: sqlx::Error) -> Error {
    Error::new(ErrorCode::DatabaseQueryError, err.to_string()).add_trace("PgScreeningRepository")
}

#[async_trait]
impl ScreeningRepository for PgScreeningRepository {
    async fn get_tenant(&self, tenant_id: TenantId) -> Result<Tenant> {
        let row = sqlx::query_as::<_, (bool, Option<String>)>(
            "SELECT active, webhook_secret FROM investigation_tenants WHERE id = $1",
        )
        .bind(tenant_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        match row {
            Some((active, webhook_secret)) => Ok(Tenant {
                tenant_id,
                active,
                webhook_secret,
            }),
            None => Err(Error::not_found(format!("tenant {} not found", tenant_id.0))),
        }
    }

    async fn save_screening(&self, screening_id: ScreeningId, outcome: &ScreeningOutcome) -> Result<()> {
        let payload = serde_json::to_value(outcome)?;
        sqlx::query(
            r#"
            INSERT INTO investigation_screenings (id, outcome)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET outcome = EXCLUDED.outcome
            "#,
        )
        .bind(screening_id.0)
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn load_screening(&self, screening_id: ScreeningId) -> Result<Option<ScreeningOutcome>> {
        let row = sqlx::query_as::<_, (Value,)>("SELECT outcome FROM investigation_screenings WHERE id = $1")
            .bind(screening_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        match row {
            Some((value,)) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn put_cache(&self, key: &str, value: Value) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO investigation_cache_entries (key, value, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn get_cache(&self, key: &str) -> Result<Option<Value>> {
        let row = sqlx::query_as::<_, (Value,)>("SELECT value FROM investigation_cache_entries WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(|(v,)| v))
    }

    async fn append_audit(&self, tenant_id: TenantId, kind: AuditEventKind, detail: Value) -> Result<()> {
        sqlx::query("INSERT INTO investigation_audit_log (tenant_id, kind, detail) VALUES ($1, $2, $3)")
            .bind(tenant_id.0)
            .bind(kind.as_str())
            .bind(detail)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn put_retention_record(&self, tenant_id: TenantId, data_type: RetentionDataType, reference: &str) -> Result<()> {
        let tag = match data_type {
            RetentionDataType::ScreeningResult => "screening_result",
            RetentionDataType::ScreeningFinding => "screening_finding",
            RetentionDataType::ScreeningRawData => "screening_raw_data",
            RetentionDataType::AuditLog => "audit_log",
            RetentionDataType::ConsentRecord => "consent_record",
        };
        sqlx::query("INSERT INTO investigation_retention_records (tenant_id, data_type, reference) VALUES ($1, $2, $3)")
            .bind(tenant_id.0)
            .bind(tag)
            .bind(reference)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }
}
