//! Tenant Context Middleware
//!
//! Extracts the tenant id from the `X-Tenant-ID` header and makes it
//! available to handlers via request extensions. There is no JWT auth
//! system in this domain, so unlike a lot of multi-tenant middleware this
//! doesn't also try to recover a tenant from a bearer token or subdomain —
//! callers are screening-provider integrations, not browsers.

use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use investigation_core::TenantId;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Extract tenant context from the request
pub async fn tenant_context_middleware(headers: HeaderMap, mut req: Request, next: Next) -> Response {
    match extract_tenant_id(&headers) {
        Some(tenant_id) => {
            info!(tenant_id = %tenant_id, "Tenant context established");
            req.extensions_mut().insert(TenantId(tenant_id));
            next.run(req).await
        }
        None => {
            warn!("Request without tenant context");
            next.run(req).await
        }
    }
}

fn extract_tenant_id(headers: &HeaderMap) -> Option<Uuid> {
    let header_value = headers.get("x-tenant-id")?;
    let header_str = header_value.to_str().ok()?;
    match Uuid::parse_str(header_str) {
        Ok(tenant_id) => Some(tenant_id),
        Err(_) => {
            warn!("Invalid UUID in X-Tenant-ID header: {}", header_str);
            None
        }
    }
}

/// Middleware that requires a valid tenant context
pub async fn require_tenant_context(req: Request, next: Next) -> Response {
    if req.extensions().get::<TenantId>().is_none() {
        error!("Request missing required tenant context");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Missing tenant context",
                "message": "This endpoint requires a valid tenant context. Please provide the X-Tenant-ID header."
            })),
        )
            .into_response();
    }

    next.run(req).await
}

/// Extract tenant context from request extensions
pub fn extract_tenant_context(req: &Request) -> Option<TenantId> {
    req.extensions().get::<TenantId>().copied()
}
