//! HRIS webhook intake (spec §6.3). Event source for hire/rehire/consent/
//! position/termination events pushed by the tenant's HR system.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use investigation_compliance::{ConsentRecord, ConsentScope, VerificationMethod};
use investigation_core::{AuditEventKind, SubjectId, TenantId};
use serde_json::{json, Value};
use sha2::Sha256;
use uuid::Uuid;

use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/:tenant_id", post(hris_webhook))
}

const RECOGNIZED_EVENT_TYPES: &[&str] = &[
    "hire.initiated",
    "rehire.initiated",
    "consent.granted",
    "position.changed",
    "employee.terminated",
];

pub async fn hris_webhook(State(state): State<AppState>, Path(tenant_id): Path<Uuid>, headers: HeaderMap, body: Bytes) -> Response {
    let tenant_id = TenantId(tenant_id);

    let tenant = match state.repository.get_tenant(tenant_id).await {
        Ok(tenant) => tenant,
        Err(_) => return error_response(StatusCode::NOT_FOUND, "unknown tenant"),
    };
    if !tenant.active {
        return error_response(StatusCode::NOT_FOUND, "connection disabled");
    }

    let Some(secret) = &tenant.webhook_secret else {
        return error_response(StatusCode::NOT_FOUND, "no webhook configured for tenant");
    };

    let signature = headers
        .get("x-signature")
        .or_else(|| headers.get("x-webhook-signature"))
        .and_then(|v| v.to_str().ok());
    let Some(signature) = signature else {
        return error_response(StatusCode::UNAUTHORIZED, "missing signature");
    };
    if !verify_signature(secret, &body, signature) {
        return error_response(StatusCode::UNAUTHORIZED, "invalid signature");
    }

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "invalid JSON"),
    };

    let event_type = headers
        .get("x-event-type")
        .or_else(|| headers.get("x-webhook-event-type"))
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| payload.get("type").and_then(Value::as_str).map(str::to_string))
        .or_else(|| payload.get("event_type").and_then(Value::as_str).map(str::to_string))
        .or_else(|| payload.get("eventType").and_then(Value::as_str).map(str::to_string));

    let Some(event_type) = event_type else {
        return error_response(StatusCode::BAD_REQUEST, "missing event type");
    };

    if !RECOGNIZED_EVENT_TYPES.contains(&event_type.as_str()) {
        return error_response(StatusCode::BAD_REQUEST, "unrecognized event type");
    }

    if let Err(status) = apply_event(&state, tenant_id, &event_type, &payload).await {
        return error_response(status, "failed to process event");
    }

    (StatusCode::OK, Json(json!({ "status": "processed", "event_type": event_type }))).into_response()
}

async fn apply_event(state: &AppState, tenant_id: TenantId, event_type: &str, payload: &Value) -> Result<(), StatusCode> {
    match event_type {
        "consent.granted" => {
            let subject_id = payload
                .get("subject_id")
                .and_then(Value::as_str)
                .and_then(|s| Uuid::parse_str(s).ok())
                .map(SubjectId)
                .ok_or(StatusCode::BAD_REQUEST)?;

            let record = ConsentRecord {
                subject_id,
                scopes: [ConsentScope::BackgroundCheck].into_iter().collect(),
                granted_at: Utc::now(),
                expires_at: None,
                verification_method: VerificationMethod::HrisApi,
                locale: payload.get("locale").and_then(Value::as_str).unwrap_or("US").to_string(),
                fcra_disclosure: None,
                revoked: false,
            };
            state.consent_store.grant(record);

            state
                .repository
                .append_audit(tenant_id, AuditEventKind::ConsentGranted, payload.clone())
                .await
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        }
        "hire.initiated" | "rehire.initiated" | "position.changed" | "employee.terminated" => {
            state
                .repository
                .append_audit(tenant_id, AuditEventKind::DataAccessed, json!({ "event_type": event_type, "payload": payload }))
                .await
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        }
        _ => return Err(StatusCode::BAD_REQUEST),
    }
    Ok(())
}

fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    let expected = mac.finalize().into_bytes();
    let expected_hex = hex_encode(&expected);

    // Constant-time compare against the hex-encoded digest.
    let provided = signature.trim_start_matches("sha256=");
    expected_hex.len() == provided.len() && expected_hex.bytes().zip(provided.bytes()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut acc, b| {
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_a_matching_signature() {
        let secret = "tenant-secret";
        let body = br#"{"type":"hire.initiated"}"#;
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        let digest = hex_encode(&mac.finalize().into_bytes());

        assert!(verify_signature(secret, body, &digest));
        assert!(verify_signature(secret, body, &format!("sha256={digest}")));
    }

    #[test]
    fn rejects_a_tampered_body() {
        let secret = "tenant-secret";
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(b"original");
        let digest = hex_encode(&mac.finalize().into_bytes());

        assert!(!verify_signature(secret, b"tampered", &digest));
    }

    #[test]
    fn recognizes_all_documented_event_types() {
        for event_type in RECOGNIZED_EVENT_TYPES {
            assert!(RECOGNIZED_EVENT_TYPES.contains(event_type));
        }
        assert!(!RECOGNIZED_EVENT_TYPES.contains(&"employee.promoted"));
    }
}
