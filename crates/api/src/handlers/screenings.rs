//! Screening CRUD handlers (spec §6.1).

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use investigation_core::{Error, ScreeningId, SubjectId, Tier};
use investigation_orchestrator::{CancellationToken, ScreeningRequest, SubjectInput};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::{AppState, InFlightScreening, InFlightStatus};

pub fn screening_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_screening))
        .route("/:id", get(get_screening))
        .route("/:id", delete(cancel_screening))
}

#[derive(Debug, Deserialize)]
pub struct CreateScreeningRequest {
    pub tenant_id: Uuid,
    pub subject_id: Option<Uuid>,
    pub full_name: String,
    pub date_of_birth: Option<String>,
    pub ssn_last4: Option<String>,
    #[serde(default)]
    pub addresses: Vec<String>,
    pub tier: Tier,
    pub role: Option<String>,
    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_locale() -> String {
    "US".to_string()
}

#[derive(Debug, Serialize)]
pub struct ScreeningAccepted {
    pub screening_id: Uuid,
    pub status: &'static str,
}

#[utoipa::path(
    post,
    path = "/v1/screenings",
    responses(
        (status = 202, description = "Screening accepted and enqueued", body = Object),
        (status = 400, description = "Every requested check is compliance-blocked", body = Object),
        (status = 403, description = "Consent missing for every requested check", body = Object)
    ),
    tag = "screenings"
)]
pub async fn create_screening(State(state): State<AppState>, Json(body): Json<CreateScreeningRequest>) -> Result<Json<ScreeningAccepted>, ApiError> {
    let tenant_id = investigation_core::TenantId(body.tenant_id);
    let subject_id = body.subject_id.map(SubjectId).unwrap_or_else(SubjectId::new);

    state
        .orchestrator
        .precheck(tenant_id, subject_id, body.tier, &body.locale, body.role.as_deref())
        .map_err(ApiError::from)?;

    let request = ScreeningRequest {
        tenant_id,
        subject_id,
        subject: SubjectInput {
            full_name: body.full_name,
            date_of_birth: body.date_of_birth,
            ssn_last4: body.ssn_last4,
            addresses: body.addresses,
        },
        tier: body.tier,
        role: body.role,
        locale: body.locale,
    };

    let screening_id = ScreeningId::new();
    let cancellation = CancellationToken::new();

    state.in_flight.insert(
        screening_id,
        InFlightScreening {
            status: InFlightStatus::Running,
            cancellation: cancellation.clone(),
        },
    );

    let orchestrator = state.orchestrator.clone();
    let in_flight = state.in_flight.clone();
    tokio::spawn(async move {
        if let Err(err) = orchestrator.run_screening_with_id(screening_id, request, cancellation).await {
            tracing::error!(error = %err, screening_id = %screening_id.0, "screening failed");
        }
        in_flight.remove(&screening_id);
    });

    Ok(Json(ScreeningAccepted {
        screening_id: screening_id.0,
        status: "accepted",
    }))
}

#[utoipa::path(
    get,
    path = "/v1/screenings/{id}",
    responses(
        (status = 200, description = "Screening status and results", body = Object),
        (status = 404, description = "Unknown screening id", body = Object)
    ),
    tag = "screenings"
)]
pub async fn get_screening(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<serde_json::Value>, ApiError> {
    let screening_id = ScreeningId(id);

    if let Some(entry) = state.in_flight.get(&screening_id) {
        let status = match entry.status {
            InFlightStatus::Running => "running",
            InFlightStatus::Cancelling => "cancelling",
        };
        return Ok(Json(json!({ "screening_id": id, "status": status })));
    }

    match state.repository.load_screening(screening_id).await.map_err(ApiError::from)? {
        Some(outcome) => Ok(Json(json!({ "screening_id": id, "status": "complete", "outcome": outcome }))),
        None => Err(ApiError::from(Error::not_found(format!("screening {id} not found")))),
    }
}

#[utoipa::path(
    delete,
    path = "/v1/screenings/{id}",
    responses(
        (status = 202, description = "Cancellation requested", body = Object),
        (status = 404, description = "No in-flight screening with this id", body = Object)
    ),
    tag = "screenings"
)]
pub async fn cancel_screening(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<serde_json::Value>, ApiError> {
    let screening_id = ScreeningId(id);

    let mut entry = state
        .in_flight
        .get_mut(&screening_id)
        .ok_or_else(|| ApiError::from(Error::not_found(format!("no in-flight screening {id}"))))?;

    entry.cancellation.cancel();
    entry.status = InFlightStatus::Cancelling;

    Ok(Json(json!({ "screening_id": id, "status": "cancelling" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_defaults_to_us_when_omitted() {
        let body = serde_json::json!({
            "tenant_id": Uuid::new_v4(),
            "full_name": "Jane Doe",
            "tier": "standard",
        });
        let request: CreateScreeningRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.locale, "US");
        assert!(request.addresses.is_empty());
    }

    #[test]
    fn subject_id_is_optional() {
        let body = serde_json::json!({
            "tenant_id": Uuid::new_v4(),
            "subject_id": Uuid::new_v4(),
            "full_name": "Jane Doe",
            "tier": "enhanced",
            "locale": "US",
        });
        let request: CreateScreeningRequest = serde_json::from_value(body).unwrap();
        assert!(request.subject_id.is_some());
        assert_eq!(request.tier, Tier::Enhanced);
    }
}
