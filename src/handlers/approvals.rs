// src/handlers/approvals.rs

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{AdminOnly, RequireRole},
        tenancy::TenantScope,
    },
    models::history::{ApprovePayload, DecisionOutcome, PendingFilter, PendingValidation, RejectPayload},
};

// GET /api/approvals
#[utoipa::path(
    get,
    path = "/api/approvals",
    tag = "Approvals",
    responses(
        (status = 200, description = "Fila de validações pendentes", body = Vec<PendingValidation>),
        (status = 403, description = "Reservado aos administradores")
    ),
    params(
        PendingFilter,
        ("x-salon-id" = Option<String>, Header, description = "Salon (opcional para o super_admin)")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_pending(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
    scope: TenantScope,
    Query(filter): Query<PendingFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let pending = app_state
        .approval_service
        .list_pending(&actor, scope.0.as_deref(), &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(pending))
}

// POST /api/approvals/{id}/approve
#[utoipa::path(
    post,
    path = "/api/approvals/{id}/approve",
    tag = "Approvals",
    request_body = ApprovePayload,
    responses(
        (status = 200, description = "Entrada validada e efeito aplicado", body = DecisionOutcome),
        (status = 409, description = "Entrada já decidida")
    ),
    params(("id" = Uuid, Path, description = "ID da entrada de histórico")),
    security(("api_jwt" = []))
)]
pub async fn approve(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
    Path(entry_id): Path<Uuid>,
    Json(payload): Json<ApprovePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let outcome = app_state
        .approval_service
        .approve(&app_state.db_pool, &actor, entry_id, payload.commentaire.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(outcome))
}

// POST /api/approvals/{id}/reject
#[utoipa::path(
    post,
    path = "/api/approvals/{id}/reject",
    tag = "Approvals",
    request_body = RejectPayload,
    responses(
        (status = 200, description = "Entrada rejeitada (com estorno se for pagamento)", body = DecisionOutcome),
        (status = 400, description = "Motivo obrigatório"),
        (status = 409, description = "Entrada já decidida")
    ),
    params(("id" = Uuid, Path, description = "ID da entrada de histórico")),
    security(("api_jwt" = []))
)]
pub async fn reject(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
    Path(entry_id): Path<Uuid>,
    Json(payload): Json<RejectPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let outcome = app_state
        .approval_service
        .reject(&app_state.db_pool, &actor, entry_id, payload.motif.trim())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(outcome))
}
