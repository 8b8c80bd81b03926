// src/handlers/dashboard.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{AdminOnly, RequireRole},
        tenancy::TenantScope,
    },
    models::dashboard::{DashboardSummary, DateRange, StatusBreakdownEntry, TopModelEntry},
};

// GET /api/dashboard/summary
#[utoipa::path(
    get,
    path = "/api/dashboard/summary",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Indicadores financeiros do período", body = DashboardSummary),
        (status = 401, description = "Não autorizado"),
        (status = 403, description = "Reservado aos administradores")
    ),
    params(
        DateRange,
        ("x-salon-id" = Option<String>, Header, description = "Salon (sem cabeçalho, o super_admin vê todos)")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
    scope: TenantScope,
    Query(range): Query<DateRange>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = app_state
        .dashboard_service
        .get_summary(&app_state.db_pool, &actor, scope.0.as_deref(), &range)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(summary)))
}

// GET /api/dashboard/statuses
#[utoipa::path(
    get,
    path = "/api/dashboard/statuses",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Commandes e montantes por status", body = Vec<StatusBreakdownEntry>)
    ),
    params(
        DateRange,
        ("x-salon-id" = Option<String>, Header, description = "Salon (sem cabeçalho, o super_admin vê todos)")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_status_breakdown(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
    scope: TenantScope,
    Query(range): Query<DateRange>,
) -> Result<impl IntoResponse, ApiError> {
    let breakdown = app_state
        .dashboard_service
        .get_status_breakdown(&actor, scope.0.as_deref(), &range)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(breakdown)))
}

// GET /api/dashboard/top-models
#[utoipa::path(
    get,
    path = "/api/dashboard/top-models",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Modelos mais pedidos (limit padrão 5)", body = Vec<TopModelEntry>)
    ),
    params(
        DateRange,
        ("x-salon-id" = Option<String>, Header, description = "Salon (sem cabeçalho, o super_admin vê todos)")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_top_models(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
    scope: TenantScope,
    Query(range): Query<DateRange>,
) -> Result<impl IntoResponse, ApiError> {
    let models = app_state
        .dashboard_service
        .get_top_models(&actor, scope.0.as_deref(), &range)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(models)))
}
