// src/handlers/salons.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{AdminOnly, RequireRole, SuperAdminOnly},
    },
    models::salon::{CreateSalonPayload, NextSalonId, Salon, SalonCreated, UpdateSalonPayload},
};

// POST /api/salons
#[utoipa::path(
    post,
    path = "/api/salons",
    tag = "Salons",
    request_body = CreateSalonPayload,
    responses(
        (status = 201, description = "Salon e admin criados", body = SalonCreated),
        (status = 409, description = "Código de admin ou couturier já utilizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_salon(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireRole<SuperAdminOnly>,
    Json(payload): Json<CreateSalonPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let created = app_state
        .salon_service
        .create_salon_with_admin(&actor, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/salons
#[utoipa::path(
    get,
    path = "/api/salons",
    tag = "Salons",
    responses(
        (status = 200, description = "Salons visíveis ao usuário", body = Vec<Salon>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_salons(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let salons = app_state
        .salon_service
        .list_salons(&app_state.db_pool, &actor)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(salons))
}

// GET /api/salons/next-id
#[utoipa::path(
    get,
    path = "/api/salons/next-id",
    tag = "Salons",
    responses(
        (status = 200, description = "Próximo identificador de salon", body = NextSalonId)
    ),
    security(("api_jwt" = []))
)]
pub async fn preview_next_id(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<SuperAdminOnly>,
) -> Result<impl IntoResponse, ApiError> {
    let salon_id = app_state
        .salon_service
        .preview_next_id(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(NextSalonId { salon_id }))
}

// GET /api/salons/{salon_id}
#[utoipa::path(
    get,
    path = "/api/salons/{salon_id}",
    tag = "Salons",
    responses(
        (status = 200, description = "Dados do salon", body = Salon),
        (status = 404, description = "Salon não encontrado")
    ),
    params(("salon_id" = String, Path, description = "ID do salon", example = "Jaind_000")),
    security(("api_jwt" = []))
)]
pub async fn get_salon(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(salon_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let salon = app_state
        .salon_service
        .get_salon(&app_state.db_pool, &actor, &salon_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(salon))
}

// PUT /api/salons/{salon_id}
#[utoipa::path(
    put,
    path = "/api/salons/{salon_id}",
    tag = "Salons",
    request_body = UpdateSalonPayload,
    responses(
        (status = 200, description = "Salon atualizado", body = Salon)
    ),
    params(("salon_id" = String, Path, description = "ID do salon")),
    security(("api_jwt" = []))
)]
pub async fn update_salon(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
    Path(salon_id): Path<String>,
    Json(payload): Json<UpdateSalonPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let salon = app_state
        .salon_service
        .update_salon(&app_state.db_pool, &actor, &salon_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(salon))
}

// POST /api/salons/{salon_id}/deactivate
#[utoipa::path(
    post,
    path = "/api/salons/{salon_id}/deactivate",
    tag = "Salons",
    responses(
        (status = 200, description = "Salon desativado", body = Salon)
    ),
    params(("salon_id" = String, Path, description = "ID do salon")),
    security(("api_jwt" = []))
)]
pub async fn deactivate_salon(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireRole<SuperAdminOnly>,
    Path(salon_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let salon = app_state
        .salon_service
        .deactivate_salon(&app_state.db_pool, &actor, &salon_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(salon))
}
