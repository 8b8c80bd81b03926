// src/handlers/users.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
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
        tenancy::TenantContext,
    },
    models::auth::{ChangePasswordPayload, Couturier, CreateUserPayload, SetActivePayload},
};

// POST /api/users
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Couturier criado", body = Couturier),
        (status = 403, description = "Sem permissão para o salon ou papel"),
        (status = 409, description = "Código já utilizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let user = app_state
        .user_service
        .create_user(&app_state.db_pool, &actor, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(user)))
}

// GET /api/users
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "Couturiers do salon", body = Vec<Couturier>)
    ),
    params(
        ("x-salon-id" = Option<String>, Header, description = "Salon (obrigatório para o super_admin)")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let users = app_state
        .user_service
        .list_users(&app_state.db_pool, &actor, &tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(users))
}

// PUT /api/users/{id}/active
#[utoipa::path(
    put,
    path = "/api/users/{id}/active",
    tag = "Users",
    request_body = SetActivePayload,
    responses(
        (status = 200, description = "Conta atualizada", body = Couturier),
        (status = 404, description = "Usuário não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do couturier")),
    security(("api_jwt" = []))
)]
pub async fn set_user_active(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<SetActivePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let user = app_state
        .user_service
        .set_active(&app_state.db_pool, &actor, user_id, payload.actif)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(user))
}

// PUT /api/users/{id}/password
#[utoipa::path(
    put,
    path = "/api/users/{id}/password",
    tag = "Users",
    request_body = ChangePasswordPayload,
    responses(
        (status = 204, description = "Senha alterada"),
        (status = 403, description = "Sem permissão sobre a conta")
    ),
    params(("id" = Uuid, Path, description = "ID do couturier")),
    security(("api_jwt" = []))
)]
pub async fn change_password(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<ChangePasswordPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .user_service
        .change_password(&app_state.db_pool, &actor, user_id, &payload.new_password)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// DELETE /api/users/{id}
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    responses(
        (status = 204, description = "Couturier removido"),
        (status = 409, description = "Couturier ainda referenciado por commandes")
    ),
    params(("id" = Uuid, Path, description = "ID do couturier")),
    security(("api_jwt" = []))
)]
pub async fn delete_user(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .user_service
        .delete_user(&app_state.db_pool, &actor, user_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
