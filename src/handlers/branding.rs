// src/handlers/branding.rs

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_extra::{headers::ContentType, TypedHeader};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::TenantContext},
    models::logo::{Logo, LogoUploadParams, NewLogo},
};

// PUT /api/branding/logo
#[utoipa::path(
    put,
    path = "/api/branding/logo",
    tag = "Branding",
    request_body(content = Vec<u8>, content_type = "image/*", description = "Imagem do logo"),
    responses(
        (status = 200, description = "Logo gravado (substitui o anterior)", body = Logo),
        (status = 400, description = "Tipo ou tamanho inválido")
    ),
    params(
        LogoUploadParams,
        ("x-salon-id" = Option<String>, Header, description = "Salon (obrigatório para o super_admin)")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_logo(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    TenantContext(salon_id): TenantContext,
    Query(params): Query<LogoUploadParams>,
    TypedHeader(content_type): TypedHeader<ContentType>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let logo = NewLogo {
        logo_name: params.name.unwrap_or_else(|| format!("logo_{salon_id}")),
        mime_type: content_type.to_string(),
        description: params.description,
        data: body.to_vec(),
    };

    let saved = app_state
        .branding_service
        .upload_logo(&actor, &salon_id, logo)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(saved))
}

// GET /api/branding/logo
#[utoipa::path(
    get,
    path = "/api/branding/logo",
    tag = "Branding",
    responses(
        (status = 200, description = "Imagem do logo", body = Vec<u8>, content_type = "image/*"),
        (status = 404, description = "Salon sem logo")
    ),
    params(
        ("x-salon-id" = Option<String>, Header, description = "Salon (obrigatório para o super_admin)")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_logo(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    TenantContext(salon_id): TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let logo = app_state
        .branding_service
        .get_logo(&actor, &salon_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(([(header::CONTENT_TYPE, logo.meta.mime_type)], logo.logo_data))
}

// DELETE /api/branding/logo
#[utoipa::path(
    delete,
    path = "/api/branding/logo",
    tag = "Branding",
    responses(
        (status = 204, description = "Logo removido"),
        (status = 404, description = "Salon sem logo")
    ),
    params(
        ("x-salon-id" = Option<String>, Header, description = "Salon (obrigatório para o super_admin)")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_logo(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    TenantContext(salon_id): TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .branding_service
        .delete_logo(&actor, &salon_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
