// src/handlers/expenses.rs

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_extra::{headers::ContentType, TypedHeader};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        tenancy::{TenantContext, TenantScope},
    },
    models::{
        expense::{
            CreateExpensePayload, DocumentReferencePayload, DocumentUploadParams, Expense, ExpenseDocument,
            ExpenseFilter, ExpenseRecorded, ExpenseTotal, NewExpenseDocument, NextReference,
        },
        storage::StoredFile,
    },
};

// POST /api/expenses
#[utoipa::path(
    post,
    path = "/api/expenses",
    tag = "Expenses",
    request_body = CreateExpensePayload,
    responses(
        (status = 201, description = "Charge registrada", body = ExpenseRecorded),
        (status = 400, description = "Vínculos ou montante inválidos")
    ),
    params(
        ("x-salon-id" = Option<String>, Header, description = "Salon (obrigatório para o super_admin)")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_expense(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    TenantContext(salon_id): TenantContext,
    Json(payload): Json<CreateExpensePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let recorded = app_state
        .expense_service
        .record_expense(&app_state.db_pool, &actor, &salon_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(recorded)))
}

// GET /api/expenses
#[utoipa::path(
    get,
    path = "/api/expenses",
    tag = "Expenses",
    responses(
        (status = 200, description = "Charges do período", body = Vec<Expense>)
    ),
    params(
        ExpenseFilter,
        ("x-salon-id" = Option<String>, Header, description = "Salon (opcional para o super_admin)")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_expenses(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    scope: TenantScope,
    Query(filter): Query<ExpenseFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let expenses = app_state
        .expense_service
        .list_expenses(&actor, scope.0.as_deref(), &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(expenses))
}

// GET /api/expenses/total
#[utoipa::path(
    get,
    path = "/api/expenses/total",
    tag = "Expenses",
    responses(
        (status = 200, description = "Soma das charges do período", body = ExpenseTotal)
    ),
    params(
        ExpenseFilter,
        ("x-salon-id" = Option<String>, Header, description = "Salon (opcional para o super_admin)")
    ),
    security(("api_jwt" = []))
)]
pub async fn total_expenses(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    scope: TenantScope,
    Query(filter): Query<ExpenseFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let total = app_state
        .expense_service
        .total_expenses(&actor, scope.0.as_deref(), &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(total))
}

// GET /api/expenses/next-reference
#[utoipa::path(
    get,
    path = "/api/expenses/next-reference",
    tag = "Expenses",
    responses(
        (status = 200, description = "Sugestão de referência (nada é reservado)", body = NextReference)
    ),
    params(
        ("x-salon-id" = Option<String>, Header, description = "Salon (obrigatório para o super_admin)")
    ),
    security(("api_jwt" = []))
)]
pub async fn next_reference(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    TenantContext(salon_id): TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let reference = app_state
        .expense_service
        .preview_next_reference(&app_state.db_pool, &actor, &salon_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(NextReference { reference }))
}

// --- Justificativos ---

// POST /api/expenses/{id}/documents
#[utoipa::path(
    post,
    path = "/api/expenses/{id}/documents",
    tag = "Expenses",
    request_body(content = Vec<u8>, content_type = "application/octet-stream", description = "Conteúdo do arquivo"),
    responses(
        (status = 201, description = "Documento anexado", body = ExpenseDocument)
    ),
    params(("id" = Uuid, Path, description = "ID da charge"), DocumentUploadParams),
    security(("api_jwt" = []))
)]
pub async fn upload_document(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(charge_id): Path<Uuid>,
    Query(params): Query<DocumentUploadParams>,
    content_type: Option<TypedHeader<ContentType>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let doc = NewExpenseDocument {
        file_name: params.file_name,
        mime_type: content_type.map(|TypedHeader(ct)| ct.to_string()),
        description: params.description,
        file: StoredFile::Inline(body.to_vec()),
    };

    let document = app_state
        .expense_service
        .attach_document(&actor, charge_id, doc)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(document)))
}

// POST /api/expenses/{id}/documents/reference
#[utoipa::path(
    post,
    path = "/api/expenses/{id}/documents/reference",
    tag = "Expenses",
    request_body = DocumentReferencePayload,
    responses(
        (status = 201, description = "Documento registrado por caminho", body = ExpenseDocument)
    ),
    params(("id" = Uuid, Path, description = "ID da charge")),
    security(("api_jwt" = []))
)]
pub async fn reference_document(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(charge_id): Path<Uuid>,
    Json(payload): Json<DocumentReferencePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let doc = NewExpenseDocument {
        file_name: payload.file_name,
        mime_type: payload.mime_type,
        description: payload.description,
        file: StoredFile::Reference(payload.path),
    };

    let document = app_state
        .expense_service
        .attach_document(&actor, charge_id, doc)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(document)))
}

// GET /api/expenses/{id}/documents
#[utoipa::path(
    get,
    path = "/api/expenses/{id}/documents",
    tag = "Expenses",
    responses(
        (status = 200, description = "Metadados dos documentos da charge", body = Vec<ExpenseDocument>)
    ),
    params(("id" = Uuid, Path, description = "ID da charge")),
    security(("api_jwt" = []))
)]
pub async fn list_documents(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(charge_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let documents = app_state
        .expense_service
        .list_documents(&actor, charge_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(documents))
}

// GET /api/expenses/documents/{doc_id}
#[utoipa::path(
    get,
    path = "/api/expenses/documents/{doc_id}",
    tag = "Expenses",
    responses(
        (status = 200, description = "Conteúdo do documento", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 404, description = "Documento não encontrado")
    ),
    params(("doc_id" = Uuid, Path, description = "ID do documento")),
    security(("api_jwt" = []))
)]
pub async fn download_document(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(document_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let content = app_state
        .expense_service
        .get_document(&actor, document_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let bytes = content
        .file
        .load()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mime = content
        .meta
        .mime_type
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Ok((
        [
            (header::CONTENT_TYPE, mime),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", content.meta.file_name),
            ),
        ],
        bytes,
    ))
}
