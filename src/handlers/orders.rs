// src/handlers/orders.rs

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
        rbac::{AdminOnly, RequireRole},
        tenancy::TenantScope,
    },
    models::{
        history::HistoryEntry,
        order::{
            ClosePayload, ClosureOutcome, CreateOrderPayload, ImageUploadParams, Order, OrderFilter,
            OrderImageKind, OrderUpdate, PaymentPayload, PriceAdjustmentPayload, StatusChangePayload,
        },
        reminder::{DeliveryReminder, MarkReminderPayload},
        storage::StoredFile,
    },
};

// =============================================================================
//  1. CRIAÇÃO E LEITURA
// =============================================================================

// POST /api/orders
#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Orders",
    request_body = CreateOrderPayload,
    responses(
        (status = 201, description = "Commande criada", body = Order),
        (status = 400, description = "Montantes ou medidas inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<CreateOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .order_service
        .create_order(&app_state.db_pool, &actor, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(order)))
}

// GET /api/orders
#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Orders",
    responses(
        (status = 200, description = "Commandes do salon", body = Vec<Order>)
    ),
    params(
        OrderFilter,
        ("x-salon-id" = Option<String>, Header, description = "Salon (opcional para o super_admin)")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    scope: TenantScope,
    Query(filter): Query<OrderFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = app_state
        .order_service
        .list_orders(&actor, scope.0.as_deref(), &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(orders))
}

// GET /api/orders/balances
#[utoipa::path(
    get,
    path = "/api/orders/balances",
    tag = "Orders",
    responses(
        (status = 200, description = "Commandes abertas com saldo a receber", body = Vec<Order>)
    ),
    params(
        ("x-salon-id" = Option<String>, Header, description = "Salon (opcional para o super_admin)")
    ),
    security(("api_jwt" = []))
)]
pub async fn orders_with_balance(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    scope: TenantScope,
) -> Result<impl IntoResponse, ApiError> {
    let orders = app_state
        .order_service
        .orders_with_balance(&actor, scope.0.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(orders))
}

// GET /api/orders/{id}
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "Orders",
    responses(
        (status = 200, description = "Dados da commande", body = Order),
        (status = 404, description = "Commande não encontrada")
    ),
    params(("id" = Uuid, Path, description = "ID da commande")),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .order_service
        .get_order(&app_state.db_pool, &actor, order_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(order))
}

// GET /api/orders/{id}/history
#[utoipa::path(
    get,
    path = "/api/orders/{id}/history",
    tag = "Orders",
    responses(
        (status = 200, description = "Histórico em ordem de gravação", body = Vec<HistoryEntry>)
    ),
    params(("id" = Uuid, Path, description = "ID da commande")),
    security(("api_jwt" = []))
)]
pub async fn order_history(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let history = app_state
        .order_service
        .order_history(&app_state.db_pool, &actor, order_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(history))
}

// =============================================================================
//  2. OPERAÇÕES (pagamento, fechamento, status, preço)
// =============================================================================

// POST /api/orders/{id}/payments
#[utoipa::path(
    post,
    path = "/api/orders/{id}/payments",
    tag = "Orders",
    request_body = PaymentPayload,
    responses(
        (status = 200, description = "Pagamento registrado (ou pendente de validação)", body = OrderUpdate),
        (status = 400, description = "Montante inválido"),
        (status = 409, description = "Commande fechada")
    ),
    params(("id" = Uuid, Path, description = "ID da commande")),
    security(("api_jwt" = []))
)]
pub async fn record_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<PaymentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let update = app_state
        .order_service
        .record_payment(&app_state.db_pool, &actor, order_id, payload.montant, payload.commentaire)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(update))
}

// POST /api/orders/{id}/close
#[utoipa::path(
    post,
    path = "/api/orders/{id}/close",
    tag = "Orders",
    request_body = ClosePayload,
    responses(
        (status = 200, description = "Fechamento aplicado ou pedido registrado", body = ClosureOutcome),
        (status = 422, description = "Commande ainda não quitada")
    ),
    params(("id" = Uuid, Path, description = "ID da commande")),
    security(("api_jwt" = []))
)]
pub async fn close_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<ClosePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let outcome = app_state
        .order_service
        .close_order(&app_state.db_pool, &actor, order_id, payload.commentaire)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let status = if outcome.created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(outcome)))
}

// POST /api/orders/{id}/status
#[utoipa::path(
    post,
    path = "/api/orders/{id}/status",
    tag = "Orders",
    request_body = StatusChangePayload,
    responses(
        (status = 200, description = "Mudança aplicada ou pendente de validação", body = OrderUpdate),
        (status = 422, description = "Status final exige a commande quitada")
    ),
    params(("id" = Uuid, Path, description = "ID da commande")),
    security(("api_jwt" = []))
)]
pub async fn update_status(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<StatusChangePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let update = app_state
        .order_service
        .update_status(&app_state.db_pool, &actor, order_id, &payload.statut, payload.commentaire)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(update))
}

// PUT /api/orders/{id}/price
#[utoipa::path(
    put,
    path = "/api/orders/{id}/price",
    tag = "Orders",
    request_body = PriceAdjustmentPayload,
    responses(
        (status = 200, description = "Preço ajustado", body = OrderUpdate),
        (status = 403, description = "Reservado aos administradores")
    ),
    params(("id" = Uuid, Path, description = "ID da commande")),
    security(("api_jwt" = []))
)]
pub async fn adjust_price(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<PriceAdjustmentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let update = app_state
        .order_service
        .adjust_price(&app_state.db_pool, &actor, order_id, payload.prix_total, payload.commentaire)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(update))
}

// =============================================================================
//  3. ARQUIVOS (imagens e recibo PDF)
// =============================================================================

// PUT /api/orders/{id}/images/{kind}
#[utoipa::path(
    put,
    path = "/api/orders/{id}/images/{kind}",
    tag = "Orders",
    request_body(content = Vec<u8>, content_type = "image/*", description = "Bytes da imagem"),
    responses(
        (status = 200, description = "Imagem anexada", body = Order)
    ),
    params(
        ("id" = Uuid, Path, description = "ID da commande"),
        ("kind" = OrderImageKind, Path, description = "fabric | model"),
        ImageUploadParams
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_image(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path((order_id, kind)): Path<(Uuid, OrderImageKind)>,
    Query(params): Query<ImageUploadParams>,
    TypedHeader(content_type): TypedHeader<ContentType>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    if !content_type.to_string().starts_with("image/") {
        let err = AppError::InvalidInput(format!("type de fichier non supporté: {content_type}"));
        return Err(err.to_api_error(&locale, &app_state.i18n_store));
    }

    let order = app_state
        .order_service
        .attach_image(
            &app_state.db_pool,
            &actor,
            order_id,
            kind,
            StoredFile::Inline(body.to_vec()),
            params.name.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(order))
}

// GET /api/orders/{id}/images/{kind}
#[utoipa::path(
    get,
    path = "/api/orders/{id}/images/{kind}",
    tag = "Orders",
    responses(
        (status = 200, description = "Bytes da imagem", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 404, description = "Sem imagem")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da commande"),
        ("kind" = OrderImageKind, Path, description = "fabric | model")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_image(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path((order_id, kind)): Path<(Uuid, OrderImageKind)>,
) -> Result<impl IntoResponse, ApiError> {
    let image = app_state
        .order_service
        .get_image(&app_state.db_pool, &actor, order_id, kind)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let bytes = image
        .file
        .load()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], bytes))
}

// POST /api/orders/{id}/pdf
#[utoipa::path(
    post,
    path = "/api/orders/{id}/pdf",
    tag = "Orders",
    responses(
        (status = 200, description = "Recibo PDF gerado", body = Vec<u8>, content_type = "application/pdf"),
        (status = 500, description = "Falha ao gerar o PDF (ex: fonte ausente)")
    ),
    params(("id" = Uuid, Path, description = "ID da commande")),
    security(("api_jwt" = []))
)]
pub async fn generate_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let pdf_bytes = app_state
        .document_service
        .generate_order_pdf(&app_state.db_pool, &actor, order_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(pdf_response(&format!("commande_{order_id}.pdf"), pdf_bytes))
}

// GET /api/orders/{id}/pdf
#[utoipa::path(
    get,
    path = "/api/orders/{id}/pdf",
    tag = "Orders",
    responses(
        (status = 200, description = "Último recibo gerado", body = Vec<u8>, content_type = "application/pdf"),
        (status = 404, description = "Nenhum recibo gerado")
    ),
    params(("id" = Uuid, Path, description = "ID da commande")),
    security(("api_jwt" = []))
)]
pub async fn get_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (name, pdf_bytes) = app_state
        .document_service
        .get_pdf(&app_state.db_pool, &actor, order_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(pdf_response(&name, pdf_bytes))
}

fn pdf_response(file_name: &str, bytes: Vec<u8>) -> impl IntoResponse + use<> {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, format!("inline; filename=\"{file_name}\"")),
        ],
        bytes,
    )
}

// =============================================================================
//  4. LEMBRETES
// =============================================================================

// POST /api/orders/{id}/reminders
#[utoipa::path(
    post,
    path = "/api/orders/{id}/reminders",
    tag = "Orders",
    request_body = MarkReminderPayload,
    responses(
        (status = 201, description = "Lembrete registrado", body = DeliveryReminder),
        (status = 409, description = "Lembrete já registrado para esta data")
    ),
    params(("id" = Uuid, Path, description = "ID da commande")),
    security(("api_jwt" = []))
)]
pub async fn mark_reminder(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<MarkReminderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let reminder = app_state
        .reminder_service
        .mark_reminder_sent(&app_state.db_pool, &actor, order_id, payload.date_livraison)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?
        .ok_or_else(|| {
            AppError::Conflict("rappel déjà enregistré pour cette date".into())
                .to_api_error(&locale, &app_state.i18n_store)
        })?;

    Ok((StatusCode::CREATED, Json(reminder)))
}

// GET /api/orders/{id}/reminders
#[utoipa::path(
    get,
    path = "/api/orders/{id}/reminders",
    tag = "Orders",
    responses(
        (status = 200, description = "Lembretes já registrados", body = Vec<DeliveryReminder>)
    ),
    params(("id" = Uuid, Path, description = "ID da commande")),
    security(("api_jwt" = []))
)]
pub async fn list_reminders(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let reminders = app_state
        .reminder_service
        .list_for_order(&app_state.db_pool, &actor, order_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(reminders))
}
