// src/handlers/reminders.rs

use axum::{extract::State, response::IntoResponse, Json};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{AdminOnly, RequireRole},
        tenancy::TenantScope,
    },
    models::reminder::ReminderSweepReport,
};

// POST /api/reminders/run
#[utoipa::path(
    post,
    path = "/api/reminders/run",
    tag = "Reminders",
    responses(
        (status = 200, description = "Varredura do salon executada agora", body = ReminderSweepReport),
        (status = 403, description = "Reservado aos administradores")
    ),
    params(
        ("x-salon-id" = Option<String>, Header, description = "Salon (sem cabeçalho, o super_admin varre todos)")
    ),
    security(("api_jwt" = []))
)]
pub async fn run_reminders(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireRole<AdminOnly>,
    scope: TenantScope,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .reminder_service
        .run_now(&actor, scope.0.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(report))
}
