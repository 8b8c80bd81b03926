// src/lib.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

/// Monta o router completo. Tudo fora de `/api/health` e `/api/auth` passa
/// pelo `auth_guard`.
pub fn app(app_state: AppState) -> Router {
    // Rotas públicas
    let auth_routes = Router::new().route("/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route("/", post(handlers::users::create_user).get(handlers::users::list_users))
        .route("/me", get(handlers::auth::get_me))
        .route("/{id}", delete(handlers::users::delete_user))
        .route("/{id}/active", put(handlers::users::set_user_active))
        .route("/{id}/password", put(handlers::users::change_password));

    let salon_routes = Router::new()
        .route("/", post(handlers::salons::create_salon).get(handlers::salons::list_salons))
        .route("/next-id", get(handlers::salons::preview_next_id))
        .route(
            "/{salon_id}",
            get(handlers::salons::get_salon).put(handlers::salons::update_salon),
        )
        .route("/{salon_id}/deactivate", post(handlers::salons::deactivate_salon));

    let client_routes = Router::new()
        .route("/", post(handlers::clients::create_client).get(handlers::clients::list_clients))
        .route("/{id}", get(handlers::clients::get_client));

    let catalog_routes = Router::new()
        .route("/models", get(handlers::catalog::list_models))
        .route("/measurements", get(handlers::catalog::expected_measurements));

    let order_routes = Router::new()
        .route("/", post(handlers::orders::create_order).get(handlers::orders::list_orders))
        .route("/balances", get(handlers::orders::orders_with_balance))
        .route("/{id}", get(handlers::orders::get_order))
        .route("/{id}/history", get(handlers::orders::order_history))
        .route("/{id}/payments", post(handlers::orders::record_payment))
        .route("/{id}/close", post(handlers::orders::close_order))
        .route("/{id}/status", post(handlers::orders::update_status))
        .route("/{id}/price", put(handlers::orders::adjust_price))
        .route(
            "/{id}/images/{kind}",
            put(handlers::orders::upload_image).get(handlers::orders::get_image),
        )
        .route(
            "/{id}/pdf",
            post(handlers::orders::generate_pdf).get(handlers::orders::get_pdf),
        )
        .route(
            "/{id}/reminders",
            post(handlers::orders::mark_reminder).get(handlers::orders::list_reminders),
        );

    let approval_routes = Router::new()
        .route("/", get(handlers::approvals::list_pending))
        .route("/{id}/approve", post(handlers::approvals::approve))
        .route("/{id}/reject", post(handlers::approvals::reject));

    let expense_routes = Router::new()
        .route("/", post(handlers::expenses::create_expense).get(handlers::expenses::list_expenses))
        .route("/total", get(handlers::expenses::total_expenses))
        .route("/next-reference", get(handlers::expenses::next_reference))
        .route(
            "/{id}/documents",
            post(handlers::expenses::upload_document).get(handlers::expenses::list_documents),
        )
        .route("/{id}/documents/reference", post(handlers::expenses::reference_document))
        .route("/documents/{doc_id}", get(handlers::expenses::download_document));

    let branding_routes = Router::new().route(
        "/logo",
        put(handlers::branding::upload_logo)
            .get(handlers::branding::get_logo)
            .delete(handlers::branding::delete_logo),
    );

    let reminder_routes = Router::new().route("/run", post(handlers::reminders::run_reminders));

    let dashboard_routes = Router::new()
        .route("/summary", get(handlers::dashboard::get_summary))
        .route("/statuses", get(handlers::dashboard::get_status_breakdown))
        .route("/top-models", get(handlers::dashboard::get_top_models));

    let protected = Router::new()
        .nest("/api/users", user_routes)
        .nest("/api/salons", salon_routes)
        .nest("/api/clients", client_routes)
        .nest("/api/catalog", catalog_routes)
        .nest("/api/orders", order_routes)
        .nest("/api/approvals", approval_routes)
        .nest("/api/expenses", expense_routes)
        .nest("/api/branding", branding_routes)
        .nest("/api/reminders", reminder_routes)
        .nest("/api/dashboard", dashboard_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .merge(protected)
        .with_state(app_state)
}
