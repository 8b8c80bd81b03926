// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::users::create_user,
        handlers::users::list_users,
        handlers::users::set_user_active,
        handlers::users::change_password,
        handlers::users::delete_user,

        // --- Salons ---
        handlers::salons::create_salon,
        handlers::salons::list_salons,
        handlers::salons::preview_next_id,
        handlers::salons::get_salon,
        handlers::salons::update_salon,
        handlers::salons::deactivate_salon,

        // --- Clients ---
        handlers::clients::create_client,
        handlers::clients::list_clients,
        handlers::clients::get_client,

        // --- Catalog ---
        handlers::catalog::list_models,
        handlers::catalog::expected_measurements,

        // --- Orders ---
        handlers::orders::create_order,
        handlers::orders::list_orders,
        handlers::orders::orders_with_balance,
        handlers::orders::get_order,
        handlers::orders::order_history,
        handlers::orders::record_payment,
        handlers::orders::close_order,
        handlers::orders::update_status,
        handlers::orders::adjust_price,
        handlers::orders::upload_image,
        handlers::orders::get_image,
        handlers::orders::generate_pdf,
        handlers::orders::get_pdf,
        handlers::orders::mark_reminder,
        handlers::orders::list_reminders,

        // --- Approvals ---
        handlers::approvals::list_pending,
        handlers::approvals::approve,
        handlers::approvals::reject,

        // --- Expenses ---
        handlers::expenses::create_expense,
        handlers::expenses::list_expenses,
        handlers::expenses::total_expenses,
        handlers::expenses::next_reference,
        handlers::expenses::upload_document,
        handlers::expenses::reference_document,
        handlers::expenses::list_documents,
        handlers::expenses::download_document,

        // --- Branding ---
        handlers::branding::upload_logo,
        handlers::branding::get_logo,
        handlers::branding::delete_logo,

        // --- Reminders ---
        handlers::reminders::run_reminders,

        // --- Dashboard ---
        handlers::dashboard::get_summary,
        handlers::dashboard::get_status_breakdown,
        handlers::dashboard::get_top_models,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::Couturier,
            models::auth::LoginPayload,
            models::auth::AuthResponse,
            models::auth::CreateUserPayload,
            models::auth::ChangePasswordPayload,
            models::auth::SetActivePayload,

            // --- Salons ---
            models::salon::Salon,
            models::salon::AdminAccountPayload,
            models::salon::CreateSalonPayload,
            models::salon::UpdateSalonPayload,
            models::salon::NextSalonId,
            models::salon::SalonCreated,

            // --- Clients ---
            models::client::Client,
            models::client::CreateClientPayload,
            models::client::ClientCreated,

            // --- Catalog ---
            models::measurements::GarmentModel,

            // --- Orders ---
            models::order::Order,
            models::order::CreateOrderPayload,
            models::order::PaymentPayload,
            models::order::ClosePayload,
            models::order::StatusChangePayload,
            models::order::PriceAdjustmentPayload,
            models::order::OrderUpdate,
            models::order::ClosureOutcome,
            models::order::OrderImageKind,

            // --- Histórico e validações ---
            models::history::HistoryAction,
            models::history::ValidationStatus,
            models::history::HistoryEntry,
            models::history::PendingValidation,
            models::history::ApprovePayload,
            models::history::RejectPayload,
            models::history::DecisionOutcome,

            // --- Expenses ---
            models::expense::ExpenseType,
            models::expense::Expense,
            models::expense::CreateExpensePayload,
            models::expense::ExpenseRecorded,
            models::expense::ExpenseTotal,
            models::expense::NextReference,
            models::expense::ExpenseDocument,
            models::expense::DocumentReferencePayload,

            // --- Branding ---
            models::logo::Logo,

            // --- Reminders ---
            models::reminder::DeliveryReminder,
            models::reminder::MarkReminderPayload,
            models::reminder::ReminderSweepReport,

            // --- Dashboard ---
            models::dashboard::DashboardSummary,
            models::dashboard::StatusBreakdownEntry,
            models::dashboard::TopModelEntry,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação"),
        (name = "Users", description = "Couturiers e perfil"),
        (name = "Salons", description = "Gestão de salons (super_admin)"),
        (name = "Clients", description = "Clientes do salon"),
        (name = "Catalog", description = "Modelos e medidas esperadas"),
        (name = "Orders", description = "Commandes, pagamentos, arquivos e recibos"),
        (name = "Approvals", description = "Fila de validação dos administradores"),
        (name = "Expenses", description = "Charges e justificativos"),
        (name = "Branding", description = "Logo do salon"),
        (name = "Reminders", description = "Lembretes de entrega"),
        (name = "Dashboard", description = "Indicadores gerenciais")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_secured_order_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/orders/{id}/payments"));
        assert!(doc.paths.paths.contains_key("/api/approvals/{id}/reject"));

        let components = doc.components.expect("componentes");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
