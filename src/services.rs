pub mod access;
pub mod approval_service;
pub mod auth;
pub mod branding_service;
pub mod client_service;
pub mod dashboard_service;
pub mod document_service;
pub mod expense_service;
pub mod image_optimizer;
pub mod order_service;
pub mod reminder_service;
pub mod salon_service;
pub mod user_service;
