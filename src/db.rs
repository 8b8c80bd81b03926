pub mod user_repo;
pub use user_repo::UserRepository;
pub mod salon_repo;
pub use salon_repo::SalonRepository;
pub mod client_repo;
pub use client_repo::ClientRepository;
pub mod order_repo;
pub use order_repo::OrderRepository;
pub mod history_repo;
pub use history_repo::HistoryRepository;
pub mod expense_repo;
pub use expense_repo::ExpenseRepository;
pub mod logo_repo;
pub use logo_repo::LogoRepository;
pub mod reminder_repo;
pub use reminder_repo::ReminderRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
