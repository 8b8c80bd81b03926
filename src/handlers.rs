pub mod approvals;
pub mod auth;
pub mod branding;
pub mod catalog;
pub mod clients;
pub mod dashboard;
pub mod expenses;
pub mod orders;
pub mod reminders;
pub mod salons;
pub mod users;
