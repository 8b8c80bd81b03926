pub mod auth;
pub mod client;
pub mod dashboard;
pub mod expense;
pub mod history;
pub mod logo;
pub mod measurements;
pub mod order;
pub mod reminder;
pub mod salon;
pub mod storage;
