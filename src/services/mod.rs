pub mod auth_service;
pub mod entry_service;
