pub mod app_storage;
pub mod tasks;
pub mod users;
