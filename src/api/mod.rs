pub mod account;
pub mod analytics;
pub mod tasks;
