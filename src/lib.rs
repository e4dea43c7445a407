pub mod agenda;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod schema;
pub mod state;
pub mod utils;
