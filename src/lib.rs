pub mod api;
pub mod clients;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod notifications;
pub mod utils;
pub mod worker;
