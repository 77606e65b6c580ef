pub mod app;
pub mod auth;
pub mod budgets;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod database;
pub mod listing;
pub mod logging;
pub mod models;
pub mod savings;
pub mod stats;
pub mod transactions;
pub mod utils;
