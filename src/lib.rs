pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod security;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};

use services::AccountService;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub accounts: Arc<AccountService>,
}
