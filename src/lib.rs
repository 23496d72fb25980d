pub mod config;
pub mod models;
pub mod chain;
pub mod services;
pub mod handlers;
pub mod utils;
pub mod error;

pub use error::types::*;

use std::sync::Arc;

use crate::services::{delegation_manager::DelegationManager, risk_engine::RiskEngine};

/// Shared state handed to every axum handler.
#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub risk_engine: Arc<RiskEngine>,
    pub delegation_manager: Arc<DelegationManager>,
}
