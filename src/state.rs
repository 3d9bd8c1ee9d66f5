// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{config::Config, error::AppError, store::Store, utils::hash::AdminCredential};

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Config,
    /// `None` when no admin credential is configured; admin login then
    /// always fails.
    pub admin: Option<Arc<AdminCredential>>,
}

impl AppState {
    /// Builds the state, hashing the configured admin password once.
    pub fn new(store: Arc<dyn Store>, config: Config) -> Result<Self, AppError> {
        let admin = match (&config.admin_email, &config.admin_password) {
            (Some(email), Some(password)) => Some(Arc::new(AdminCredential::new(email, password)?)),
            _ => {
                tracing::warn!("ADMIN_EMAIL/ADMIN_PASSWORD not set; admin console disabled");
                None
            }
        };
        Ok(Self { store, config, admin })
    }
}

impl FromRef<AppState> for Arc<dyn Store> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
