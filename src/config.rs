// src/config.rs

use std::env;
use std::net::SocketAddr;
use dotenvy::dotenv;

/// Lowest class level a question or account may carry.
pub const MIN_CLASS_LEVEL: u8 = 1;
/// Highest class level a question or account may carry.
pub const MAX_CLASS_LEVEL: u8 = 10;
/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 6;
/// Percentage at or above which a result is rated "Great".
pub const GREAT_PERCENTAGE: u32 = 70;
/// Percentage at or above which a result is rated "Good".
pub const GOOD_PERCENTAGE: u32 = 50;

/// Which storage adapter backs the question bank and the account store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// `DATABASE_URL`; a local file keeps accounts and attempts across restarts.
    Sqlite,
    /// Process-lifetime only. For development and tests: a restart forgets
    /// every attempt, so the one-attempt rule does not hold across runs.
    Memory,
}

impl StorageBackend {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "memory" => StorageBackend::Memory,
            _ => StorageBackend::Sqlite,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub storage: StorageBackend,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: SocketAddr,
    pub cors_origins: Vec<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://scholar_quiz.db?mode=rwc".to_string());

        let storage = env::var("STORAGE_BACKEND")
            .map(|raw| StorageBackend::parse(&raw))
            .unwrap_or(StorageBackend::Sqlite);

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(86_400);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:5173".to_string(),
                    "http://127.0.0.1:5173".to_string(),
                ]
            });

        let admin_email = env::var("ADMIN_EMAIL").ok().filter(|v| !v.trim().is_empty());
        let admin_password = env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty());

        Self {
            database_url,
            storage,
            jwt_secret,
            jwt_expiration,
            rust_log,
            bind_addr,
            cors_origins,
            admin_email,
            admin_password,
        }
    }

    /// Configuration for tests and embedded use: in-memory SQLite, no env lookups.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            storage: StorageBackend::Sqlite,
            jwt_secret: jwt_secret.to_string(),
            jwt_expiration: 600,
            rust_log: "error".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            cors_origins: Vec::new(),
            admin_email: None,
            admin_password: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_backend_defaults_to_sqlite() {
        assert_eq!(StorageBackend::parse("memory"), StorageBackend::Memory);
        assert_eq!(StorageBackend::parse(" Memory "), StorageBackend::Memory);
        assert_eq!(StorageBackend::parse("local"), StorageBackend::Sqlite);
        assert_eq!(StorageBackend::parse("sqlite"), StorageBackend::Sqlite);
        assert_eq!(StorageBackend::parse("whatever"), StorageBackend::Sqlite);
    }
}
