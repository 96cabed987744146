//! Configuration module for the Harmony backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared pastor credential for the admin gate. Absent means the
    /// gate degrades to a disabled-login state: reader routes keep
    /// working, admin routes refuse.
    pub admin_password: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let admin_password = env::var("HARMONY_ADMIN_PASSWORD").ok();

        let db_path = env::var("HARMONY_DB_PATH")
            .unwrap_or_else(|_| "./data/harmony.sqlite".to_string())
            .into();

        let bind_addr = env::var("HARMONY_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid HARMONY_BIND_ADDR format");

        let log_level = env::var("HARMONY_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            admin_password,
            db_path,
            bind_addr,
            log_level,
        }
    }
}
