//! Application Configuration
//! Mission: Load all runtime settings from the environment once, at startup

use dotenv::dotenv;
use std::env;

/// Runtime configuration, resolved from environment variables with
/// development defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub jwt: JwtConfig,
}

/// JWT signing material and lifetimes. TTLs are whole hours; 0 means the
/// token expires immediately, never "no expiry".
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub access_ttl_hours: i64,
    pub refresh_secret: String,
    pub refresh_ttl_hours: i64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8080);

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "./authd.db".to_string());

        Self {
            port,
            database_path,
            jwt: JwtConfig {
                access_secret: env::var("JWT_SECRET")
                    .unwrap_or_else(|_| "dev-access-secret-change-in-production".to_string()),
                access_ttl_hours: env_hours("JWT_EXPIRATION_HOURS", 24),
                refresh_secret: env::var("JWT_REFRESH_SECRET")
                    .unwrap_or_else(|_| "dev-refresh-secret-change-in-production".to_string()),
                refresh_ttl_hours: env_hours("JWT_REFRESH_EXPIRATION_HOURS", 168),
            },
        }
    }
}

fn env_hours(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|&v| v >= 0)
        .unwrap_or(default)
}
