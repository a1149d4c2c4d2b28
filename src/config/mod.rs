use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context};

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEV_JWT_SECRET: &str = "eventkoi-dev-secret-change-me";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_expiration_hours: u64,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub reminder_interval: Duration,
    pub reminder_lead: chrono::Duration,
    pub cors_allowed_origins: String,
    pub production: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let production = env::var("RUST_ENV")
            .map(|v| v.to_lowercase() == "production")
            .unwrap_or(false);

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ if production => bail!("JWT_SECRET must be set when RUST_ENV=production"),
            _ => {
                tracing::warn!("JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/eventkoi".to_string()),
            bind_addr: parse_var("BIND_ADDR", "0.0.0.0:3001")?,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", "5")?,
            jwt_secret,
            jwt_expiration_hours: parse_var("JWT_EXPIRATION_HOURS", "24")?,
            upload_dir: PathBuf::from(
                env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string()),
            ),
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", "10485760")?,
            reminder_interval: Duration::from_secs(parse_var("REMINDER_INTERVAL_SECS", "60")?),
            reminder_lead: chrono::Duration::minutes(parse_var("REMINDER_LEAD_MINUTES", "1440")?),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string()),
            production,
        })
    }

    /// Configuration for tests and tools that never touch the environment.
    pub fn for_tests() -> Self {
        Self {
            database_url: "postgres://localhost/eventkoi_test".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            db_max_connections: 5,
            jwt_secret: "test-secret".to_string(),
            jwt_expiration_hours: 1,
            upload_dir: env::temp_dir().join("eventkoi-test-uploads"),
            max_upload_bytes: 1024 * 1024,
            reminder_interval: Duration::from_secs(60),
            reminder_lead: chrono::Duration::minutes(60),
            cors_allowed_origins: DEFAULT_ALLOWED_ORIGINS.to_string(),
            production: false,
        }
    }
}

fn parse_var<T>(key: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("{} has an invalid value: '{}'", key, raw))
}
