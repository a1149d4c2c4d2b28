//! Creates the admin account, or resets its password and role if it exists.
//!
//! Reads `ADMIN_EMAIL`, `ADMIN_PASSWORD` and optionally `ADMIN_NAME`.

use std::env;

use anyhow::{bail, Context};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;

use eventkoi_server::auth::PasswordService;
use eventkoi_server::config::Config;
use eventkoi_server::models::UserRole;
use eventkoi_server::repos::{NewUser, UserRepo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let email = env::var("ADMIN_EMAIL").context("ADMIN_EMAIL must be set")?;
    let password = env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD must be set")?;
    let name = env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string());

    if !email.contains('@') {
        bail!("ADMIN_EMAIL is not an email address: '{}'", email);
    }
    PasswordService::validate_password_strength(&password)
        .map_err(|e| anyhow::anyhow!("ADMIN_PASSWORD rejected: {}", e))?;

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let password_hash = PasswordService::hash_password(&password)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;

    let admin = UserRepo::new(pool)
        .upsert(NewUser {
            name,
            email,
            password_hash,
            role: UserRole::Admin,
            is_verified: true,
            phone: None,
            designation: Some("Administrator".to_string()),
        })
        .await
        .context("Failed to save admin account")?;

    tracing::info!(user_id = %admin.id, email = %admin.email, "Admin account ready");
    Ok(())
}
