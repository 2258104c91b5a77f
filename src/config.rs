use anyhow::Context;
use serde::Deserialize;

/// Tokens stay valid for 30 days unless `JWT_TTL_MINUTES` says otherwise.
pub const DEFAULT_TTL_MINUTES: i64 = 30 * 24 * 60;

/// Upper bound on `JWT_TTL_MINUTES`: ten years.
pub const MAX_TTL_MINUTES: i64 = 10 * 366 * 24 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://kartsique.db".into());
        let secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }
        let jwt = JwtConfig {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "kartsique".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "kartsique-users".into()),
            ttl_minutes: parse_ttl_minutes(std::env::var("JWT_TTL_MINUTES").ok().as_deref())?,
        };
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = std::env::var("APP_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8000);
        Ok(Self {
            database_url,
            host,
            port,
            jwt,
        })
    }
}

/// Unset means the default; anything else must be a whole number of minutes
/// in `1..=MAX_TTL_MINUTES`.
pub fn parse_ttl_minutes(raw: Option<&str>) -> anyhow::Result<i64> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_TTL_MINUTES);
    };
    let minutes = raw
        .trim()
        .parse::<i64>()
        .with_context(|| format!("JWT_TTL_MINUTES must be a number of minutes, got {raw:?}"))?;
    if minutes <= 0 {
        anyhow::bail!("JWT_TTL_MINUTES must be positive, got {minutes}");
    }
    if minutes > MAX_TTL_MINUTES {
        anyhow::bail!("JWT_TTL_MINUTES must be at most {MAX_TTL_MINUTES}, got {minutes}");
    }
    Ok(minutes)
}
