use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder secrets that must never sign real sessions.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

/// One year.
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub token_ttl_hours: i64,
    pub allowed_origin: Option<String>,
    pub max_avatar_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("CHIRP_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("CHIRP_JWT_SECRET is unset or still a placeholder");
        }

        let port: u16 = match get("CHIRP_PORT") {
            Some(raw) => raw.parse().context("CHIRP_PORT must be a port number")?,
            None => 3000,
        };
        let token_ttl_hours: i64 = match get("CHIRP_TOKEN_TTL_HOURS") {
            Some(raw) => raw
                .parse()
                .context("CHIRP_TOKEN_TTL_HOURS must be a whole number of hours")?,
            None => 24,
        };
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&token_ttl_hours) {
            bail!("CHIRP_TOKEN_TTL_HOURS must be between 1 and {MAX_TOKEN_TTL_HOURS}");
        }
        let max_avatar_bytes: usize = match get("CHIRP_MAX_AVATAR_BYTES") {
            Some(raw) => raw
                .parse()
                .context("CHIRP_MAX_AVATAR_BYTES must be a byte count")?,
            None => 2 * 1024 * 1024,
        };

        Ok(Self {
            jwt_secret,
            db_path: get("CHIRP_DB_PATH").unwrap_or_else(|| "chirp.db".into()).into(),
            host: get("CHIRP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            token_ttl_hours,
            allowed_origin: get("CHIRP_ALLOWED_ORIGIN").filter(|o| !o.is_empty()),
            max_avatar_bytes,
        })
    }
}
