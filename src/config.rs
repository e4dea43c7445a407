use std::env;

use chrono::{FixedOffset, Offset, Utc};
use dotenvy::dotenv;

use crate::utils::offset_from_minutes;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub database_root_path: String,
    pub host: String,
    pub port: u16,
    /// Session lifetime in seconds
    pub token_ttl_secs: u64,
    pub bcrypt_cost: u32,
    pub min_password_len: usize,
    /// Minutes east of UTC used when a request carries no offset
    pub default_tz_offset: i32,
    /// How often live subscribers get a fresh snapshot without any mutation
    pub live_refresh_secs: u64,
    pub cors_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "default_jwt_secret_change_in_production".to_string(),
            database_root_path: "./data".to_string(),
            host: "0.0.0.0".to_string(),
            port: 3069,
            token_ttl_secs: 7 * 24 * 3600,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            min_password_len: 6,
            default_tz_offset: 0,
            live_refresh_secs: 60,
            cors_origins: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load .env file if it exists
        dotenv().ok();
        let defaults = Self::default();

        let jwt_secret = env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret);

        let database_root_path =
            env::var("DATABASE_ROOT_PATH").unwrap_or(defaults.database_root_path);

        let host = env::var("HOST").unwrap_or(defaults.host);

        let port = env::var("PORT")
            .unwrap_or_else(|_| defaults.port.to_string())
            .parse::<u16>()?;

        let token_ttl_secs = env::var("TOKEN_TTL_SECS")
            .unwrap_or_else(|_| defaults.token_ttl_secs.to_string())
            .parse::<u64>()?;

        let bcrypt_cost = env::var("BCRYPT_COST")
            .unwrap_or_else(|_| defaults.bcrypt_cost.to_string())
            .parse::<u32>()?;

        let min_password_len = env::var("MIN_PASSWORD_LEN")
            .unwrap_or_else(|_| defaults.min_password_len.to_string())
            .parse::<usize>()?;

        let default_tz_offset = env::var("DEFAULT_TZ_OFFSET")
            .unwrap_or_else(|_| defaults.default_tz_offset.to_string())
            .parse::<i32>()?;
        if offset_from_minutes(default_tz_offset).is_none() {
            return Err(format!("DEFAULT_TZ_OFFSET out of range: {default_tz_offset}").into());
        }

        let live_refresh_secs = env::var("LIVE_REFRESH_SECS")
            .unwrap_or_else(|_| defaults.live_refresh_secs.to_string())
            .parse::<u64>()?;

        // Origins contain ':' so the list is comma separated
        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| String::new())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();

        Ok(Self {
            jwt_secret,
            database_root_path,
            host,
            port,
            token_ttl_secs,
            bcrypt_cost,
            min_password_len,
            default_tz_offset,
            live_refresh_secs: live_refresh_secs.max(1),
            cors_origins,
        })
    }

    pub fn default_offset(&self) -> FixedOffset {
        offset_from_minutes(self.default_tz_offset).unwrap_or_else(|| Utc.fix())
    }
}
