use anyhow::{Context, Result};
use std::{env, str::FromStr, time::Duration};

pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        let database = DatabaseConfig {
            url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://rollcall.db".into()),
            max_connections: var_or("DATABASE_MAX_CONNECTIONS", 5)?,
        };
        let server = ServerConfig {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: var_or("PORT", 8080)?,
            request_timeout: Duration::from_secs(var_or("REQUEST_TIMEOUT_SECS", 30)?),
        };
        Ok(Self { database, server })
    }
}

pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
}

fn var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(v) => v.parse().with_context(|| format!("invalid value for {key}: {v}")),
        Err(_) => Ok(default),
    }
}
