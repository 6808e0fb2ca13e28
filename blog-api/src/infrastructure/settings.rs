use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use sqlx::postgres::{PgConnectOptions, PgSslMode};

#[derive(Debug, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub pool: PoolSettings,
    pub http_addr: String,
    pub cors_origins: Vec<String>,
    pub log_level: String,
    pub log_format: LogFormat,
    pub http_request_body_limit_bytes: usize,
    pub http_concurrency_limit: usize,
    pub http_request_timeout_secs: u64,
}

/// Where the store lives: either a full URL or discrete connection parts.
#[derive(Clone)]
pub enum DatabaseSettings {
    Url(String),
    Parts {
        host: String,
        port: u16,
        user: String,
        password: String,
        name: String,
        ssl_mode: String,
    },
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(_) => f.debug_tuple("Url").field(&"[REDACTED]").finish(),
            Self::Parts {
                host,
                port,
                user,
                name,
                ssl_mode,
                ..
            } => f
                .debug_struct("Parts")
                .field("host", host)
                .field("port", port)
                .field("user", user)
                .field("password", &"[REDACTED]")
                .field("name", name)
                .field("ssl_mode", ssl_mode)
                .finish(),
        }
    }
}

impl DatabaseSettings {
    pub fn connect_options(&self) -> Result<PgConnectOptions> {
        match self {
            Self::Url(url) => url
                .parse::<PgConnectOptions>()
                .context("DATABASE_URL is not a valid postgres url"),
            Self::Parts {
                host,
                port,
                user,
                password,
                name,
                ssl_mode,
            } => {
                let ssl_mode = ssl_mode
                    .parse::<PgSslMode>()
                    .with_context(|| format!("invalid DB_SSLMODE '{ssl_mode}'"))?;
                Ok(PgConnectOptions::new()
                    .host(host)
                    .port(*port)
                    .username(user)
                    .password(password)
                    .database(name)
                    .ssl_mode(ssl_mode))
            }
        }
    }

    /// Host and database name, safe for logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Url(_) => "DATABASE_URL".to_string(),
            Self::Parts {
                host, port, name, ..
            } => format!("{host}:{port}/{name}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime: Duration,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
    pub connect_timeout: Duration,
    pub query_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let database = database_from_env()?;

        let max_connections = parse_positive_env("DB_MAX_CONNECTIONS", 10)?;
        let min_connections = parse_positive_env("DB_MIN_CONNECTIONS", 2)?;
        if min_connections > max_connections {
            return Err(anyhow!(
                "DB_MIN_CONNECTIONS must be <= DB_MAX_CONNECTIONS"
            ));
        }
        let pool = PoolSettings {
            max_connections,
            min_connections,
            max_lifetime: Duration::from_secs(parse_positive_env("DB_MAX_LIFETIME_SECS", 1800)?),
            idle_timeout: Duration::from_secs(parse_positive_env("DB_IDLE_TIMEOUT_SECS", 60)?),
            acquire_timeout: Duration::from_secs(parse_positive_env("DB_ACQUIRE_TIMEOUT_SECS", 5)?),
            connect_timeout: Duration::from_secs(parse_positive_env("DB_CONNECT_TIMEOUT_SECS", 5)?),
            query_timeout: Duration::from_secs(parse_positive_env("DB_QUERY_TIMEOUT_SECS", 5)?),
        };

        let http_addr = std::env::var("HTTP_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let cors_origins = parse_cors_origins(
            std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:8000,http://127.0.0.1:8000".to_string()),
        );
        let log_level = std::env::var("LOG_LEVEL")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "info".to_string());
        let log_format =
            parse_log_format(&std::env::var("LOG_FORMAT").unwrap_or_else(|_| "compact".into()))?;
        let http_request_body_limit_bytes =
            parse_positive_env("HTTP_REQUEST_BODY_LIMIT_BYTES", 1024 * 1024)?;
        let http_concurrency_limit = parse_positive_env("HTTP_CONCURRENCY_LIMIT", 256)?;
        let http_request_timeout_secs = parse_positive_env("HTTP_REQUEST_TIMEOUT_SECS", 10)?;

        Ok(Self {
            database,
            pool,
            http_addr,
            cors_origins,
            log_level,
            log_format,
            http_request_body_limit_bytes,
            http_concurrency_limit,
            http_request_timeout_secs,
        })
    }
}

fn database_from_env() -> Result<DatabaseSettings> {
    if let Some(url) = get_optional("DATABASE_URL") {
        return Ok(DatabaseSettings::Url(url));
    }

    let port = std::env::var("DB_PORT")
        .unwrap_or_else(|_| "5432".to_string())
        .parse::<u16>()
        .context("Failed to parse DB_PORT, expecting port number")?;

    Ok(DatabaseSettings::Parts {
        host: get_optional("DB_HOST").unwrap_or_else(|| "localhost".to_string()),
        port,
        user: get_optional("DB_USER").unwrap_or_else(|| "postgres".to_string()),
        password: std::env::var("DB_PASSWORD").unwrap_or_default(),
        name: get_optional("DB_NAME").unwrap_or_else(|| "blog".to_string()),
        ssl_mode: get_optional("DB_SSLMODE").unwrap_or_else(|| "prefer".to_string()),
    })
}

fn get_optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_cors_origins(raw: String) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_log_format(raw: &str) -> Result<LogFormat> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "compact" | "console" | "" => Ok(LogFormat::Compact),
        "json" => Ok(LogFormat::Json),
        other => Err(anyhow!("LOG_FORMAT must be 'compact' or 'json', got '{other}'")),
    }
}

fn parse_positive_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr + Default + PartialEq + ToString,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<T>()
        .with_context(|| format!("Failed to parse {key}, expecting positive integer"))?;

    if value == T::default() {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}
