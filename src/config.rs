use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::data_api::filter::FilterPrecedence;
use crate::error::AppError;
use crate::services::auth::LoginMode;

pub const DEFAULT_DATA_API_BASE: &str = "http://127.0.0.1:5000/data-api/rest";

#[derive(Clone, Debug)]
pub struct DataApiConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub read_retries: u32,
    pub retry_backoff: Duration,
    pub precedence: FilterPrecedence,
}

impl Default for DataApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_DATA_API_BASE.to_string(),
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            read_retries: 2,
            retry_backoff: Duration::from_millis(250),
            precedence: FilterPrecedence::Grouped,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PortalConfig {
    pub addr: SocketAddr,
    pub database_url: String,
    pub login_mode: LoginMode,
    pub data_api: DataApiConfig,
}

impl PortalConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let defaults = DataApiConfig::default();

        let data_api = DataApiConfig {
            base_url: env::var("DATA_API_BASE")
                .unwrap_or(defaults.base_url)
                .trim_end_matches('/')
                .to_string(),
            timeout: Duration::from_secs(parse_var("DATA_API_TIMEOUT_SECS", 10)?),
            connect_timeout: Duration::from_secs(parse_var("DATA_API_CONNECT_TIMEOUT_SECS", 5)?),
            read_retries: parse_var("DATA_API_READ_RETRIES", defaults.read_retries)?,
            retry_backoff: defaults.retry_backoff,
            precedence: parse_var("FILTER_PRECEDENCE", defaults.precedence)?,
        };

        Ok(Self {
            addr: parse_var("PORTAL_ADDR", SocketAddr::from(([127, 0, 0, 1], 3000)))?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://portal.db?mode=rwc".to_string()),
            login_mode: parse_var("LOGIN_MODE", LoginMode::Hashed)?,
            data_api,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| AppError::Config(format!("{} is invalid: {}", name, e))),
        Err(_) => Ok(default),
    }
}
