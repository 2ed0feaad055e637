/*
 * Responsibility
 * - 環境変数 (.env) からの設定読み込み: DATABASE_URL, JWT, CORS, revocation gate など
 * - 初期管理者 (INITIAL_ADMIN_*) は username と password の両方が揃った時だけ有効
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::middleware::auth::revocation::ParseFailurePolicy;

/// Key used by the development profile when `JWT_KEY` is not set.
/// Production refuses to start without an explicit key.
const DEVELOPMENT_JWT_KEY: &str = "MantenimientoEquiposContiSLP2024SecretKey123!";

const MIN_JWT_KEY_BYTES: usize = 32;

const MIN_ADMIN_PASSWORD_LEN: usize = 6;
const DEFAULT_ADMIN_NAME: &str = "Administrador del Sistema";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Account created on startup when the users table is empty.
#[derive(Clone)]
pub struct InitialAdmin {
    pub username: String,
    pub password: String,
    pub nombre_completo: String,
}

impl fmt::Debug for InitialAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitialAdmin")
            .field("username", &self.username)
            .field("nombre_completo", &self.nombre_completo)
            .finish_non_exhaustive()
    }
}

impl InitialAdmin {
    fn from_parts(
        username: Option<String>,
        password: Option<String>,
        nombre_completo: Option<String>,
    ) -> Result<Option<Self>, ConfigError> {
        let username = username.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let password = password.filter(|v| !v.is_empty());

        let (username, password) = match (username, password) {
            (None, None) => return Ok(None),
            (Some(_), None) => return Err(ConfigError::Missing("INITIAL_ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("INITIAL_ADMIN_USERNAME")),
            (Some(u), Some(p)) => (u, p),
        };
        if password.chars().count() < MIN_ADMIN_PASSWORD_LEN {
            return Err(ConfigError::Invalid("INITIAL_ADMIN_PASSWORD"));
        }

        Ok(Some(Self {
            username,
            password,
            nombre_completo: nombre_completo
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_ADMIN_NAME.to_string()),
        }))
    }
}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub database_url: String,
    pub database_max_connections: u32,

    pub cors_allowed_origins: Vec<String>,
    pub request_timeout: Duration,
    pub body_limit_bytes: usize,

    // HS256 shared secret; never printed
    pub jwt_key: String,
    pub jwt_expiration_hours: i64,
    pub access_token_leeway_seconds: u64,

    pub revocation_parse_failure: ParseFailurePolicy,

    pub initial_admin: Option<InitialAdmin>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("database_max_connections", &self.database_max_connections)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("request_timeout", &self.request_timeout)
            .field("body_limit_bytes", &self.body_limit_bytes)
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("access_token_leeway_seconds", &self.access_token_leeway_seconds)
            .field("revocation_parse_failure", &self.revocation_parse_failure)
            .field("initial_admin", &self.initial_admin)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let database_max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let request_timeout = std::env::var("REQUEST_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        let body_limit_bytes = std::env::var("BODY_LIMIT_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(1024 * 1024);

        let jwt_key = match std::env::var("JWT_KEY") {
            Ok(key) => key,
            Err(_) if !app_env.is_production() => {
                tracing::warn!("JWT_KEY not set; using the development signing key");
                DEVELOPMENT_JWT_KEY.to_string()
            }
            Err(_) => return Err(ConfigError::Missing("JWT_KEY")),
        };
        if jwt_key.len() < MIN_JWT_KEY_BYTES {
            return Err(ConfigError::Invalid("JWT_KEY"));
        }

        let jwt_expiration_hours = std::env::var("JWT_EXPIRATION_HOURS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(8);
        if jwt_expiration_hours <= 0 {
            return Err(ConfigError::Invalid("JWT_EXPIRATION_HOURS"));
        }

        let access_token_leeway_seconds = std::env::var("ACCESS_TOKEN_LEEWAY_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        let revocation_parse_failure = match std::env::var("REVOCATION_FAIL_CLOSED")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str()
        {
            "" | "false" | "0" => ParseFailurePolicy::Proceed,
            "true" | "1" => ParseFailurePolicy::Reject,
            _ => return Err(ConfigError::Invalid("REVOCATION_FAIL_CLOSED")),
        };

        let initial_admin = InitialAdmin::from_parts(
            std::env::var("INITIAL_ADMIN_USERNAME").ok(),
            std::env::var("INITIAL_ADMIN_PASSWORD").ok(),
            std::env::var("INITIAL_ADMIN_NAME").ok(),
        )?;

        Ok(Self {
            addr,
            app_env,
            database_url,
            database_max_connections,
            cors_allowed_origins,
            request_timeout,
            body_limit_bytes,
            jwt_key,
            jwt_expiration_hours,
            access_token_leeway_seconds,
            revocation_parse_failure,
            initial_admin,
        })
    }
}

#[cfg(test)]
impl Config {
    /// Development profile with fixed values; no environment access.
    pub fn for_tests() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            app_env: AppEnv::Development,
            database_url: "postgres://localhost/mantenimiento_test".to_string(),
            database_max_connections: 1,
            cors_allowed_origins: Vec::new(),
            request_timeout: Duration::from_secs(30),
            body_limit_bytes: 1024 * 1024,
            jwt_key: DEVELOPMENT_JWT_KEY.to_string(),
            jwt_expiration_hours: 8,
            access_token_leeway_seconds: 60,
            revocation_parse_failure: ParseFailurePolicy::Proceed,
            initial_admin: None,
        }
    }
}
