/// Configuration management for the ACOMPANY service
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub authentication: AuthConfig,
    pub registration: RegistrationConfig,
    pub gallery: GalleryConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StoreBackendConfig,
}

/// Key-value store backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StoreBackendConfig {
    /// Process memory only, lost on restart
    Memory,
    /// SQLite file holding the `kv_store` table
    Sqlite { path: PathBuf },
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Lifetime of an issued session token
    pub session_ttl_hours: i64,
    /// Built-in administrator, matched before the account directory
    pub superuser_email: String,
    pub superuser_password: String,
}

/// Registration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// Reject a registration whose email already exists in the directory
    pub unique_emails: bool,
}

/// Gallery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryConfig {
    pub max_image_bytes: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directives used when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

pub const DEFAULT_SUPERUSER_EMAIL: &str = "admin@gmail.com";
pub const DEFAULT_SUPERUSER_PASSWORD: &str = "10101010";
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_LOG_FILTER: &str = "acompany=debug,tower_http=debug";

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("ACOMPANY_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("ACOMPANY_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| AppError::Validation("Invalid port number".to_string()))?;
        let version = env!("CARGO_PKG_VERSION").to_string();

        let backend = match env::var("ACOMPANY_STORE")
            .unwrap_or_else(|_| "sqlite".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => StoreBackendConfig::Memory,
            "sqlite" => StoreBackendConfig::Sqlite {
                path: env::var("ACOMPANY_DATABASE_PATH")
                    .unwrap_or_else(|_| "./data/acompany.sqlite".to_string())
                    .into(),
            },
            other => {
                return Err(AppError::Validation(format!(
                    "Unknown store backend: {}",
                    other
                )))
            }
        };

        let jwt_secret = env::var("ACOMPANY_JWT_SECRET")
            .map_err(|_| AppError::Validation("JWT secret required".to_string()))?;
        let session_ttl_hours = env::var("ACOMPANY_SESSION_TTL_HOURS")
            .unwrap_or_else(|_| "720".to_string())
            .parse()
            .unwrap_or(720);
        let superuser_email = env::var("ACOMPANY_SUPERUSER_EMAIL")
            .unwrap_or_else(|_| DEFAULT_SUPERUSER_EMAIL.to_string());
        let superuser_password = env::var("ACOMPANY_SUPERUSER_PASSWORD")
            .unwrap_or_else(|_| DEFAULT_SUPERUSER_PASSWORD.to_string());

        let unique_emails = env::var("ACOMPANY_UNIQUE_EMAILS")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        let max_image_bytes = env::var("ACOMPANY_MAX_IMAGE_BYTES")
            .unwrap_or_else(|_| DEFAULT_MAX_IMAGE_BYTES.to_string())
            .parse()
            .unwrap_or(DEFAULT_MAX_IMAGE_BYTES);

        let level =
            env::var("ACOMPANY_LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
        let format = match env::var("ACOMPANY_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                version,
            },
            storage: StorageConfig { backend },
            authentication: AuthConfig {
                jwt_secret,
                session_ttl_hours,
                superuser_email,
                superuser_password,
            },
            registration: RegistrationConfig { unique_emails },
            gallery: GalleryConfig { max_image_bytes },
            logging: LoggingConfig { level, format },
        })
    }

    /// Memory-backed configuration with defaults everywhere else
    pub fn in_memory(jwt_secret: impl Into<String>) -> Self {
        ServerConfig {
            service: ServiceConfig {
                hostname: "localhost".to_string(),
                port: 3000,
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            storage: StorageConfig {
                backend: StoreBackendConfig::Memory,
            },
            authentication: AuthConfig {
                jwt_secret: jwt_secret.into(),
                session_ttl_hours: 720,
                superuser_email: DEFAULT_SUPERUSER_EMAIL.to_string(),
                superuser_password: DEFAULT_SUPERUSER_PASSWORD.to_string(),
            },
            registration: RegistrationConfig {
                unique_emails: true,
            },
            gallery: GalleryConfig {
                max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            },
            logging: LoggingConfig {
                level: DEFAULT_LOG_FILTER.to_string(),
                format: LogFormat::Pretty,
            },
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.service.hostname.is_empty() {
            return Err(AppError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.authentication.jwt_secret.len() < 32 {
            return Err(AppError::Validation(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }

        if self.authentication.session_ttl_hours <= 0 {
            return Err(AppError::Validation(
                "Session TTL must be positive".to_string(),
            ));
        }

        if self.authentication.superuser_email.is_empty()
            || self.authentication.superuser_password.is_empty()
        {
            return Err(AppError::Validation(
                "Superuser credentials cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
