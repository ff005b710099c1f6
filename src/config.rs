//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use secrecy::SecretString;

/// HTTP header name for the admin key guarding the back-office routes.
pub const ADMIN_KEY_HEADER: &str = "X-Admin-Key";

/// Development default values - NEVER use in production.
pub mod defaults {
    pub const DEV_DATABASE_URL: &str = "file:data/appraisals.db";
    pub const DEV_ADMIN_KEY: &str = "dev-admin-key-do-not-use-in-production";
    pub const DEV_HOST: &str = "127.0.0.1";
    pub const DEV_PORT: u16 = 8080;
    pub const DEV_DATA_DIR: &str = "data/uploads";
    pub const DEV_PUBLIC_BASE_URL: &str = "http://localhost:8080";
    pub const DEV_MAX_PHOTO_SIZE: usize = 5 * 1024 * 1024; // 5MB per photo
    pub const DEV_MAX_CONCURRENT_UPLOADS: usize = 10;
}

/// Runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parse environment from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Notification email settings.
///
/// All fields are required for submissions to be accepted: the submission
/// handler fails fast with a configuration error when these are absent,
/// before any file or database side effect.
#[derive(Clone)]
pub struct EmailSettings {
    /// API credential for the email delivery service.
    pub api_key: SecretString,
    /// Sender address (e.g. "appraisals@dealer.example").
    pub from_address: String,
    /// Back-office recipient address.
    pub to_address: String,
}

impl std::fmt::Debug for EmailSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailSettings")
            .field("api_key", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .field("to_address", &self.to_address)
            .finish()
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Runtime environment
    pub environment: Environment,
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL ("file:path" to the SQLite database)
    pub database_url: String,
    /// Directory where submission photo directories are created
    pub data_dir: PathBuf,
    /// Directory for static frontend assets (production only)
    pub static_dir: Option<PathBuf>,
    /// Admin key for the back-office list/delete routes
    pub admin_key: Option<String>,
    /// Public base URL used to build links embedded in notification emails
    pub public_base_url: String,
    /// Maximum size of a single uploaded photo in bytes (default: 5MB)
    pub max_photo_size: usize,
    /// Maximum concurrent submission uploads (bounds temp-file disk usage)
    pub max_concurrent_uploads: usize,
    /// Notification email settings (absent until configured)
    pub email: Option<EmailSettings>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In development mode (RUST_ENV=development) every variable has a
    /// sensible default except the email settings, which have no safe
    /// default anywhere. In production mode the server refuses to start
    /// when the admin key or database URL still match development defaults.
    ///
    /// Environment variables:
    /// - `RUST_ENV`: Environment (development/production) - REQUIRED
    /// - `TIV_HOST`: Server host (default: 127.0.0.1)
    /// - `TIV_PORT`: Server port (default: 8080)
    /// - `DATABASE_URL`: SQLite path as "file:path" (default: file:data/appraisals.db)
    /// - `TIV_DATA_DIR`: Photo storage root (default: data/uploads)
    /// - `TIV_STATIC_DIR`: Static assets directory for production
    /// - `TIV_ADMIN_KEY`: Admin key for back-office routes
    /// - `PUBLIC_BASE_URL`: Base URL for links in notification emails
    /// - `TIV_MAX_PHOTO_SIZE`: Per-photo size ceiling in bytes (default: 5MB)
    /// - `TIV_MAX_CONCURRENT_UPLOADS`: Concurrent upload limit (default: 10)
    /// - `RESEND_API_KEY`: Email delivery API credential
    /// - `APPRAISAL_FROM_EMAIL`: Notification sender address
    /// - `APPRAISAL_TO_EMAIL`: Back-office recipient address
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_str = env::var("RUST_ENV").map_err(|_| ConfigError::MissingEnvVar("RUST_ENV"))?;

        let environment = Environment::parse(&env_str).ok_or(ConfigError::InvalidValue(
            "RUST_ENV must be 'development' or 'production'",
        ))?;

        let host = env::var("TIV_HOST").unwrap_or_else(|_| defaults::DEV_HOST.to_string());

        let port = env::var("TIV_PORT")
            .unwrap_or_else(|_| defaults::DEV_PORT.to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidValue("TIV_PORT must be a valid port number"))?;

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| defaults::DEV_DATABASE_URL.to_string());

        let data_dir = env::var("TIV_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(defaults::DEV_DATA_DIR));

        let static_dir = env::var("TIV_STATIC_DIR").ok().map(PathBuf::from);

        // Admin key is optional in production; development falls back to a
        // well-known key so the back-office routes are usable locally.
        let admin_key = if environment.is_development() {
            Some(env::var("TIV_ADMIN_KEY").unwrap_or_else(|_| defaults::DEV_ADMIN_KEY.to_string()))
        } else {
            env::var("TIV_ADMIN_KEY").ok()
        };

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| defaults::DEV_PUBLIC_BASE_URL.to_string());

        let max_photo_size = env::var("TIV_MAX_PHOTO_SIZE")
            .unwrap_or_else(|_| defaults::DEV_MAX_PHOTO_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidValue("TIV_MAX_PHOTO_SIZE must be a valid number"))?;

        let max_concurrent_uploads = env::var("TIV_MAX_CONCURRENT_UPLOADS")
            .unwrap_or_else(|_| defaults::DEV_MAX_CONCURRENT_UPLOADS.to_string())
            .parse::<usize>()
            .map_err(|_| {
                ConfigError::InvalidValue("TIV_MAX_CONCURRENT_UPLOADS must be a valid number")
            })?;

        // Email settings are present only when all three variables are set.
        // A partial set is a configuration mistake worth failing loudly on.
        let email = Self::email_from_env()?;

        let config = Config {
            environment,
            host,
            port,
            database_url,
            data_dir,
            static_dir,
            admin_key,
            public_base_url,
            max_photo_size,
            max_concurrent_uploads,
            email,
        };

        if environment.is_production() {
            config.validate_production()?;
        }

        Ok(config)
    }

    fn email_from_env() -> Result<Option<EmailSettings>, ConfigError> {
        let api_key = env::var("RESEND_API_KEY").ok();
        let from_address = env::var("APPRAISAL_FROM_EMAIL").ok();
        let to_address = env::var("APPRAISAL_TO_EMAIL").ok();

        match (api_key, from_address, to_address) {
            (Some(key), Some(from), Some(to)) => Ok(Some(EmailSettings {
                api_key: SecretString::from(key),
                from_address: from,
                to_address: to,
            })),
            (None, None, None) => Ok(None),
            _ => Err(ConfigError::InvalidValue(
                "RESEND_API_KEY, APPRAISAL_FROM_EMAIL and APPRAISAL_TO_EMAIL must be set together",
            )),
        }
    }

    /// Validate that production configuration does not use development defaults.
    fn validate_production(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.database_url == defaults::DEV_DATABASE_URL {
            errors.push(format!(
                "DATABASE_URL is using development default '{}'. Set a production database path.",
                defaults::DEV_DATABASE_URL
            ));
        }

        if let Some(ref key) = self.admin_key {
            if key == defaults::DEV_ADMIN_KEY {
                errors.push(
                    "TIV_ADMIN_KEY is using development default. Set a secure admin key."
                        .to_string(),
                );
            }
        }

        if self.public_base_url == defaults::DEV_PUBLIC_BASE_URL {
            errors.push(
                "PUBLIC_BASE_URL is using development default. Set the public site URL."
                    .to_string(),
            );
        }

        if !errors.is_empty() {
            return Err(ConfigError::ProductionValidation(errors));
        }

        Ok(())
    }

    /// Get the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode.
    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),

    #[error("Production configuration validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    ProductionValidation(Vec<String>),
}
