//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (`--config <path>`, or `esagate.toml` next to the executable)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File looked up next to the executable when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "esagate.toml";

/// Largest page size the esa API accepts
const MAX_PER_PAGE: u32 = 100;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    /// Documents per listing page
    pub per_page: u32,
    /// esa team name (`{team}.esa.io`)
    #[serde(default)]
    pub team: String,
    /// Key for signing session cookies
    #[serde(default)]
    pub session_secret: String,
    /// Emit the `Secure` flag on cookies
    pub cookie_secure: bool,
    #[serde(default)]
    pub oauth2: OAuth2Config,
    pub esa: EsaConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// OAuth2 application registered with esa
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuth2Config {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    /// Public base URL of this gateway; the callback path is joined onto it
    #[serde(default)]
    pub redirect_host: String,
}

/// Upstream esa endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct EsaConfig {
    /// API and OAuth2 provider base URL (default: https://api.esa.io)
    pub api_endpoint: String,
    /// Public site domain; team pages live at `{team}.{site_domain}`
    pub site_domain: String,
    /// Deadline for a single upstream call, in seconds
    pub timeout_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. `path` if given (must exist), otherwise `esagate.toml` next to the executable (optional)
    /// 3. Environment variables (ESAGATE__*)
    ///
    /// # Errors
    /// Returns `AppError::Config` if a source fails to parse or validation fails
    pub fn load(path: Option<&Path>) -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File, FileFormat};

        let (file, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (default_config_path(), false),
        };

        tracing::debug!(path = %file.display(), required, "Reading configuration file");

        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("per_page", 5)?
            .set_default("cookie_secure", false)?
            .set_default("esa.api_endpoint", "https://api.esa.io")?
            .set_default("esa.site_domain", "esa.io")?
            .set_default("esa.timeout_seconds", 30)?
            .set_default("logging.format", "pretty")?
            .add_source(
                File::from(file.as_path())
                    .format(FileFormat::Toml)
                    .required(required),
            )
            .add_source(
                Environment::with_prefix("ESAGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Check required settings
    ///
    /// Reports the first offending key only.
    pub fn validate(&self) -> Result<(), crate::error::AppError> {
        let required = [
            ("team", &self.team),
            ("session_secret", &self.session_secret),
            ("oauth2.client_id", &self.oauth2.client_id),
            ("oauth2.client_secret", &self.oauth2.client_secret),
            ("oauth2.redirect_host", &self.oauth2.redirect_host),
        ];

        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(crate::error::AppError::Config(format!(
                    "'{key}' is required"
                )));
            }
        }

        url::Url::parse(&self.oauth2.redirect_host).map_err(|e| {
            crate::error::AppError::Config(format!(
                "'oauth2.redirect_host' is invalid url: {e}"
            ))
        })?;

        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(crate::error::AppError::Config(format!(
                "'per_page' must be between 1 and {MAX_PER_PAGE}"
            )));
        }

        url::Url::parse(&self.esa.api_endpoint).map_err(|e| {
            crate::error::AppError::Config(format!("'esa.api_endpoint' is invalid url: {e}"))
        })?;

        Ok(())
    }

    /// Public host of the team's esa site, e.g. `docs.esa.io`
    pub fn team_domain(&self) -> String {
        format!("{}.{}", self.team, self.esa.site_domain)
    }
}

fn default_config_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_CONFIG_FILE)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}
