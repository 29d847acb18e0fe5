//! Configuration types for file-relay

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf, time::Duration};

/// Main configuration for [`FileRelay`](crate::FileRelay)
///
/// Every section has serde defaults, so an empty JSON object is a valid
/// configuration (apart from the Drive folder, which [`Config::validate_drive`]
/// checks when the Drive store is used).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Local staging of downloaded files
    #[serde(default)]
    pub staging: StagingConfig,

    /// Retry rounds for failed downloads
    #[serde(default)]
    pub retry: RetryConfig,

    /// Remote publishing
    #[serde(default)]
    pub publish: PublishConfig,

    /// Record store location
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// API and external server integration
    #[serde(default)]
    pub server: ServerIntegrationConfig,
}

/// Local staging configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StagingConfig {
    /// Directory downloads are written to before publishing (default: "./uploads")
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Upper bound on simultaneous transfers per pass (None = all at once)
    #[serde(default)]
    pub max_concurrent_transfers: Option<usize>,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            max_concurrent_transfers: None,
        }
    }
}

/// Retry configuration for failed downloads
///
/// `max_attempts` is the number of retry rounds run after the first pass.
/// The delay between rounds starts at `initial_delay` and grows by
/// `backoff_multiplier`, capped at `max_delay`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry rounds (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry round (default: 0 seconds)
    #[serde(default, with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retry rounds (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: Duration::ZERO,
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Remote publishing configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Parent container (Drive folder id) every upload is placed in
    #[serde(default)]
    pub parent_folder_id: String,

    /// Add items that downloaded but failed to publish to the report's
    /// `failed` list (default: false, they are only logged)
    #[serde(default)]
    pub report_failures: bool,

    /// Google Drive REST endpoints and credentials
    #[serde(default)]
    pub drive: DriveConfig,
}

/// Google Drive REST API configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    /// Base URL for metadata calls (default: "https://www.googleapis.com")
    #[serde(default = "default_drive_api_base")]
    pub api_base: String,

    /// Base URL for media uploads (default: "https://www.googleapis.com/upload")
    #[serde(default = "default_drive_upload_base")]
    pub upload_base: String,

    /// OAuth2 bearer token sent with every request
    #[serde(default)]
    pub access_token: Option<String>,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_base: default_drive_api_base(),
            upload_base: default_drive_upload_base(),
            access_token: None,
        }
    }
}

impl std::fmt::Debug for DriveConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveConfig")
            .field("api_base", &self.api_base)
            .field("upload_base", &self.upload_base)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Record store configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// SQLite database path (default: "./file-relay.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// API and external server integration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServerIntegrationConfig {
    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:3000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Optional API key for authentication
    #[serde(default)]
    pub api_key: Option<String>,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            api_key: None,
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read config file '{}': {}", path.display(), e),
            key: None,
        })?;
        let config = serde_json::from_str(&content).map_err(|e| Error::Config {
            message: format!("failed to parse config file '{}': {}", path.display(), e),
            key: None,
        })?;
        Ok(config)
    }

    /// Overlay settings from environment variables
    ///
    /// Recognized variables: `FOLDER_ID`, `UPLOAD_DIR`, `MAX_RETRIES`,
    /// `DATABASE_PATH`, `DRIVE_ACCESS_TOKEN`, `BIND_ADDRESS`, `API_KEY`.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(folder) = var("FOLDER_ID") {
            self.publish.parent_folder_id = folder;
        }
        if let Some(dir) = var("UPLOAD_DIR") {
            self.staging.upload_dir = PathBuf::from(dir);
        }
        if let Some(raw) = var("MAX_RETRIES") {
            self.retry.max_attempts = raw.trim().parse().map_err(|_| Error::Config {
                message: format!("MAX_RETRIES must be a non-negative integer, got '{raw}'"),
                key: Some("retry.max_attempts".into()),
            })?;
        }
        if let Some(path) = var("DATABASE_PATH") {
            self.persistence.database_path = PathBuf::from(path);
        }
        if let Some(token) = var("DRIVE_ACCESS_TOKEN") {
            self.publish.drive.access_token = Some(token);
        }
        if let Some(raw) = var("BIND_ADDRESS") {
            self.server.api.bind_address = raw.trim().parse().map_err(|_| Error::Config {
                message: format!("BIND_ADDRESS must be host:port, got '{raw}'"),
                key: Some("server.api.bind_address".into()),
            })?;
        }
        if let Some(key) = var("API_KEY") {
            self.server.api.api_key = Some(key);
        }
        Ok(())
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(Error::Config {
                message: "max_attempts must be at least 1".into(),
                key: Some("retry.max_attempts".into()),
            });
        }
        if self.staging.max_concurrent_transfers == Some(0) {
            return Err(Error::Config {
                message: "max_concurrent_transfers must be at least 1 when set".into(),
                key: Some("staging.max_concurrent_transfers".into()),
            });
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(Error::Config {
                message: "backoff_multiplier must be >= 1.0".into(),
                key: Some("retry.backoff_multiplier".into()),
            });
        }
        Ok(())
    }

    /// Extra checks for running against Google Drive
    pub fn validate_drive(&self) -> Result<()> {
        self.validate()?;
        if self.publish.parent_folder_id.trim().is_empty() {
            return Err(Error::Config {
                message: "a parent folder id is required to publish to Google Drive".into(),
                key: Some("publish.parent_folder_id".into()),
            });
        }
        Ok(())
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./uploads")
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./file-relay.db")
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_drive_api_base() -> String {
    "https://www.googleapis.com".to_string()
}

fn default_drive_upload_base() -> String {
    "https://www.googleapis.com/upload".to_string()
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
