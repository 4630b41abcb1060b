use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use validator::Validate;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Limits and scratch storage for incoming uploads
#[derive(Debug, Clone, Validate)]
pub struct UploadConfig {
    /// Maximum size of a single file in bytes (default: 5 MiB)
    #[validate(range(min = 1, message = "MAX_FILE_SIZE must be positive"))]
    pub max_file_size: usize,

    /// Maximum number of files per request (default: 5)
    #[validate(range(min = 1, message = "MAX_FILES must be at least 1"))]
    pub max_files: usize,

    /// Scratch directory for files awaiting provider submission
    pub temp_dir: PathBuf,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: 5 * 1024 * 1024, // 5 MiB
            max_files: 5,
            temp_dir: env::temp_dir().join("uploads"),
        }
    }
}

impl UploadConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let default = Self::default();

        let config = Self {
            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            max_files: env::var("MAX_FILES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_files),

            temp_dir: env::var("UPLOAD_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.temp_dir),
        };

        config
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok(config)
    }

    /// Upper bound for a whole request body, leaving room for multipart framing.
    pub fn body_limit(&self) -> usize {
        self.max_file_size
            .saturating_mul(self.max_files)
            .saturating_add(1024 * 1024)
    }
}

/// Credentials and endpoint settings for the Cloudinary upload API
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,

    /// Optional folder that hosted assets are placed in
    pub folder: Option<String>,

    /// Timeout for a single upload call (default: 60s)
    pub timeout: Duration,

    /// API base URL (default: "https://api.cloudinary.com")
    pub api_base: String,
}

impl CloudinaryConfig {
    pub const DEFAULT_API_BASE: &'static str = "https://api.cloudinary.com";

    pub fn new(cloud_name: String, api_key: String, api_secret: String) -> Self {
        Self {
            cloud_name,
            api_key,
            api_secret,
            folder: None,
            timeout: Duration::from_secs(60),
            api_base: Self::DEFAULT_API_BASE.to_string(),
        }
    }

    /// Load credentials from the environment, failing when any is absent.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::new(
            required("CLOUDINARY_CLOUD_NAME")?,
            required("CLOUDINARY_API_KEY")?,
            required("CLOUDINARY_API_SECRET")?,
        );

        config.folder = env::var("CLOUDINARY_FOLDER")
            .ok()
            .filter(|v| !v.trim().is_empty());

        if let Ok(v) = env::var("CLOUDINARY_UPLOAD_TIMEOUT_SECS") {
            let secs: u64 = v.parse().map_err(|_| {
                ConfigError::Invalid(format!("CLOUDINARY_UPLOAD_TIMEOUT_SECS: '{}'", v))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Ok(base) = env::var("CLOUDINARY_API_BASE") {
            config.api_base = base.trim_end_matches('/').to_string();
        }

        Ok(config)
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}
