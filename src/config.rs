// SPDX-License-Identifier: MIT

//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup; nothing re-reads the environment
//! at request time.

use std::env;

/// Which authentication gate to run. Selected once at startup, never
/// per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Verify Firebase ID tokens against Google's JWKS.
    Firebase,
    /// Inject a fixed guest identity without reading any credential.
    /// Local development only.
    Guest,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// GCP project ID for Firestore
    pub gcp_project_id: String,
    /// Firebase project ID (issuer/audience of ID tokens)
    pub firebase_project_id: String,
    /// Authentication gate variant
    pub auth_mode: AuthMode,
    /// Segmind API base URL
    pub segmind_api_url: String,
    /// Segmind API key
    pub segmind_api_key: String,
    /// Directory for generated and uploaded images
    pub upload_path: String,
    /// Maximum upload size in bytes
    pub max_file_size: usize,
    /// Timeout for outbound image generation calls, in seconds
    pub image_api_timeout_secs: u64,
    /// Frontend URL for CORS
    pub frontend_url: String,
}

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024; // 10MB
const DEFAULT_IMAGE_API_TIMEOUT_SECS: u64 = 60;

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let auth_mode = match env::var("AUTH_MODE").as_deref() {
            Ok("guest") => AuthMode::Guest,
            Ok("firebase") | Err(_) => AuthMode::Firebase,
            Ok(other) => return Err(ConfigError::Invalid("AUTH_MODE", other.to_string())),
        };

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .unwrap_or(DEFAULT_PORT),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            firebase_project_id: env::var("FIREBASE_PROJECT_ID")
                .map_err(|_| ConfigError::Missing("FIREBASE_PROJECT_ID"))?,
            auth_mode,
            segmind_api_url: env::var("SEGMIND_API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("SEGMIND_API_URL"))?,
            segmind_api_key: env::var("SEGMIND_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("SEGMIND_API_KEY"))?,
            upload_path: env::var("UPLOAD_PATH").unwrap_or_else(|_| "./uploads".to_string()),
            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_FILE_SIZE),
            image_api_timeout_secs: env::var("IMAGE_API_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_IMAGE_API_TIMEOUT_SECS),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
        })
    }

    /// Default config for tests. Uses the guest gate and dummy vendor
    /// credentials so nothing reaches the network.
    pub fn test_default() -> Self {
        Self {
            port: DEFAULT_PORT,
            gcp_project_id: "test-project".to_string(),
            firebase_project_id: "test-project".to_string(),
            auth_mode: AuthMode::Guest,
            segmind_api_url: "http://localhost:9999".to_string(),
            segmind_api_key: "test_api_key".to_string(),
            upload_path: "./uploads".to_string(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            image_api_timeout_secs: 5,
            frontend_url: "http://localhost:5173".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::test_default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.auth_mode, AuthMode::Guest);
        assert_eq!(config.max_file_size, 10 * 1024 * 1024);
    }
}
