use crate::error::{Error, Result};
use serde::Deserialize;
use std::time::Duration;

/// Main configuration for the Dojo service
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Object store configuration
    #[serde(default)]
    pub object_store: ObjectStoreConfig,
    /// Inference backend configuration
    #[serde(default)]
    pub inference: InferenceConfig,
    /// Upload validation rules
    #[serde(default)]
    pub upload: UploadConfig,
    /// Activity feed limits
    #[serde(default)]
    pub feed: FeedConfig,
    /// Session token configuration
    pub auth: AuthConfig,
    /// API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Service name for logging/metrics
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Metrics port
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Idle connection timeout in seconds
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// Apply the bundled schema on startup (local development only)
    #[serde(default)]
    pub run_migrations: bool,
}

/// S3-compatible object store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectStoreConfig {
    /// Bucket holding uploaded videos
    #[serde(default = "default_videos_bucket")]
    pub videos_bucket: String,
    /// Bucket holding video thumbnails
    #[serde(default = "default_thumbnails_bucket")]
    pub thumbnails_bucket: String,
    /// Bucket holding user avatars
    #[serde(default = "default_avatars_bucket")]
    pub avatars_bucket: String,
    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint URL (for MinIO, LocalStack, etc.)
    pub endpoint_url: Option<String>,
    /// Force path-style access (required for MinIO)
    #[serde(default)]
    pub force_path_style: bool,
    /// Base URL for public object links; defaults to the bucket's S3 URL
    pub public_base_url: Option<String>,
    /// Signed URL expiration in seconds
    #[serde(default = "default_signed_url_expiry_secs")]
    pub signed_url_expiry_secs: u64,
    /// Multipart upload threshold in bytes (5MB default)
    #[serde(default = "default_multipart_threshold")]
    pub multipart_threshold_bytes: usize,
    /// Part size for multipart uploads in bytes (5MB default)
    #[serde(default = "default_part_size")]
    pub part_size_bytes: usize,
}

/// Inference backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct InferenceConfig {
    /// Base URL of the chaptering backend
    #[serde(default = "default_inference_base_url")]
    pub base_url: String,
    /// Model used when the caller does not pick one
    #[serde(default = "default_model")]
    pub default_model: String,
}

/// Upload validation rules
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Largest accepted video in bytes
    #[serde(default = "default_max_file_size_bytes")]
    pub max_file_size_bytes: u64,
    /// Accepted video MIME types
    #[serde(default = "default_allowed_content_types")]
    pub allowed_content_types: Vec<String>,
}

/// Activity feed limits
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Rows fetched per activity kind
    #[serde(default = "default_per_kind_limit")]
    pub per_kind_limit: i64,
    /// Entries kept after merging
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

/// Session token configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for session tokens
    pub jwt_secret: String,
    /// Session token lifetime in seconds
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// API listen address
    #[serde(default = "default_api_host")]
    pub host: String,
    /// API listen port
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    /// Allowed CORS origins
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

// Default value functions
fn default_service_name() -> String {
    "dojo-service".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    2
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_idle_timeout_secs() -> u64 {
    600
}

fn default_videos_bucket() -> String {
    "videos".to_string()
}

fn default_thumbnails_bucket() -> String {
    "thumbnails".to_string()
}

fn default_avatars_bucket() -> String {
    "avatars".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_signed_url_expiry_secs() -> u64 {
    3600
}

fn default_multipart_threshold() -> usize {
    5 * 1024 * 1024 // 5MB
}

fn default_part_size() -> usize {
    5 * 1024 * 1024 // 5MB
}

fn default_inference_base_url() -> String {
    "http://localhost:5328".to_string()
}

fn default_model() -> String {
    "meta-llama-3.1-8b".to_string()
}

fn default_max_file_size_bytes() -> u64 {
    500 * 1024 * 1024 // 500MB
}

fn default_allowed_content_types() -> Vec<String> {
    [
        "video/mp4",
        "video/avi",
        "video/mov",
        "video/wmv",
        "video/flv",
        "video/webm",
        "video/mkv",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_per_kind_limit() -> i64 {
    10
}

fn default_max_items() -> usize {
    20
}

fn default_session_ttl_secs() -> u64 {
    24 * 3600
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from environment and config files
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .set_default("service.name", "dojo-service")?
            .set_default("service.log_level", "info")?
            .set_default("service.metrics_port", 9090)?
            .add_source(config::File::with_name("config/dojo").required(false))
            .add_source(config::File::with_name("/etc/dojo/dojo").required(false))
            // DOJO__DATABASE__URL -> database.url
            .add_source(
                config::Environment::with_prefix("DOJO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.len() < 32 {
            return Err(Error::Config(
                "auth.jwt_secret must be at least 32 bytes".to_string(),
            ));
        }
        if self.object_store.part_size_bytes < 5 * 1024 * 1024 {
            return Err(Error::Config(
                "object_store.part_size_bytes must be at least 5MB".to_string(),
            ));
        }
        if self.upload.allowed_content_types.is_empty() {
            return Err(Error::Config(
                "upload.allowed_content_types must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Get signed URL expiry as Duration
    pub fn signed_url_expiry(&self) -> Duration {
        Duration::from_secs(self.object_store.signed_url_expiry_secs)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
            metrics_port: default_metrics_port(),
        }
    }
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            videos_bucket: default_videos_bucket(),
            thumbnails_bucket: default_thumbnails_bucket(),
            avatars_bucket: default_avatars_bucket(),
            region: default_region(),
            endpoint_url: None,
            force_path_style: false,
            public_base_url: None,
            signed_url_expiry_secs: default_signed_url_expiry_secs(),
            multipart_threshold_bytes: default_multipart_threshold(),
            part_size_bytes: default_part_size(),
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: default_inference_base_url(),
            default_model: default_model(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size_bytes(),
            allowed_content_types: default_allowed_content_types(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            per_kind_limit: default_per_kind_limit(),
            max_items: default_max_items(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
            cors_enabled: default_true(),
            cors_origins: Vec::new(),
        }
    }
}
