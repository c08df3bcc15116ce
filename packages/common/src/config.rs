use std::path::PathBuf;

use serde::Deserialize;

/// S3-compatible remote store settings.
///
/// The remote backend is only attempted when both keys and a bucket are set.
#[derive(Debug, Deserialize, Clone)]
pub struct S3Config {
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    /// AWS region. Default: "us-east-2".
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub bucket: Option<String>,
    /// Custom endpoint for S3-compatible services (MinIO, R2, ...). Enables path-style URLs.
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// File storage settings shared by both backends.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Skip the remote backend entirely. Default: false.
    #[serde(default)]
    pub use_local: bool,
    /// Root directory of the local backend. Default: "./uploads".
    #[serde(default = "default_local_path")]
    pub local_path: PathBuf,
    /// Public prefix for locally stored objects. Default: "/api/v1/storage/local".
    #[serde(default = "default_local_base_url")]
    pub local_base_url: String,
    /// Maximum accepted upload in bytes. Default: 10 MiB.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
    /// Per-call timeout for backend operations. Default: 30.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub s3: S3Config,
}

/// Image normalization settings.
#[derive(Debug, Deserialize, Clone)]
pub struct ImageConfig {
    /// Whether uploads are compressed unless the request says otherwise. Default: true.
    #[serde(default = "default_compress")]
    pub compress: bool,
    /// Longest allowed side in pixels. Default: 2000.
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
    /// JPEG quality (1-100). Default: 85.
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// PNG compression level (0-9). Default: 6.
    #[serde(default = "default_png_compression")]
    pub png_compression: u8,
}

fn default_region() -> String {
    "us-east-2".into()
}
fn default_local_path() -> PathBuf {
    PathBuf::from("./uploads")
}
fn default_local_base_url() -> String {
    "/api/v1/storage/local".into()
}
fn default_max_upload_size() -> u64 {
    10 * 1024 * 1024
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_compress() -> bool {
    true
}
fn default_max_dimension() -> u32 {
    2000
}
fn default_jpeg_quality() -> u8 {
    85
}
fn default_png_compression() -> u8 {
    6
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            access_key: None,
            secret_key: None,
            region: default_region(),
            bucket: None,
            endpoint: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            use_local: false,
            local_path: default_local_path(),
            local_base_url: default_local_base_url(),
            max_upload_size: default_max_upload_size(),
            request_timeout_secs: default_request_timeout_secs(),
            s3: S3Config::default(),
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            compress: default_compress(),
            max_dimension: default_max_dimension(),
            jpeg_quality: default_jpeg_quality(),
            png_compression: default_png_compression(),
        }
    }
}
