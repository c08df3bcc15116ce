use std::env;

use common::config::{ImageConfig, StorageConfig};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Allowed origins. Empty means any origin.
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub image: ImageConfig,
}

/// Split a comma separated list, dropping blanks.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    var(name)
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| ConfigError::Message(format!("{name} has an invalid value: {v}")))
        })
        .transpose()
}

fn flag(name: &str) -> Option<bool> {
    var(name).map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

/// Connection URL assembled from the `POSTGRES_*` variables.
fn postgres_url_from_parts() -> String {
    format!(
        "postgres://{}:{}@{}:{}/{}",
        var("POSTGRES_USER").unwrap_or_else(|| "postgres".into()),
        var("POSTGRES_PASSWORD").unwrap_or_else(|| "postgres".into()),
        var("POSTGRES_SERVER").unwrap_or_else(|| "localhost".into()),
        var("POSTGRES_PORT").unwrap_or_else(|| "5432".into()),
        var("POSTGRES_DB").unwrap_or_else(|| "app".into()),
    )
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let cors_origins = var("CORS_ORIGINS").map(|raw| parse_list(&raw));

        let s = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.url", postgres_url_from_parts())?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., SITE__STORAGE__S3__BUCKET)
            .add_source(
                Environment::with_prefix("SITE")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            // Flat variables kept for existing deployments
            .set_override_option("server.host", var("HOST"))?
            .set_override_option("server.port", parsed::<i64>("PORT")?)?
            .set_override_option("server.cors.allow_origins", cors_origins)?
            .set_override_option("database.url", var("DATABASE_URL"))?
            .set_override_option("storage.use_local", flag("USE_LOCAL_STORAGE"))?
            .set_override_option("storage.local_path", var("LOCAL_STORAGE_PATH"))?
            .set_override_option("storage.local_base_url", var("LOCAL_STORAGE_BASE_URL"))?
            .set_override_option("storage.max_upload_size", parsed::<i64>("MAX_UPLOAD_SIZE")?)?
            .set_override_option("storage.s3.access_key", var("AWS_ACCESS_KEY_ID"))?
            .set_override_option("storage.s3.secret_key", var("AWS_SECRET_ACCESS_KEY"))?
            .set_override_option("storage.s3.region", var("AWS_REGION"))?
            .set_override_option("storage.s3.bucket", var("S3_BUCKET_NAME"))?
            .set_override_option("storage.s3.endpoint", var("S3_ENDPOINT_URL"))?
            .set_override_option("image.compress", flag("COMPRESS_IMAGES"))?
            .set_override_option("image.max_dimension", parsed::<i64>("MAX_IMAGE_DIMENSION")?)?
            .set_override_option("image.jpeg_quality", parsed::<i64>("JPEG_QUALITY")?)?
            .set_override_option("image.png_compression", parsed::<i64>("PNG_COMPRESSION")?)?
            .build()?;

        s.try_deserialize()
    }
}
