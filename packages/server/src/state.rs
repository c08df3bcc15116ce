use std::sync::Arc;

use common::image::ImageNormalizer;
use common::storage::StorageAdapter;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    /// Backend chosen once at startup.
    pub storage: Arc<StorageAdapter>,
    pub images: Arc<ImageNormalizer>,
}
