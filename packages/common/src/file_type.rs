#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of an uploaded file. Also used as the storage folder.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "blog_image"))]
    BlogImage,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "news_image"))]
    NewsImage,
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "other"))]
    Other,
}

impl FileType {
    pub const ALL: &'static [FileType] = &[Self::BlogImage, Self::NewsImage, Self::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BlogImage => "blog_image",
            Self::NewsImage => "news_image",
            Self::Other => "other",
        }
    }

    /// Storage folder objects of this type are written under.
    pub fn folder(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                format!("file_type must be one of: blog_image, news_image, other (got '{s}')")
            })
    }
}
