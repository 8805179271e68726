use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

use crate::{
    pagination::Paginator,
    query::{Query, QueryResults},
    store::ContentStore,
    DatabaseError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown media type '{0}'")]
pub struct MediaKindError(pub String);

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl FromStr for MediaKind {
    type Err = MediaKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            other => Err(MediaKindError(other.to_string())),
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryItem {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub media_url: String,
    pub media_type: MediaKind,
    pub embed_html: Option<String>,
    pub category: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for GalleryItem {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let media_type: String = row.try_get("media_type")?;
        let media_type = media_type
            .parse()
            .map_err(|err: MediaKindError| sqlx::Error::ColumnDecode {
                index: String::from("media_type"),
                source: Box::new(err),
            })?;

        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            media_url: row.try_get("media_url")?,
            media_type,
            embed_html: row.try_get("embed_html")?,
            category: row.try_get("category")?,
            is_published: row.try_get("is_published")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGalleryItem {
    pub title: String,
    pub description: Option<String>,
    pub media_url: String,
    pub media_type: MediaKind,
    pub embed_html: Option<String>,
    pub category: Option<String>,
    pub is_published: bool,
}

impl NewGalleryItem {
    pub fn into_item(self, id: Uuid, created_at: DateTime<Utc>) -> GalleryItem {
        GalleryItem {
            id,
            title: self.title,
            description: self.description,
            media_url: self.media_url,
            media_type: self.media_type,
            embed_html: self.embed_html,
            category: self.category,
            is_published: self.is_published,
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryFilter {
    Id(Uuid),
    Published(bool),
}

pub type GalleryQuery = Query<GalleryFilter>;

impl Query<GalleryFilter> {
    pub fn published(self) -> Self {
        self.filter(GalleryFilter::Published(true))
    }
}

impl GalleryItem {
    pub async fn create(
        store: &dyn ContentStore,
        item: NewGalleryItem,
    ) -> Result<Self, DatabaseError> {
        store
            .insert_gallery_items(vec![item])
            .await?
            .into_iter()
            .next()
            .ok_or(DatabaseError::RowNotFound)
    }

    /// One page of published items, newest first, with the exact number of
    /// published items.
    pub async fn list_published_page(
        store: &dyn ContentStore,
        paginator: &Paginator,
    ) -> Result<QueryResults<Self>, DatabaseError> {
        store
            .select_gallery(
                &GalleryQuery::new()
                    .published()
                    .paginate(paginator.pagination())
                    .count_exact(),
            )
            .await
    }
}
