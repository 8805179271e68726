use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    query::{Query, QueryResults},
    store::ContentStore,
    DatabaseError,
};

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content_markdown: String,
    pub cover_image_url: Option<String>,
    pub category: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub slug: String,
    pub content_markdown: String,
    pub cover_image_url: Option<String>,
    pub category: Option<String>,
    pub is_published: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleFilter {
    Id(Uuid),
    Ids(Vec<Uuid>),
    Slug(String),
    Published(bool),
}

pub type ArticleQuery = Query<ArticleFilter>;

impl Query<ArticleFilter> {
    pub fn published(self) -> Self {
        self.filter(ArticleFilter::Published(true))
    }

    pub fn slug(self, slug: impl Into<String>) -> Self {
        self.filter(ArticleFilter::Slug(slug.into()))
    }

    pub fn ids(self, ids: Vec<Uuid>) -> Self {
        self.filter(ArticleFilter::Ids(ids))
    }
}

impl NewArticle {
    pub fn into_article(self, id: Uuid, created_at: DateTime<Utc>) -> Article {
        Article {
            id,
            title: self.title,
            slug: self.slug,
            content_markdown: self.content_markdown,
            cover_image_url: self.cover_image_url,
            category: self.category,
            is_published: self.is_published,
            created_at,
        }
    }
}

impl Article {
    pub fn permalink(&self) -> String {
        format!("/article/{}", self.slug)
    }

    pub async fn create(
        store: &dyn ContentStore,
        article: NewArticle,
    ) -> Result<Self, DatabaseError> {
        store
            .insert_articles(vec![article])
            .await?
            .into_iter()
            .next()
            .ok_or(DatabaseError::RowNotFound)
    }

    pub async fn find_published_by_slug(
        store: &dyn ContentStore,
        slug: &str,
    ) -> Result<Self, DatabaseError> {
        store
            .select_articles(&ArticleQuery::new().published().slug(slug).limit(1))
            .await?
            .first()
            .ok_or(DatabaseError::RowNotFound)
    }

    pub async fn list_published(store: &dyn ContentStore) -> Result<Vec<Self>, DatabaseError> {
        store
            .select_articles(&ArticleQuery::new().published())
            .await
            .map(QueryResults::into_records)
    }

    /// Newest articles regardless of publication state.
    pub async fn list_recent(
        store: &dyn ContentStore,
        limit: usize,
    ) -> Result<Vec<Self>, DatabaseError> {
        store
            .select_articles(&ArticleQuery::new().limit(limit))
            .await
            .map(QueryResults::into_records)
    }

    /// Looks up the titles of many articles with a single query.
    pub async fn titles_by_id(
        store: &dyn ContentStore,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, String>, DatabaseError> {
        let mut distinct = ids.to_vec();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.is_empty() {
            return Ok(HashMap::new());
        }

        let articles = store
            .select_articles(&ArticleQuery::new().ids(distinct))
            .await?;

        Ok(articles
            .into_records()
            .into_iter()
            .map(|article| (article.id, article.title))
            .collect())
    }
}
