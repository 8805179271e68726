use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Article;
use crate::{
    query::{Ordering, Query, QueryResults},
    store::ContentStore,
    DatabaseError,
};

pub const UNKNOWN_ARTICLE_TITLE: &str = "Unknown Article";

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub article_id: Uuid,
    pub author_name: String,
    pub comment_text: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

/// A visitor-submitted comment. Comments always start out unapproved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComment {
    pub article_id: Uuid,
    pub author_name: String,
    pub comment_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentFilter {
    Id(Uuid),
    ArticleId(Uuid),
    Approved(bool),
}

pub type CommentQuery = Query<CommentFilter>;

impl Query<CommentFilter> {
    pub fn id(self, id: Uuid) -> Self {
        self.filter(CommentFilter::Id(id))
    }

    pub fn article(self, article_id: Uuid) -> Self {
        self.filter(CommentFilter::ArticleId(article_id))
    }

    pub fn approved(self) -> Self {
        self.filter(CommentFilter::Approved(true))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommentChanges {
    pub is_approved: Option<bool>,
}

impl CommentChanges {
    pub fn approve() -> Self {
        Self {
            is_approved: Some(true),
        }
    }
}

impl NewComment {
    pub fn into_comment(self, id: Uuid, created_at: DateTime<Utc>) -> Comment {
        Comment {
            id,
            article_id: self.article_id,
            author_name: self.author_name,
            comment_text: self.comment_text,
            is_approved: false,
            created_at,
        }
    }
}

impl Comment {
    pub async fn create(
        store: &dyn ContentStore,
        comment: NewComment,
    ) -> Result<Self, DatabaseError> {
        store
            .insert_comments(vec![comment])
            .await?
            .into_iter()
            .next()
            .ok_or(DatabaseError::RowNotFound)
    }

    pub async fn list_approved_for(
        store: &dyn ContentStore,
        article_id: Uuid,
    ) -> Result<Vec<Self>, DatabaseError> {
        store
            .select_comments(&CommentQuery::new().article(article_id).approved())
            .await
            .map(QueryResults::into_records)
    }

    pub async fn approve(store: &dyn ContentStore, id: Uuid) -> Result<(), DatabaseError> {
        let updated = store
            .update_comments(&CommentQuery::new().id(id), CommentChanges::approve())
            .await?;
        if updated == 0 {
            return Err(DatabaseError::RowNotFound);
        }

        Ok(())
    }

    pub async fn delete(store: &dyn ContentStore, id: Uuid) -> Result<(), DatabaseError> {
        let deleted = store.delete_comments(&CommentQuery::new().id(id)).await?;
        if deleted == 0 {
            return Err(DatabaseError::RowNotFound);
        }

        Ok(())
    }
}

/// A comment alongside the title of the article it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub article_title: String,
}

impl CommentView {
    /// Every comment, newest first. Article titles are resolved with one bulk
    /// lookup; comments whose article no longer exists get a placeholder.
    pub async fn list_for_moderation(
        store: &dyn ContentStore,
    ) -> Result<Vec<Self>, DatabaseError> {
        let comments = store
            .select_comments(&CommentQuery::new().order_by(Ordering::newest_first()))
            .await?
            .into_records();

        let article_ids = comments
            .iter()
            .map(|comment| comment.article_id)
            .collect::<Vec<_>>();
        let titles = Article::titles_by_id(store, &article_ids).await?;

        Ok(comments
            .into_iter()
            .map(|comment| {
                let article_title = titles
                    .get(&comment.article_id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_ARTICLE_TITLE.to_string());
                Self {
                    comment,
                    article_title,
                }
            })
            .collect())
    }
}
