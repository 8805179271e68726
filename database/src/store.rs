//! The narrow contract the site needs from its backend: typed selects with
//! equality filters, newest-first ordering, ranging and an optional exact
//! count; multi-row inserts that return the stored rows; and update/delete of
//! matching rows. Nothing here spans more than one call, so callers never
//! assume transactional guarantees across operations.

use async_trait::async_trait;

use crate::{
    query::QueryResults,
    schema::cms::{
        Article, ArticleQuery, Comment, CommentChanges, CommentQuery, GalleryItem, GalleryQuery,
        NewArticle, NewComment, NewGalleryItem,
    },
    DatabaseError,
};

mod memory;
mod postgres;

pub use self::{memory::MemoryStore, postgres::PgStore};

#[async_trait]
pub trait ContentStore: Send + Sync + 'static {
    async fn select_articles(
        &self,
        query: &ArticleQuery,
    ) -> Result<QueryResults<Article>, DatabaseError>;

    async fn insert_articles(
        &self,
        articles: Vec<NewArticle>,
    ) -> Result<Vec<Article>, DatabaseError>;

    async fn select_comments(
        &self,
        query: &CommentQuery,
    ) -> Result<QueryResults<Comment>, DatabaseError>;

    async fn insert_comments(
        &self,
        comments: Vec<NewComment>,
    ) -> Result<Vec<Comment>, DatabaseError>;

    /// Applies `changes` to every comment matching the query's filters and
    /// returns the number of rows changed.
    async fn update_comments(
        &self,
        query: &CommentQuery,
        changes: CommentChanges,
    ) -> Result<u64, DatabaseError>;

    async fn delete_comments(&self, query: &CommentQuery) -> Result<u64, DatabaseError>;

    async fn select_gallery(
        &self,
        query: &GalleryQuery,
    ) -> Result<QueryResults<GalleryItem>, DatabaseError>;

    async fn insert_gallery_items(
        &self,
        items: Vec<NewGalleryItem>,
    ) -> Result<Vec<GalleryItem>, DatabaseError>;
}
