use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::ContentStore;
use crate::{
    query::{Query, QueryResults},
    schema::cms::{
        Article, ArticleFilter, ArticleQuery, Comment, CommentChanges, CommentFilter,
        CommentQuery, GalleryFilter, GalleryItem, GalleryQuery, NewArticle, NewComment,
        NewGalleryItem,
    },
    DatabaseError,
};

/// An in-process store with the same observable behavior as the Postgres
/// schema: unique slugs, comment foreign keys and newest-first ordering.
#[derive(Debug, Default)]
pub struct MemoryStore {
    articles: RwLock<Vec<Article>>,
    comments: RwLock<Vec<Comment>>,
    gallery: RwLock<Vec<GalleryItem>>,
}

trait Record: Clone {
    fn created_at(&self) -> DateTime<Utc>;
}

trait Matches<R> {
    fn matches(&self, record: &R) -> bool;
}

impl Record for Article {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Record for Comment {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Record for GalleryItem {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Matches<Article> for ArticleFilter {
    fn matches(&self, article: &Article) -> bool {
        match self {
            ArticleFilter::Id(id) => article.id == *id,
            ArticleFilter::Ids(ids) => ids.contains(&article.id),
            ArticleFilter::Slug(slug) => article.slug == *slug,
            ArticleFilter::Published(published) => article.is_published == *published,
        }
    }
}

impl Matches<Comment> for CommentFilter {
    fn matches(&self, comment: &Comment) -> bool {
        match self {
            CommentFilter::Id(id) => comment.id == *id,
            CommentFilter::ArticleId(article_id) => comment.article_id == *article_id,
            CommentFilter::Approved(approved) => comment.is_approved == *approved,
        }
    }
}

impl Matches<GalleryItem> for GalleryFilter {
    fn matches(&self, item: &GalleryItem) -> bool {
        match self {
            GalleryFilter::Id(id) => item.id == *id,
            GalleryFilter::Published(published) => item.is_published == *published,
        }
    }
}

fn matches_all<R, F: Matches<R>>(filters: &[F], record: &R) -> bool {
    filters.iter().all(|filter| filter.matches(record))
}

fn select<R: Record, F: Matches<R>>(records: &[R], query: &Query<F>) -> QueryResults<R> {
    // Later insertions win ties so rows created within the same clock tick
    // still come back in insertion order.
    let mut matching = records
        .iter()
        .enumerate()
        .filter(|(_, record)| matches_all(query.filters(), *record))
        .collect::<Vec<_>>();
    let ascending = query.ordering().ascending;
    matching.sort_by(|(a_index, a), (b_index, b)| {
        let ordering = a
            .created_at()
            .cmp(&b.created_at())
            .then(a_index.cmp(b_index));
        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });

    let total_count = matching.len();
    let (start_at, page_size) = match query.pagination() {
        Some(pagination) => (pagination.start_at, pagination.page_size),
        None => (0, total_count),
    };

    QueryResults {
        records: matching
            .into_iter()
            .skip(start_at)
            .take(page_size)
            .map(|(_, record)| record.clone())
            .collect(),
        total_count: if query.is_count_exact() {
            Some(total_count)
        } else {
            None
        },
        start_at,
    }
}

fn require_filters<F>(query: &Query<F>) -> Result<(), DatabaseError> {
    if query.filters().is_empty() {
        Err(DatabaseError::MissingFilter)
    } else {
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn select_articles(
        &self,
        query: &ArticleQuery,
    ) -> Result<QueryResults<Article>, DatabaseError> {
        Ok(select(&self.articles.read().await, query))
    }

    async fn insert_articles(
        &self,
        articles: Vec<NewArticle>,
    ) -> Result<Vec<Article>, DatabaseError> {
        let mut table = self.articles.write().await;
        for (index, article) in articles.iter().enumerate() {
            let taken = table.iter().any(|existing| existing.slug == article.slug)
                || articles[..index]
                    .iter()
                    .any(|earlier| earlier.slug == article.slug);
            if taken {
                return Err(DatabaseError::Conflict);
            }
        }

        let created_at = Utc::now();
        let inserted = articles
            .into_iter()
            .map(|article| article.into_article(Uuid::new_v4(), created_at))
            .collect::<Vec<_>>();
        table.extend(inserted.iter().cloned());

        Ok(inserted)
    }

    async fn select_comments(
        &self,
        query: &CommentQuery,
    ) -> Result<QueryResults<Comment>, DatabaseError> {
        Ok(select(&self.comments.read().await, query))
    }

    async fn insert_comments(
        &self,
        comments: Vec<NewComment>,
    ) -> Result<Vec<Comment>, DatabaseError> {
        {
            let articles = self.articles.read().await;
            let all_referenced = comments.iter().all(|comment| {
                articles
                    .iter()
                    .any(|article| article.id == comment.article_id)
            });
            if !all_referenced {
                return Err(DatabaseError::InvalidReference);
            }
        }

        let created_at = Utc::now();
        let inserted = comments
            .into_iter()
            .map(|comment| comment.into_comment(Uuid::new_v4(), created_at))
            .collect::<Vec<_>>();
        self.comments.write().await.extend(inserted.iter().cloned());

        Ok(inserted)
    }

    async fn update_comments(
        &self,
        query: &CommentQuery,
        changes: CommentChanges,
    ) -> Result<u64, DatabaseError> {
        require_filters(query)?;

        let mut comments = self.comments.write().await;
        let mut updated = 0;
        for comment in comments
            .iter_mut()
            .filter(|comment| matches_all(query.filters(), &**comment))
        {
            if let Some(is_approved) = changes.is_approved {
                comment.is_approved = is_approved;
            }
            updated += 1;
        }

        Ok(updated)
    }

    async fn delete_comments(&self, query: &CommentQuery) -> Result<u64, DatabaseError> {
        require_filters(query)?;

        let mut comments = self.comments.write().await;
        let before = comments.len();
        comments.retain(|comment| !matches_all(query.filters(), comment));

        Ok((before - comments.len()) as u64)
    }

    async fn select_gallery(
        &self,
        query: &GalleryQuery,
    ) -> Result<QueryResults<GalleryItem>, DatabaseError> {
        Ok(select(&self.gallery.read().await, query))
    }

    async fn insert_gallery_items(
        &self,
        items: Vec<NewGalleryItem>,
    ) -> Result<Vec<GalleryItem>, DatabaseError> {
        let created_at = Utc::now();
        let inserted = items
            .into_iter()
            .map(|item| item.into_item(Uuid::new_v4(), created_at))
            .collect::<Vec<_>>();
        self.gallery.write().await.extend(inserted.iter().cloned());

        Ok(inserted)
    }
}
