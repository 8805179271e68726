use async_trait::async_trait;
use sqlx::{
    migrate::MigrateError,
    postgres::{PgPool, PgRow},
    FromRow, Postgres, QueryBuilder, Row,
};

use super::ContentStore;
use crate::{
    connection::{connect, MIGRATOR},
    query::{Query, QueryResults},
    schema::cms::{
        Article, ArticleFilter, ArticleQuery, Comment, CommentChanges, CommentFilter,
        CommentQuery, GalleryFilter, GalleryItem, GalleryQuery, NewArticle, NewComment,
        NewGalleryItem,
    },
    DatabaseError, SqlxResultExt,
};

const ARTICLE_COLUMNS: &str =
    "id, title, slug, content_markdown, cover_image_url, category, is_published, created_at";
const COMMENT_COLUMNS: &str = "id, article_id, author_name, comment_text, is_approved, created_at";
const GALLERY_COLUMNS: &str =
    "id, title, description, media_url, media_type, embed_html, category, is_published, created_at";

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, DatabaseError> {
        let pool = connect(database_url).await.map_database_error()?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), MigrateError> {
        MIGRATOR.run(&self.pool).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Renders one equality filter as a SQL predicate with bound parameters.
trait SqlFilter {
    fn push_sql(&self, builder: &mut QueryBuilder<'_, Postgres>);
}

impl SqlFilter for ArticleFilter {
    fn push_sql(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        match self {
            ArticleFilter::Id(id) => {
                builder.push("id = ").push_bind(*id);
            }
            ArticleFilter::Ids(ids) => {
                builder.push("id = ANY(").push_bind(ids.clone()).push(")");
            }
            ArticleFilter::Slug(slug) => {
                builder.push("slug = ").push_bind(slug.clone());
            }
            ArticleFilter::Published(published) => {
                builder.push("is_published = ").push_bind(*published);
            }
        }
    }
}

impl SqlFilter for CommentFilter {
    fn push_sql(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        match self {
            CommentFilter::Id(id) => {
                builder.push("id = ").push_bind(*id);
            }
            CommentFilter::ArticleId(article_id) => {
                builder.push("article_id = ").push_bind(*article_id);
            }
            CommentFilter::Approved(approved) => {
                builder.push("is_approved = ").push_bind(*approved);
            }
        }
    }
}

impl SqlFilter for GalleryFilter {
    fn push_sql(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        match self {
            GalleryFilter::Id(id) => {
                builder.push("id = ").push_bind(*id);
            }
            GalleryFilter::Published(published) => {
                builder.push("is_published = ").push_bind(*published);
            }
        }
    }
}

fn push_filters<F: SqlFilter>(builder: &mut QueryBuilder<'_, Postgres>, filters: &[F]) {
    for (index, filter) in filters.iter().enumerate() {
        builder.push(if index == 0 { " WHERE " } else { " AND " });
        filter.push_sql(builder);
    }
}

/// Postgres bounds are `BIGINT`; anything larger saturates rather than wrapping
/// into a negative offset.
fn sql_bound(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn article_insert(articles: Vec<NewArticle>) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO articles (title, slug, content_markdown, cover_image_url, category, is_published) ",
    );
    builder.push_values(articles, |mut row, article| {
        row.push_bind(article.title)
            .push_bind(article.slug)
            .push_bind(article.content_markdown)
            .push_bind(article.cover_image_url)
            .push_bind(article.category)
            .push_bind(article.is_published);
    });
    builder.push(" RETURNING ").push(ARTICLE_COLUMNS);
    builder
}

fn comment_insert(comments: Vec<NewComment>) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO comments (article_id, author_name, comment_text) ",
    );
    builder.push_values(comments, |mut row, comment| {
        row.push_bind(comment.article_id)
            .push_bind(comment.author_name)
            .push_bind(comment.comment_text);
    });
    builder.push(" RETURNING ").push(COMMENT_COLUMNS);
    builder
}

fn gallery_insert(items: Vec<NewGalleryItem>) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO gallery (title, description, media_url, media_type, embed_html, category, is_published) ",
    );
    builder.push_values(items, |mut row, item| {
        row.push_bind(item.title)
            .push_bind(item.description)
            .push_bind(item.media_url)
            .push_bind(item.media_type.as_str())
            .push_bind(item.embed_html)
            .push_bind(item.category)
            .push_bind(item.is_published);
    });
    builder.push(" RETURNING ").push(GALLERY_COLUMNS);
    builder
}

impl PgStore {
    async fn select<T, F>(
        &self,
        table: &str,
        columns: &str,
        query: &Query<F>,
    ) -> Result<QueryResults<T>, DatabaseError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
        F: SqlFilter,
    {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT ");
        builder.push(columns);
        if query.is_count_exact() {
            builder.push(", count(*) OVER() AS total_count");
        }
        builder.push(" FROM ").push(table);
        push_filters(&mut builder, query.filters());
        builder.push(" ORDER BY ").push(query.ordering().to_sql());

        let start_at = query
            .pagination()
            .map(|pagination| pagination.start_at)
            .unwrap_or_default();
        if let Some(pagination) = query.pagination() {
            builder
                .push(" LIMIT ")
                .push_bind(sql_bound(pagination.page_size))
                .push(" OFFSET ")
                .push_bind(sql_bound(pagination.start_at));
        }

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_database_error()?;

        let total_count = if !query.is_count_exact() {
            None
        } else if let Some(row) = rows.first() {
            let total: i64 = row.try_get("total_count").map_database_error()?;
            Some(total as usize)
        } else if start_at > 0 {
            // A window function reports nothing for an empty page, so ask
            // separately when the page lies past the end.
            Some(self.count(table, query).await?)
        } else {
            Some(0)
        };

        let records = rows
            .iter()
            .map(|row| T::from_row(row))
            .collect::<Result<Vec<_>, _>>()
            .map_database_error()?;

        Ok(QueryResults {
            records,
            total_count,
            start_at,
        })
    }

    async fn count<F: SqlFilter>(
        &self,
        table: &str,
        query: &Query<F>,
    ) -> Result<usize, DatabaseError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT count(*) FROM ");
        builder.push(table);
        push_filters(&mut builder, query.filters());

        let row = builder
            .build()
            .fetch_one(&self.pool)
            .await
            .map_database_error()?;
        let total: i64 = row.try_get(0).map_database_error()?;

        Ok(total as usize)
    }
}

#[async_trait]
impl ContentStore for PgStore {
    async fn select_articles(
        &self,
        query: &ArticleQuery,
    ) -> Result<QueryResults<Article>, DatabaseError> {
        self.select("articles", ARTICLE_COLUMNS, query).await
    }

    async fn insert_articles(
        &self,
        articles: Vec<NewArticle>,
    ) -> Result<Vec<Article>, DatabaseError> {
        if articles.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = article_insert(articles);
        builder
            .build_query_as::<Article>()
            .fetch_all(&self.pool)
            .await
            .map_database_error()
    }

    async fn select_comments(
        &self,
        query: &CommentQuery,
    ) -> Result<QueryResults<Comment>, DatabaseError> {
        self.select("comments", COMMENT_COLUMNS, query).await
    }

    async fn insert_comments(
        &self,
        comments: Vec<NewComment>,
    ) -> Result<Vec<Comment>, DatabaseError> {
        if comments.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = comment_insert(comments);
        builder
            .build_query_as::<Comment>()
            .fetch_all(&self.pool)
            .await
            .map_database_error()
    }

    async fn update_comments(
        &self,
        query: &CommentQuery,
        changes: CommentChanges,
    ) -> Result<u64, DatabaseError> {
        if query.filters().is_empty() {
            return Err(DatabaseError::MissingFilter);
        }
        let is_approved = match changes.is_approved {
            Some(is_approved) => is_approved,
            None => return Ok(0),
        };

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE comments SET is_approved = ");
        builder.push_bind(is_approved);
        push_filters(&mut builder, query.filters());

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_database_error()?;

        Ok(result.rows_affected())
    }

    async fn delete_comments(&self, query: &CommentQuery) -> Result<u64, DatabaseError> {
        if query.filters().is_empty() {
            return Err(DatabaseError::MissingFilter);
        }

        let mut builder = QueryBuilder::<Postgres>::new("DELETE FROM comments");
        push_filters(&mut builder, query.filters());

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_database_error()?;

        Ok(result.rows_affected())
    }

    async fn select_gallery(
        &self,
        query: &GalleryQuery,
    ) -> Result<QueryResults<GalleryItem>, DatabaseError> {
        self.select("gallery", GALLERY_COLUMNS, query).await
    }

    async fn insert_gallery_items(
        &self,
        items: Vec<NewGalleryItem>,
    ) -> Result<Vec<GalleryItem>, DatabaseError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = gallery_insert(items);
        builder
            .build_query_as::<GalleryItem>()
            .fetch_all(&self.pool)
            .await
            .map_database_error()
    }
}

#[cfg(test)]
mod tests {
    use sqlx::{Execute, Postgres, QueryBuilder};
    use uuid::Uuid;

    use super::{gallery_insert, push_filters, sql_bound, PgStore};
    use crate::{
        schema::cms::{ArticleFilter, CommentFilter, MediaKind, NewGalleryItem},
        ContentStore,
    };

    fn assert_content_store<S: ContentStore>() {}

    #[test]
    fn postgres_backs_the_content_store() {
        assert_content_store::<PgStore>();
    }

    #[test]
    fn filters_are_joined_with_and() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT id FROM articles");
        push_filters(
            &mut builder,
            &[
                ArticleFilter::Published(true),
                ArticleFilter::Slug(String::from("hello")),
            ],
        );
        assert_eq!(
            builder.build().sql(),
            "SELECT id FROM articles WHERE is_published = $1 AND slug = $2"
        );
    }

    #[test]
    fn id_lists_use_any() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT id FROM articles");
        push_filters(&mut builder, &[ArticleFilter::Ids(vec![Uuid::new_v4()])]);
        assert_eq!(
            builder.build().sql(),
            "SELECT id FROM articles WHERE id = ANY($1)"
        );
    }

    #[test]
    fn no_filters_means_no_where_clause() {
        let mut builder = QueryBuilder::<Postgres>::new("DELETE FROM comments");
        push_filters::<CommentFilter>(&mut builder, &[]);
        assert_eq!(builder.build().sql(), "DELETE FROM comments");
    }

    #[test]
    fn gallery_rows_insert_in_one_statement() {
        let item = |title: &str| NewGalleryItem {
            title: title.to_string(),
            description: None,
            media_url: String::from("https://example.com/a.jpg"),
            media_type: MediaKind::Image,
            embed_html: None,
            category: None,
            is_published: true,
        };
        let mut builder = gallery_insert(vec![item("one"), item("two")]);
        assert_eq!(
            builder.build().sql(),
            "INSERT INTO gallery (title, description, media_url, media_type, embed_html, category, is_published) \
             VALUES ($1, $2, $3, $4, $5, $6, $7), ($8, $9, $10, $11, $12, $13, $14) \
             RETURNING id, title, description, media_url, media_type, embed_html, category, is_published, created_at"
        );
    }

    #[test]
    fn oversized_ranges_saturate() {
        assert_eq!(sql_bound(20), 20);
        assert_eq!(sql_bound(usize::MAX), i64::MAX);
    }
}
