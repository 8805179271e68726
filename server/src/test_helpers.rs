use std::sync::Arc;

use database::{
    query::QueryResults,
    schema::cms::{
        Article, ArticleQuery, Comment, CommentChanges, CommentQuery, GalleryItem, GalleryQuery,
        MediaKind, NewArticle, NewComment, NewGalleryItem,
    },
    sqlx, ContentStore, DatabaseError, MemoryStore,
};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use rocket::{
    http::{ContentType, Status},
    local::asynchronous::Client,
};
use uuid::Uuid;

use crate::{
    configuration::{AdminPassword, ConfigurationManager},
    webserver::rocket_with_store,
};

pub const TEST_ADMIN_PASSWORD: &str = "correct horse battery staple";

pub fn test_configuration() -> ConfigurationManager {
    let configuration = ConfigurationManager::default();
    configuration.set::<AdminPassword>(TEST_ADMIN_PASSWORD.to_string());
    configuration
}

pub async fn test_client() -> anyhow::Result<(Client, Arc<MemoryStore>)> {
    test_client_with(test_configuration()).await
}

pub async fn test_client_with(
    configuration: ConfigurationManager,
) -> anyhow::Result<(Client, Arc<MemoryStore>)> {
    let store = Arc::new(MemoryStore::default());
    let client = Client::tracked(rocket_with_store(configuration, store.clone())).await?;

    Ok((client, store))
}

/// A backend that has lost its connection: every write fails, and reads fail
/// too when `fail_reads` is set. Otherwise reads come from `inner`.
#[derive(Debug, Default)]
pub struct UnreliableStore {
    pub inner: MemoryStore,
    pub fail_reads: bool,
}

fn unavailable() -> DatabaseError {
    DatabaseError::Other(sqlx::Error::PoolTimedOut)
}

impl UnreliableStore {
    fn check_reads(&self) -> Result<(), DatabaseError> {
        if self.fail_reads {
            Err(unavailable())
        } else {
            Ok(())
        }
    }
}

#[rocket::async_trait]
impl ContentStore for UnreliableStore {
    async fn select_articles(
        &self,
        query: &ArticleQuery,
    ) -> Result<QueryResults<Article>, DatabaseError> {
        self.check_reads()?;
        self.inner.select_articles(query).await
    }

    async fn insert_articles(&self, _: Vec<NewArticle>) -> Result<Vec<Article>, DatabaseError> {
        Err(unavailable())
    }

    async fn select_comments(
        &self,
        query: &CommentQuery,
    ) -> Result<QueryResults<Comment>, DatabaseError> {
        self.check_reads()?;
        self.inner.select_comments(query).await
    }

    async fn insert_comments(&self, _: Vec<NewComment>) -> Result<Vec<Comment>, DatabaseError> {
        Err(unavailable())
    }

    async fn update_comments(
        &self,
        _: &CommentQuery,
        _: CommentChanges,
    ) -> Result<u64, DatabaseError> {
        Err(unavailable())
    }

    async fn delete_comments(&self, _: &CommentQuery) -> Result<u64, DatabaseError> {
        Err(unavailable())
    }

    async fn select_gallery(
        &self,
        query: &GalleryQuery,
    ) -> Result<QueryResults<GalleryItem>, DatabaseError> {
        self.check_reads()?;
        self.inner.select_gallery(query).await
    }

    async fn insert_gallery_items(
        &self,
        _: Vec<NewGalleryItem>,
    ) -> Result<Vec<GalleryItem>, DatabaseError> {
        Err(unavailable())
    }
}

pub async fn unreliable_client(
    store: UnreliableStore,
) -> anyhow::Result<(Client, Arc<UnreliableStore>)> {
    let store = Arc::new(store);
    let client = Client::tracked(rocket_with_store(test_configuration(), store.clone())).await?;

    Ok((client, store))
}

/// Encodes `fields` as an `application/x-www-form-urlencoded` body.
pub fn form_body(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(name, NON_ALPHANUMERIC),
                utf8_percent_encode(value, NON_ALPHANUMERIC)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

pub async fn sign_in(client: &Client) -> anyhow::Result<()> {
    let response = client
        .post("/admin")
        .header(ContentType::Form)
        .body(form_body(&[("password", TEST_ADMIN_PASSWORD)]))
        .dispatch()
        .await;
    anyhow::ensure!(
        response.status() == Status::SeeOther,
        "sign in failed with {}",
        response.status()
    );

    Ok(())
}

pub async fn seed_article(
    store: &MemoryStore,
    title: &str,
    slug: &str,
    is_published: bool,
) -> anyhow::Result<Article> {
    Ok(Article::create(
        store,
        NewArticle {
            title: title.to_string(),
            slug: slug.to_string(),
            content_markdown: String::from("# Welcome\n\nSome text\n> A quote"),
            cover_image_url: None,
            category: None,
            is_published,
        },
    )
    .await?)
}

pub async fn seed_comment(
    store: &MemoryStore,
    article_id: Uuid,
    author_name: &str,
) -> anyhow::Result<Comment> {
    Ok(Comment::create(
        store,
        NewComment {
            article_id,
            author_name: author_name.to_string(),
            comment_text: format!("A comment from {}", author_name),
        },
    )
    .await?)
}

pub async fn seed_image(store: &MemoryStore, title: &str) -> anyhow::Result<GalleryItem> {
    Ok(GalleryItem::create(
        store,
        NewGalleryItem {
            title: title.to_string(),
            description: None,
            media_url: String::from("https://example.com/image.jpg"),
            media_type: MediaKind::Image,
            embed_html: None,
            category: None,
            is_published: true,
        },
    )
    .await?)
}
