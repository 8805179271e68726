use chrono::{DateTime, Utc};
use database::schema::cms::{Article, Comment};
use log::error;
use rocket::{
    form::Form,
    response::{Flash, Redirect},
    State,
};
use rocket_dyn_templates::Template;
use serde::Serialize;

use super::{content_store, forms::CommentForm, Failure, RequestData, ResultExt, Store};
use crate::content::{self, Block};

const EXCERPT_LENGTH: usize = 160;

#[derive(Serialize)]
struct ArticleCard {
    title: String,
    slug: String,
    excerpt: Option<String>,
    cover_image_url: Option<String>,
    category: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<Article> for ArticleCard {
    fn from(article: Article) -> Self {
        Self {
            excerpt: content::excerpt(&article.content_markdown, EXCERPT_LENGTH),
            title: article.title,
            slug: article.slug,
            cover_image_url: article.cover_image_url,
            category: article.category,
            created_at: article.created_at,
        }
    }
}

#[derive(Serialize)]
struct HomeContext {
    request: RequestData,
    articles: Vec<ArticleCard>,
    error_message: Option<String>,
}

#[get("/")]
pub async fn home(store: &State<Store>, request: RequestData) -> Template {
    let (articles, error_message) = match Article::list_published(content_store(store)).await {
        Ok(articles) => (articles, None),
        Err(err) => {
            error!("error loading articles: {:?}", err);
            (
                Vec::new(),
                Some(String::from("Articles could not be loaded right now.")),
            )
        }
    };

    Template::render(
        "home",
        HomeContext {
            request,
            articles: articles.into_iter().map(ArticleCard::from).collect(),
            error_message,
        },
    )
}

#[derive(Serialize)]
struct ArticleContext<'a> {
    request: RequestData,
    article: &'a Article,
    blocks: Vec<Block<'a>>,
    comments: Vec<Comment>,
}

#[get("/article/<slug>")]
pub async fn article_by_slug(
    slug: &str,
    store: &State<Store>,
    request: RequestData,
) -> Result<Template, Failure> {
    let article = Article::find_published_by_slug(content_store(store), slug)
        .await
        .map_to_failure()?;
    let comments = Comment::list_approved_for(content_store(store), article.id)
        .await
        .map_to_failure()?;

    Ok(Template::render(
        "article",
        ArticleContext {
            request,
            blocks: content::render(&article.content_markdown).collect(),
            article: &article,
            comments,
        },
    ))
}

#[post("/article/<slug>/comments", data = "<form>")]
pub async fn post_comment(
    slug: &str,
    form: Form<CommentForm>,
    store: &State<Store>,
) -> Result<Flash<Redirect>, Failure> {
    let article = Article::find_published_by_slug(content_store(store), slug)
        .await
        .map_to_failure()?;
    let destination = || Redirect::to(article.permalink());

    let comment = match form.validate(article.id) {
        Ok(comment) => comment,
        Err(err) => return Ok(Flash::error(destination(), err.to_string())),
    };

    match Comment::create(content_store(store), comment).await {
        Ok(_) => Ok(Flash::success(
            destination(),
            "Thank you for your comment! It has been submitted for review.",
        )),
        Err(err) => {
            error!("error submitting comment: {:?}", err);
            Ok(Flash::error(destination(), "Error submitting comment"))
        }
    }
}
