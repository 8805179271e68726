use database::{
    schema::cms::{Article, Comment, CommentView, GalleryItem},
    DatabaseError,
};
use log::{error, info};
use rocket::{
    form::Form,
    response::{Flash, Redirect},
    State,
};
use rocket_dyn_templates::Template;
use serde::Serialize;
use uuid::Uuid;

use super::{
    auth::AdminSession,
    content_store,
    forms::{ArticleForm, GalleryForm},
    Failure, RequestData, ResultExt, Store,
};

const RECENT_ARTICLE_LIMIT: usize = 10;
const LOAD_FAILURE_MESSAGE: &str = "Some content could not be loaded right now.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminTab {
    Articles,
    Gallery,
    Comments,
}

impl AdminTab {
    /// Unknown or missing tabs show the article editor.
    pub fn parse(tab: Option<&str>) -> Self {
        match tab {
            Some("gallery") => AdminTab::Gallery,
            Some("comments") => AdminTab::Comments,
            _ => AdminTab::Articles,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            AdminTab::Articles => "/admin/dashboard?tab=articles",
            AdminTab::Gallery => "/admin/dashboard?tab=gallery",
            AdminTab::Comments => "/admin/dashboard?tab=comments",
        }
    }
}

#[derive(Responder)]
#[allow(clippy::large_enum_variant)]
pub enum FormResponse {
    Saved(Flash<Redirect>),
    Rendered(Template),
}

#[derive(Serialize)]
struct DashboardContext {
    request: RequestData,
    tab: AdminTab,
    article_form: ArticleForm,
    gallery_form: GalleryForm,
    recent_articles: Vec<Article>,
    comments: Vec<CommentView>,
    error_message: Option<String>,
}

struct Dashboard {
    tab: AdminTab,
    article_form: ArticleForm,
    gallery_form: GalleryForm,
    error_message: Option<String>,
}

impl Dashboard {
    fn new(tab: AdminTab) -> Self {
        Self {
            tab,
            article_form: ArticleForm::default(),
            gallery_form: GalleryForm::default(),
            error_message: None,
        }
    }

    /// A listing that fails to load leaves its section empty. Any message
    /// already set by a failed save takes precedence over the load error.
    fn report_load_failure(&mut self, what: &str, err: DatabaseError) {
        error!("error loading {}: {:?}", what, err);
        self.error_message
            .get_or_insert_with(|| String::from(LOAD_FAILURE_MESSAGE));
    }

    /// Loads whatever the selected tab lists and renders the dashboard.
    async fn render(mut self, store: &State<Store>, request: RequestData) -> Template {
        let store = content_store(store);
        let recent_articles = if self.tab == AdminTab::Articles {
            match Article::list_recent(store, RECENT_ARTICLE_LIMIT).await {
                Ok(articles) => articles,
                Err(err) => {
                    self.report_load_failure("recent articles", err);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };
        let comments = if self.tab == AdminTab::Comments {
            match CommentView::list_for_moderation(store).await {
                Ok(comments) => comments,
                Err(err) => {
                    self.report_load_failure("comments", err);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Template::render(
            "dashboard",
            DashboardContext {
                request,
                tab: self.tab,
                article_form: self.article_form,
                gallery_form: self.gallery_form,
                recent_articles,
                comments,
                error_message: self.error_message,
            },
        )
    }
}

/// Sends visitors without a session to sign in, returning to `origin`
/// afterwards.
fn require_session(session: Option<AdminSession>, origin: &str) -> Result<(), Failure> {
    match session {
        Some(_) => Ok(()),
        None => Err(Failure::redirect_to_signin(origin)),
    }
}

#[get("/admin/dashboard?<tab>")]
pub async fn dashboard(
    tab: Option<&str>,
    session: Option<AdminSession>,
    store: &State<Store>,
    request: RequestData,
) -> Result<Template, Failure> {
    require_session(session, &request.current_path_and_query)?;

    Ok(Dashboard::new(AdminTab::parse(tab))
        .render(store, request)
        .await)
}

#[post("/admin/articles", data = "<form>")]
pub async fn save_article(
    _session: AdminSession,
    form: Form<ArticleForm>,
    store: &State<Store>,
    request: RequestData,
) -> FormResponse {
    let form = form.into_inner();
    let action = form.action();
    let error_message = match form.validate() {
        Ok(article) => match Article::create(content_store(store), article).await {
            Ok(article) => {
                info!("created article {}", article.slug);
                return FormResponse::Saved(Flash::success(
                    Redirect::to(AdminTab::Articles.path()),
                    action.success_message(),
                ));
            }
            Err(DatabaseError::Conflict) => {
                String::from("An article with this slug already exists")
            }
            Err(err) => {
                error!("error saving article: {:?}", err);
                action.failure_message().to_string()
            }
        },
        Err(err) => err.to_string(),
    };

    let mut dashboard = Dashboard::new(AdminTab::Articles);
    dashboard.article_form = form;
    dashboard.error_message = Some(error_message);
    FormResponse::Rendered(dashboard.render(store, request).await)
}

#[post("/admin/gallery", data = "<form>")]
pub async fn save_gallery_item(
    _session: AdminSession,
    form: Form<GalleryForm>,
    store: &State<Store>,
    request: RequestData,
) -> FormResponse {
    let mut form = form.into_inner();
    let error_message = if form.generates_embed() {
        form.generate_embed().err().map(|err| err.to_string())
    } else {
        match form.validate() {
            Ok(item) => match GalleryItem::create(content_store(store), item).await {
                Ok(_) => {
                    return FormResponse::Saved(Flash::success(
                        Redirect::to(AdminTab::Gallery.path()),
                        "Item added to gallery successfully!",
                    ));
                }
                Err(err) => {
                    error!("error adding to gallery: {:?}", err);
                    Some(String::from("Error adding to gallery"))
                }
            },
            Err(err) => Some(err.to_string()),
        }
    };

    let mut dashboard = Dashboard::new(AdminTab::Gallery);
    dashboard.gallery_form = form;
    dashboard.error_message = error_message;
    FormResponse::Rendered(dashboard.render(store, request).await)
}

fn parse_comment_id(id: &str) -> Result<Uuid, Failure> {
    id.parse().map_err(|_| Failure::not_found())
}

#[post("/admin/comments/<id>/approve")]
pub async fn approve_comment(
    id: &str,
    _session: AdminSession,
    store: &State<Store>,
) -> Result<Flash<Redirect>, Failure> {
    let id = parse_comment_id(id)?;
    Comment::approve(content_store(store), id)
        .await
        .map_to_failure()?;

    Ok(Flash::success(
        Redirect::to(AdminTab::Comments.path()),
        "Comment approved",
    ))
}

#[post("/admin/comments/<id>/delete")]
pub async fn delete_comment(
    id: &str,
    _session: AdminSession,
    store: &State<Store>,
) -> Result<Flash<Redirect>, Failure> {
    let id = parse_comment_id(id)?;
    Comment::delete(content_store(store), id)
        .await
        .map_to_failure()?;

    Ok(Flash::success(
        Redirect::to(AdminTab::Comments.path()),
        "Comment deleted",
    ))
}

/// Admin form posts that arrive without a session fall through to here and
/// are sent to sign in, before any form data is parsed.
#[post("/admin/<section>/<_..>", rank = 2)]
pub fn post_without_session(section: &str) -> Failure {
    Failure::redirect_to_signin(AdminTab::parse(Some(section)).path())
}
