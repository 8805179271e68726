use std::{collections::HashMap, env, marker::PhantomData, path::PathBuf, sync::Arc};

use chrono::DateTime;
use chrono_tz::Tz;
use database::{ContentStore, DatabaseError, MemoryStore, PgStore};
use log::{error, info, warn};
use percent_encoding::{utf8_percent_encode, AsciiSet};
use rocket::{
    fairing::AdHoc,
    fs::FileServer,
    http::{uri::Reference, Status},
    request::{FlashMessage, FromRequest, Outcome},
    response::Redirect,
    Build, Request, Rocket, State,
};
use rocket_dyn_templates::{tera, tera::Value, Template};
use serde::Serialize;

use crate::configuration::{
    Configuration, ConfigurationManager, DatabaseUrl, SiteDefaultTimezone, SiteName,
};

use self::auth::AdminSession;

mod about;
mod admin;
mod articles;
mod auth;
mod forms;
mod gallery;

pub type Store = Arc<dyn ContentStore>;

fn content_store(store: &State<Store>) -> &dyn ContentStore {
    store.inner().as_ref()
}

fn root_path() -> PathBuf {
    if let Ok(value) = env::var("CARGO_MANIFEST_DIR") {
        let path = PathBuf::from(value);
        path.parent().map(|parent| parent.to_path_buf()).unwrap_or(path)
    } else {
        env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }
}

fn base_rocket(configuration: ConfigurationManager) -> Rocket<Build> {
    let root_path = root_path();
    let figment =
        rocket::Config::figment().merge(("template_dir", root_path.join("templates")));
    let timezone = SiteDefaultTimezone::get_for_chrono(&configuration);
    let site_name = TeraConfiguration::<SiteName>::new(configuration.clone());

    rocket::custom(figment)
        .attach(Template::custom(move |engines| {
            engines
                .tera
                .register_filter("display_date", DisplayDate { timezone });
            engines
                .tera
                .register_function("site_name", site_name.clone());
        }))
        .manage(configuration)
        .mount(
            "/",
            routes![
                articles::home,
                articles::article_by_slug,
                articles::post_comment,
                gallery::gallery,
                about::about,
                about::clock,
                auth::signin,
                auth::signin_post,
                auth::signout,
                admin::dashboard,
                admin::save_article,
                admin::save_gallery_item,
                admin::approve_comment,
                admin::delete_comment,
                admin::post_without_session,
            ],
        )
        .mount("/static", FileServer::from(root_path.join("static")))
        .register("/", catchers![not_found])
}

/// Connects to Postgres when a database URL is configured, otherwise keeps
/// content in memory for the life of the process.
pub fn rocket_server(configuration: ConfigurationManager) -> Rocket<Build> {
    let database_url = configuration.get::<DatabaseUrl>();

    base_rocket(configuration).attach(AdHoc::try_on_ignite(
        "Content Store",
        |rocket| async move {
            let store: Store = match database_url {
                Some(database_url) => match connect_postgres(&database_url).await {
                    Ok(store) => Arc::new(store),
                    Err(err) => {
                        error!("could not open the database: {:?}", err);
                        return Err(rocket);
                    }
                },
                None => {
                    warn!(
                        "{} is not set, content will only be kept in memory",
                        DatabaseUrl::environment_variable()
                    );
                    Arc::new(MemoryStore::default())
                }
            };

            Ok(rocket.manage(store))
        },
    ))
}

async fn connect_postgres(database_url: &str) -> anyhow::Result<PgStore> {
    let store = PgStore::connect(database_url).await?;
    store.migrate().await?;
    info!("connected to postgres, migrations applied");
    Ok(store)
}

#[cfg(test)]
pub fn rocket_with_store(configuration: ConfigurationManager, store: Store) -> Rocket<Build> {
    base_rocket(configuration).manage(store)
}

pub struct TeraConfiguration<T> {
    manager: ConfigurationManager,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> TeraConfiguration<T> {
    pub fn new(manager: ConfigurationManager) -> Self {
        Self {
            manager,
            _phantom: PhantomData,
        }
    }
}

impl<T> Clone for TeraConfiguration<T> {
    fn clone(&self) -> Self {
        Self::new(self.manager.clone())
    }
}

impl<T> tera::Function for TeraConfiguration<T>
where
    T: Configuration + 'static,
    T::Type: ToString,
{
    fn call(&self, _args: &HashMap<String, Value>) -> tera::Result<Value> {
        let value = self
            .manager
            .get::<T>()
            .ok_or_else(|| tera::Error::msg("no value found"))?;
        Ok(Value::String(value.to_string()))
    }
}

/// Formats an RFC 3339 timestamp as "November 16, 2008" in the site's time
/// zone.
struct DisplayDate {
    timezone: Tz,
}

impl tera::Filter for DisplayDate {
    fn filter(&self, value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
        let timestamp = value
            .as_str()
            .ok_or_else(|| tera::Error::msg("display_date expects a timestamp string"))?;
        let parsed = DateTime::parse_from_rfc3339(timestamp)
            .map_err(|err| tera::Error::msg(format!("invalid timestamp: {}", err)))?;

        Ok(Value::String(
            parsed
                .with_timezone(&self.timezone)
                .format("%B %-d, %Y")
                .to_string(),
        ))
    }
}

#[derive(Debug, Serialize)]
pub struct Notice {
    pub kind: String,
    pub message: String,
}

/// Per-request values every template receives.
#[derive(Debug, Serialize)]
pub struct RequestData {
    pub current_path: String,
    pub current_query: Option<String>,
    pub current_path_and_query: String,
    pub authenticated: bool,
    pub flash: Option<Notice>,
}

#[derive(Debug)]
pub struct FullPathAndQuery {
    pub path: String,
    pub query: Option<String>,
}

impl RequestData {
    pub fn new(
        path: FullPathAndQuery,
        session: Option<AdminSession>,
        flash: Option<FlashMessage<'_>>,
    ) -> Self {
        let mut current_path_and_query = path.path.clone();
        if let Some(query) = &path.query {
            current_path_and_query += "?";
            current_path_and_query += query;
        }

        Self {
            current_path: path.path,
            current_query: path.query,
            current_path_and_query,
            authenticated: session.is_some(),
            flash: flash.map(|flash| Notice {
                kind: flash.kind().to_string(),
                message: flash.message().to_string(),
            }),
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for FullPathAndQuery {
    type Error = std::convert::Infallible;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let path = request.uri().path().to_string();
        let query = request.uri().query().map(|query| query.to_string());

        Outcome::Success(FullPathAndQuery { path, query })
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for RequestData {
    type Error = std::convert::Infallible;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let path = match request.guard::<FullPathAndQuery>().await {
            Outcome::Success(path) => path,
            _ => FullPathAndQuery {
                path: request.uri().path().to_string(),
                query: None,
            },
        };
        let session = request
            .guard::<Option<AdminSession>>()
            .await
            .succeeded()
            .flatten();
        let flash = request
            .guard::<Option<FlashMessage<'_>>>()
            .await
            .succeeded()
            .flatten();

        Outcome::Success(RequestData::new(path, session, flash))
    }
}

#[derive(Serialize)]
struct NotFoundContext {
    request: RequestData,
}

#[catch(404)]
fn not_found(request: &Request<'_>) -> Template {
    let path = FullPathAndQuery {
        path: request.uri().path().to_string(),
        query: request.uri().query().map(|query| query.to_string()),
    };

    Template::render(
        "not_found",
        NotFoundContext {
            request: RequestData::new(path, None, None),
        },
    )
}

trait ResultExt<T> {
    fn map_database_to_http(self) -> Result<T, Status>;

    fn map_to_failure(self) -> Result<T, Failure>
    where
        Self: Sized,
    {
        self.map_database_to_http().map_err(Failure::Status)
    }
}

impl<T> ResultExt<T> for Result<T, DatabaseError> {
    fn map_database_to_http(self) -> Result<T, Status> {
        self.map_err(|err| match err {
            DatabaseError::RowNotFound => Status::NotFound,
            other_error => {
                error!("unexpected database error: {:?}", other_error);
                Status::InternalServerError
            }
        })
    }
}

#[derive(Debug, Responder)]
#[allow(clippy::large_enum_variant)]
pub enum Failure {
    Status(Status),
    Redirect(Redirect),
}

impl<E> From<E> for Failure
where
    E: std::error::Error,
{
    fn from(error: E) -> Self {
        error!("error processing request: {:?}", error);

        Failure::Status(Status::InternalServerError)
    }
}

const QUERY: &AsciiSet = &percent_encoding::NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.');

impl Failure {
    pub fn redirect<U: TryInto<Reference<'static>>>(destination: U) -> Self {
        Self::Redirect(Redirect::to(destination))
    }

    pub fn redirect_to_signin(origin: &str) -> Self {
        let origin = utf8_percent_encode(origin, QUERY);
        Self::redirect(format!("/admin?origin={}", origin))
    }

    pub fn not_found() -> Self {
        Self::Status(Status::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono_tz::Tz;
    use rocket::http::Status;
    use rocket_dyn_templates::tera::{Filter, Value};

    use super::DisplayDate;
    use crate::test_helpers;

    #[test]
    fn display_date_uses_site_timezone() {
        let filter = DisplayDate {
            timezone: Tz::US__Pacific,
        };
        let formatted = filter
            .filter(
                &Value::String(String::from("2008-11-16T05:00:00Z")),
                &HashMap::new(),
            )
            .unwrap();
        assert_eq!(formatted, Value::String(String::from("November 15, 2008")));

        assert!(filter.filter(&Value::Bool(true), &HashMap::new()).is_err());
    }

    #[rocket::async_test]
    async fn unknown_paths_render_not_found() -> anyhow::Result<()> {
        let (client, _store) = test_helpers::test_client().await?;
        let response = client.get("/no/such/page").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
        let body = response.into_string().await.unwrap_or_default();
        assert!(body.contains("Page not found"));

        Ok(())
    }

    #[rocket::async_test]
    async fn static_files_are_served() -> anyhow::Result<()> {
        let (client, _store) = test_helpers::test_client().await?;
        let response = client.get("/static/site.css").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        Ok(())
    }
}
