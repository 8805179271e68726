use log::{info, warn};
use rocket::{
    form::Form,
    http::{Cookie, CookieJar, SameSite, Status},
    request::{FromRequest, Outcome},
    response::Redirect,
    Request, State,
};
use rocket_dyn_templates::Template;
use serde::Serialize;

use super::RequestData;
use crate::configuration::{AdminPassword, ConfigurationManager};

pub const ADMIN_COOKIE: &str = "admin_authenticated";
const AUTHENTICATED_FLAG: &str = "true";
const DASHBOARD_PATH: &str = "/admin/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid password")]
    InvalidPassword,
}

impl AuthState {
    pub fn restore(flag: Option<&str>) -> Self {
        match flag {
            Some(AUTHENTICATED_FLAG) => AuthState::Authenticated,
            _ => AuthState::Anonymous,
        }
    }

    /// Compares `attempt` with the configured secret verbatim. Without a
    /// configured secret nobody can sign in.
    pub fn login(self, attempt: &str, secret: Option<&str>) -> Result<Self, AuthError> {
        match secret {
            Some(secret) if !secret.is_empty() && attempt == secret => {
                Ok(AuthState::Authenticated)
            }
            _ => Err(AuthError::InvalidPassword),
        }
    }

    pub fn logout(self) -> Self {
        AuthState::Anonymous
    }

    pub fn stored_flag(&self) -> Option<&'static str> {
        match self {
            AuthState::Authenticated => Some(AUTHENTICATED_FLAG),
            AuthState::Anonymous => None,
        }
    }
}

/// Proof that the request carries the admin flag.
#[derive(Debug, Clone, Copy)]
pub struct AdminSession;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminSession {
    type Error = std::convert::Infallible;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let cookie = request.cookies().get_private(ADMIN_COOKIE);
        match AuthState::restore(cookie.as_ref().map(|cookie| cookie.value())) {
            AuthState::Authenticated => Outcome::Success(AdminSession),
            AuthState::Anonymous => Outcome::Forward(Status::Unauthorized),
        }
    }
}

fn persist(cookies: &CookieJar<'_>, state: AuthState) {
    match state.stored_flag() {
        Some(flag) => cookies.add_private(
            Cookie::build((ADMIN_COOKIE, flag))
                .http_only(true)
                .same_site(SameSite::Strict)
                .path("/"),
        ),
        None => cookies.remove_private(ADMIN_COOKIE),
    }
}

/// Only same-site paths are accepted as post sign-in destinations.
fn safe_origin(origin: Option<&str>) -> Option<&str> {
    origin.filter(|origin| origin.starts_with('/') && !origin.starts_with("//"))
}

#[derive(Serialize)]
struct SignInContext {
    request: RequestData,
    origin: Option<String>,
    error_message: Option<String>,
}

#[get("/admin?<origin>")]
pub fn signin(
    origin: Option<&str>,
    session: Option<AdminSession>,
    request: RequestData,
) -> Result<Template, Redirect> {
    if session.is_some() {
        return Err(Redirect::to(
            safe_origin(origin).unwrap_or(DASHBOARD_PATH).to_string(),
        ));
    }

    Ok(Template::render(
        "signin",
        SignInContext {
            request,
            origin: safe_origin(origin).map(str::to_string),
            error_message: None,
        },
    ))
}

#[derive(FromForm, Debug)]
pub struct SignInForm {
    password: String,
    origin: Option<String>,
}

#[post("/admin", data = "<form>")]
pub fn signin_post(
    form: Form<SignInForm>,
    cookies: &CookieJar<'_>,
    configuration: &State<ConfigurationManager>,
    request: RequestData,
) -> Result<Redirect, Template> {
    let secret = configuration.get::<AdminPassword>();
    if secret.is_none() {
        warn!("admin sign-in attempted but no admin password is configured");
    }

    let origin = safe_origin(form.origin.as_deref()).map(str::to_string);
    match AuthState::Anonymous.login(&form.password, secret.as_deref()) {
        Ok(state) => {
            persist(cookies, state);
            info!("admin signed in");
            Ok(Redirect::to(
                origin.unwrap_or_else(|| String::from(DASHBOARD_PATH)),
            ))
        }
        Err(err) => Err(Template::render(
            "signin",
            SignInContext {
                request,
                origin,
                error_message: Some(err.to_string()),
            },
        )),
    }
}

#[get("/admin/signout")]
pub fn signout(cookies: &CookieJar<'_>) -> Redirect {
    let state = AuthState::restore(
        cookies
            .get_private(ADMIN_COOKIE)
            .as_ref()
            .map(|cookie| cookie.value()),
    );
    persist(cookies, state.logout());

    Redirect::to("/admin")
}
