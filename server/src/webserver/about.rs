use chrono::{NaiveDate, Utc};
use rocket::{serde::json::Json, State};
use rocket_dyn_templates::Template;
use serde::Serialize;

use super::RequestData;
use crate::{
    configuration::{BirthDate, ConfigurationManager, LifespanYears, SocialLink, SocialLinks},
    countdown::{Clock, Lifetime},
};

fn configured_lifetime(configuration: &ConfigurationManager) -> (NaiveDate, u32) {
    (
        configuration.get::<BirthDate>().unwrap_or_default(),
        configuration.get::<LifespanYears>().unwrap_or_default(),
    )
}

#[derive(Serialize)]
struct AboutContext {
    request: RequestData,
    birth_date: String,
    lifespan_years: u32,
    clock: Clock,
    social_links: Vec<SocialLink>,
}

#[get("/about")]
pub fn about(configuration: &State<ConfigurationManager>, request: RequestData) -> Template {
    let (birth_date, lifespan_years) = configured_lifetime(configuration);
    let lifetime = Lifetime::new(birth_date, lifespan_years);

    Template::render(
        "about",
        AboutContext {
            request,
            birth_date: birth_date.format("%B %-d, %Y").to_string(),
            lifespan_years,
            clock: lifetime.clock(Utc::now()),
            social_links: configuration.get::<SocialLinks>().unwrap_or_default(),
        },
    )
}

/// Current counter values, polled by the about page.
#[get("/about/clock")]
pub fn clock(configuration: &State<ConfigurationManager>) -> Json<Clock> {
    let (birth_date, lifespan_years) = configured_lifetime(configuration);
    Json(Lifetime::new(birth_date, lifespan_years).clock(Utc::now()))
}

#[cfg(test)]
mod tests {
    use rocket::http::Status;
    use serde_json::Value;

    use crate::{
        configuration::{SocialLink, SocialLinks},
        test_helpers,
    };

    #[rocket::async_test]
    async fn clock_reports_counters() -> anyhow::Result<()> {
        let (client, _store) = test_helpers::test_client().await?;
        let response = client.get("/about/clock").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let body = response.into_string().await.unwrap_or_default();
        let clock: Value = serde_json::from_str(&body)?;
        assert!(clock["days_alive"].as_i64().unwrap_or_default() > 6000);
        let years = clock["countdown"]["years"].as_i64().unwrap_or(-1);
        assert!((0..80).contains(&years));

        Ok(())
    }

    #[rocket::async_test]
    async fn about_lists_social_links() -> anyhow::Result<()> {
        let configuration = test_helpers::test_configuration();
        configuration.set::<SocialLinks>(vec![SocialLink {
            name: String::from("Telegram"),
            username: String::from("@someone"),
            url: String::from("https://t.me/someone"),
        }]);
        let (client, _store) = test_helpers::test_client_with(configuration).await?;

        let response = client.get("/about").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap_or_default();
        assert!(body.contains("t.me"));
        assert!(body.contains("@someone"));
        assert!(body.contains("/about/clock"));

        Ok(())
    }
}
