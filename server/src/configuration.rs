mod admin_password;
mod birth_date;
mod database_url;
mod lifespan_years;
mod site_default_timezone;
mod site_name;
mod social_links;

pub use self::{
    admin_password::AdminPassword,
    birth_date::BirthDate,
    database_url::DatabaseUrl,
    lifespan_years::LifespanYears,
    site_default_timezone::SiteDefaultTimezone,
    site_name::SiteName,
    social_links::{SocialLink, SocialLinks},
};

use log::{error, warn};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

pub trait Configuration {
    type Type: Serialize + DeserializeOwned;

    fn default() -> Option<Self::Type>;
    fn key() -> &'static str;

    /// `site-name` is read from `SITE_NAME`.
    fn environment_variable() -> String {
        Self::key().to_uppercase().replace('-', "_")
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigurationManager {
    active_configuration: Arc<RwLock<HashMap<String, Value>>>,
}

impl ConfigurationManager {
    pub fn from_environment() -> Self {
        let manager = Self::default();
        manager.load_from_environment::<SiteName>();
        manager.load_from_environment::<SiteDefaultTimezone>();
        manager.load_from_environment::<AdminPassword>();
        manager.load_from_environment::<DatabaseUrl>();
        manager.load_from_environment::<BirthDate>();
        manager.load_from_environment::<LifespanYears>();
        manager.load_from_environment::<SocialLinks>();
        manager
    }

    fn load_from_environment<T: Configuration>(&self) {
        if let Ok(raw) = std::env::var(T::environment_variable()) {
            self.insert(T::key(), Value::String(raw));
        }
    }

    fn insert(&self, key: &str, value: Value) {
        if let Ok(mut configuration) = self.active_configuration.write() {
            configuration.insert(key.to_string(), value);
        }
    }

    pub fn set<T: Configuration>(&self, value: T::Type) {
        match serde_json::to_value(value) {
            Ok(value) => self.insert(T::key(), value),
            Err(err) => error!("could not store configuration {}: {}", T::key(), err),
        }
    }

    /// Environment values arrive as strings, so a value that doesn't
    /// deserialize directly is parsed again as JSON text. Invalid values fall
    /// back to the key's default.
    pub fn get<T: Configuration>(&self) -> Option<T::Type> {
        let value = {
            let configuration = self.active_configuration.read().ok()?;
            configuration.get(T::key()).cloned()
        };

        match value {
            Some(value) => decode::<T::Type>(&value).or_else(|| {
                warn!("ignoring invalid value for {}: {}", T::key(), value);
                T::default()
            }),
            None => T::default(),
        }
    }
}

fn decode<T: DeserializeOwned>(value: &Value) -> Option<T> {
    serde_json::from_value(value.clone()).ok().or_else(|| {
        value
            .as_str()
            .and_then(|raw| serde_json::from_str(raw).ok())
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let manager = ConfigurationManager::default();
        assert_eq!(manager.get::<SiteName>().as_deref(), Some("Cognito"));
        assert_eq!(manager.get::<LifespanYears>(), Some(80));
        assert_eq!(manager.get::<AdminPassword>(), None);
        assert_eq!(manager.get::<SocialLinks>(), Some(Vec::new()));
    }

    #[test]
    fn string_values_are_parsed() {
        let manager = ConfigurationManager::default();
        manager.insert("lifespan-years", Value::String(String::from("90")));
        manager.insert("birth-date", Value::String(String::from("1990-02-28")));
        manager.insert(
            "social-links",
            Value::String(String::from(
                r#"[{"name":"Email","username":"me","url":"mailto:me@example.com"}]"#,
            )),
        );

        assert_eq!(manager.get::<LifespanYears>(), Some(90));
        assert_eq!(
            manager.get::<BirthDate>(),
            NaiveDate::from_ymd_opt(1990, 2, 28)
        );
        let links = manager.get::<SocialLinks>().unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "mailto:me@example.com");
    }

    #[test]
    fn invalid_values_fall_back_to_default() {
        let manager = ConfigurationManager::default();
        manager.insert("lifespan-years", Value::String(String::from("forever")));
        assert_eq!(manager.get::<LifespanYears>(), Some(80));
    }

    #[test]
    fn set_overrides() {
        let manager = ConfigurationManager::default();
        manager.set::<SiteName>(String::from("Elsewhere"));
        assert_eq!(manager.get::<SiteName>().as_deref(), Some("Elsewhere"));
    }

    #[test]
    fn environment_variable_names() {
        assert_eq!(SiteDefaultTimezone::environment_variable(), "SITE_DEFAULT_TIMEZONE");
        assert_eq!(AdminPassword::environment_variable(), "ADMIN_PASSWORD");
    }
}
