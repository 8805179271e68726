use super::Configuration;

pub struct DatabaseUrl;

impl Configuration for DatabaseUrl {
    type Type = String;

    fn default() -> Option<Self::Type> {
        None
    }

    fn key() -> &'static str {
        "database-url"
    }
}
