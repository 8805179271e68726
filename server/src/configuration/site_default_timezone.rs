use chrono_tz::Tz;
use log::warn;

use super::{Configuration, ConfigurationManager};

pub struct SiteDefaultTimezone;

impl Configuration for SiteDefaultTimezone {
    type Type = String;

    fn default() -> Option<Self::Type> {
        Some(String::from("US/Pacific"))
    }

    fn key() -> &'static str {
        "site-default-timezone"
    }
}

impl SiteDefaultTimezone {
    pub fn get_for_chrono(manager: &ConfigurationManager) -> Tz {
        let name = manager.get::<Self>().unwrap_or_default();
        match name.parse::<Tz>() {
            Ok(timezone) => timezone,
            Err(_) => {
                warn!("unknown time zone '{}', using UTC", name);
                Tz::UTC
            }
        }
    }
}
