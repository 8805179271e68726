use chrono::NaiveDate;

use super::Configuration;

pub struct BirthDate;

impl Configuration for BirthDate {
    type Type = NaiveDate;

    fn default() -> Option<Self::Type> {
        NaiveDate::from_ymd_opt(2008, 11, 16)
    }

    fn key() -> &'static str {
        "birth-date"
    }
}
