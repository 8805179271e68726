use chrono::{DateTime, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;

const SECOND_MS: i64 = 1_000;
const MINUTE_MS: i64 = 60 * SECOND_MS;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;
/// 365.25 days.
const YEAR_MS: i64 = 31_557_600_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub years: i64,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Clock {
    pub days_alive: i64,
    pub countdown: Countdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifetime {
    birth: DateTime<Utc>,
    lifespan_years: u32,
}

impl Lifetime {
    /// Starts the lifetime at midnight UTC on `birth_date`.
    pub fn new(birth_date: NaiveDate, lifespan_years: u32) -> Self {
        Self {
            birth: Utc.from_utc_datetime(&birth_date.and_time(NaiveTime::MIN)),
            lifespan_years,
        }
    }

    /// The birth date plus the lifespan in calendar years. A Feb 29 birthday
    /// ends on Feb 28 when the final year isn't a leap year.
    pub fn end(&self) -> DateTime<Utc> {
        self.birth
            .checked_add_months(Months::new(self.lifespan_years.saturating_mul(12)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn days_alive(&self, now: DateTime<Utc>) -> i64 {
        (now - self.birth).num_days().abs()
    }

    pub fn countdown(&self, now: DateTime<Utc>) -> Countdown {
        let remaining = (self.end() - now).num_milliseconds();
        if remaining <= 0 {
            return Countdown::default();
        }

        Countdown {
            years: remaining / YEAR_MS,
            days: (remaining % YEAR_MS) / DAY_MS,
            hours: (remaining % DAY_MS) / HOUR_MS,
            minutes: (remaining % HOUR_MS) / MINUTE_MS,
            seconds: (remaining % MINUTE_MS) / SECOND_MS,
        }
    }

    pub fn clock(&self, now: DateTime<Utc>) -> Clock {
        Clock {
            days_alive: self.days_alive(now),
            countdown: self.countdown(now),
        }
    }
}
