use super::Configuration;

pub struct LifespanYears;

impl Configuration for LifespanYears {
    type Type = u32;

    fn default() -> Option<Self::Type> {
        Some(80)
    }

    fn key() -> &'static str {
        "lifespan-years"
    }
}
