use serde::{Deserialize, Serialize};

use super::Configuration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    pub name: String,
    pub username: String,
    pub url: String,
}

/// Links listed on the about page, configured as a JSON array.
pub struct SocialLinks;

impl Configuration for SocialLinks {
    type Type = Vec<SocialLink>;

    fn default() -> Option<Self::Type> {
        Some(Vec::new())
    }

    fn key() -> &'static str {
        "social-links"
    }
}
