use super::Configuration;

/// The shared secret for the admin panel. Sign-in is disabled while unset.
pub struct AdminPassword;

impl Configuration for AdminPassword {
    type Type = String;

    fn default() -> Option<Self::Type> {
        None
    }

    fn key() -> &'static str {
        "admin-password"
    }
}
