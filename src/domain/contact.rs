//! Customer contact snapshot.
//!
//! Captured at order time and stored on the order itself, independent of any
//! user account record. Phone numbers arrive in whatever shape the storefront
//! or WhatsApp hands us, so matching always goes through [`normalize_phone`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9]{10,15}$").unwrap());

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct GuestInfo {
    #[validate(length(min = 1, message = "customer name is required"))]
    pub name: String,
    #[validate(regex(path = "PHONE_RE", message = "invalid phone number"))]
    pub phone: String,
    #[validate(email)]
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
}

/// Strips everything but digits so `+233 20 123 4567`, `0201234567` and a
/// WhatsApp `wa_id` can be compared against each other.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_formatting() {
        assert_eq!(normalize_phone("+233 20-123 4567"), "233201234567");
        assert_eq!(normalize_phone("0201234567"), "0201234567");
    }

    #[test]
    fn phone_pattern_accepts_international_format() {
        assert!(PHONE_RE.is_match("+233201234567"));
        assert!(PHONE_RE.is_match("0201234567"));
        assert!(!PHONE_RE.is_match("not-a-phone"));
        assert!(!PHONE_RE.is_match("123"));
    }

    #[test]
    fn guest_info_requires_name_and_phone() {
        let guest = GuestInfo {
            name: String::new(),
            phone: "abc".to_string(),
            email: Some("not-an-email".to_string()),
            address: None,
            city: None,
            region: None,
        };
        let errors = guest.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
        assert!(errors.field_errors().contains_key("phone"));
        assert!(errors.field_errors().contains_key("email"));
    }
}
