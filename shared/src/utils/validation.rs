//! Input validation helpers for verification requests

use once_cell::sync::Lazy;
use regex::Regex;

// Provider service identifiers: "whatsapp", "google_voice", "tiktok-2fa"
static SERVICE_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_\-]{0,63}$").expect("valid service regex"));

// ISO 3166-1 alpha-2 country codes
static COUNTRY_CODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2}$").expect("valid country regex"));

/// Normalize a service name to its canonical lowercase form
pub fn normalize_service_name(service: &str) -> String {
    service.trim().to_lowercase()
}

/// Check a service name after normalization
pub fn is_valid_service_name(service: &str) -> bool {
    SERVICE_NAME_REGEX.is_match(&normalize_service_name(service))
}

/// Normalize a country code to uppercase alpha-2
pub fn normalize_country_code(country: &str) -> String {
    country.trim().to_uppercase()
}

/// Check a country code after normalization
pub fn is_valid_country_code(country: &str) -> bool {
    COUNTRY_CODE_REGEX.is_match(&normalize_country_code(country))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_names() {
        assert!(is_valid_service_name("whatsapp"));
        assert!(is_valid_service_name(" Telegram "));
        assert!(is_valid_service_name("google_voice"));
        assert!(!is_valid_service_name(""));
        assert!(!is_valid_service_name("what's app"));
        assert_eq!(normalize_service_name(" WhatsApp "), "whatsapp");
    }

    #[test]
    fn test_country_codes() {
        assert!(is_valid_country_code("US"));
        assert!(is_valid_country_code("gb"));
        assert!(!is_valid_country_code("USA"));
        assert!(!is_valid_country_code("1"));
        assert_eq!(normalize_country_code(" us"), "US");
    }
}
