//! Phone number utilities

use once_cell::sync::Lazy;
use regex::Regex;

// International phone number regex (E.164 format)
static INTERNATIONAL_PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[1-9]\d{6,14}$").expect("valid phone regex"));

/// Normalize a phone number by removing common formatting characters
pub fn normalize_phone_number(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}

/// Check if a phone number looks like an international number
///
/// Provider numbers are frequently returned without the leading '+'.
pub fn is_valid_international_phone(phone: &str) -> bool {
    INTERNATIONAL_PHONE_REGEX.is_match(&normalize_phone_number(phone))
}

/// Mask a phone number for logs, keeping only the last 4 digits
pub fn mask_phone_number(phone: &str) -> String {
    let normalized = normalize_phone_number(phone);
    if normalized.len() <= 4 {
        return "*".repeat(normalized.len());
    }

    let visible = &normalized[normalized.len() - 4..];
    if let Some(rest) = normalized.strip_prefix('+') {
        format!("+{}{}", "*".repeat(rest.len() - 4), visible)
    } else {
        format!("{}{}", "*".repeat(normalized.len() - 4), visible)
    }
}
