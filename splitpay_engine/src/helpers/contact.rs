use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$").expect("Invalid regex"));
static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9]{10,15}$").expect("Invalid regex"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email.trim())
}

/// Strips spaces, dashes and brackets from a phone number. Returns `None` if what is left is not 10 to 15 digits with an
/// optional leading `+`.
pub fn normalize_phone(phone: &str) -> Option<String> {
    let compact = phone.chars().filter(|c| !matches!(c, ' ' | '-' | '(' | ')')).collect::<String>();
    PHONE.is_match(&compact).then_some(compact)
}
