//! PII guard applied to every incoming chat message before any processing.

use once_cell::sync::Lazy;
use regex::Regex;

/// Fixed refusal returned when a message contains PII.
pub const PII_REFUSAL: &str = "I cannot process messages that include personally identifiable \
                               information (PII). Please remove such details and try again.";

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+").unwrap());
static SSN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap());
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\+?\d[\d\-\s]{7,}\b").unwrap());
static LONG_DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{9,}\b").unwrap());

/// True when the text matches an email, SSN, phone-like, or long-digit
/// pattern.
pub fn contains_pii(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    EMAIL_RE.is_match(text)
        || SSN_RE.is_match(text)
        || PHONE_RE.is_match(text)
        || LONG_DIGITS_RE.is_match(text)
}
