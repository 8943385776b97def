//! Extractors
//!
//! Pure pattern matchers applied to free text sent by the user:
//! Russian mobile numbers, e-mail addresses and a password strength check.
//! Patterns are compiled once using `OnceLock`.

use regex::Regex;
use std::sync::OnceLock;

/// Symbols that satisfy the "special character" rule of the password check.
pub const PASSWORD_SYMBOLS: &str = "!@#$%^*&()";

/// Minimum password length in characters.
const MIN_PASSWORD_LEN: usize = 8;

/// `8XXXXXXXXXX` / `+7XXXXXXXXXX` with optional `-`/space separators and
/// parentheses around the area code.
fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:8|\+7)[\-\s]?\(?\d{3}\)?[\-\s]?\d{3}[\-\s]?\d{2}[\-\s]?\d{2}")
            .expect("phone pattern is a valid regex")
    })
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[a-zA-Z0-9_.+\-]+@[a-zA-Z0-9\-]+\.[a-zA-Z0-9.\-]+")
            .expect("email pattern is a valid regex")
    })
}

/// Find all phone numbers in `text`.
///
/// Matches are non-overlapping, returned in order of first occurrence and
/// exactly as written (separators and parentheses included). Duplicates
/// are kept.
pub fn extract_phones(text: &str) -> Vec<String> {
    phone_pattern()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Find all e-mail addresses in `text`, same ordering rules as [`extract_phones`].
pub fn extract_emails(text: &str) -> Vec<String> {
    email_pattern()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Binary password strength check.
///
/// Strong means at least 8 characters with at least one ASCII lowercase
/// letter, one ASCII uppercase letter, one digit and one of
/// [`PASSWORD_SYMBOLS`]. Any other character, a space included, makes the
/// password weak.
pub fn check_password_strength(text: &str) -> bool {
    if text.chars().count() < MIN_PASSWORD_LEN {
        return false;
    }

    let mut lower = false;
    let mut upper = false;
    let mut digit = false;
    let mut symbol = false;

    for c in text.chars() {
        match c {
            'a'..='z' => lower = true,
            'A'..='Z' => upper = true,
            '0'..='9' => digit = true,
            c if PASSWORD_SYMBOLS.contains(c) => symbol = true,
            _ => return false,
        }
    }

    lower && upper && digit && symbol
}
