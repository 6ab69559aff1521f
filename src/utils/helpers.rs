//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use regex::Regex;
use std::sync::OnceLock;

/// Default page size for listings
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Upper bound for a requested page size
pub const MAX_PAGE_SIZE: i64 = 100;

/// Format an amount in minor units, e.g. `2550, "EUR"` -> `25.50 EUR`
pub fn format_money(amount_cents: i64, currency: &str) -> String {
    let sign = if amount_cents < 0 { "-" } else { "" };
    let abs = amount_cents.unsigned_abs();
    format!("{}{}.{:02} {}", sign, abs / 100, abs % 100, currency)
}

/// Truncate text to a maximum length with ellipsis
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_length.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Normalize an email address for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate ISO 4217 style currency code (three uppercase letters)
pub fn is_valid_currency(currency: &str) -> bool {
    currency.len() == 3 && currency.chars().all(|c| c.is_ascii_uppercase())
}

/// Validate card expiry in `MM/YY` form
pub fn is_valid_card_expiry(expiry: &str) -> bool {
    static EXPIRY: OnceLock<Option<Regex>> = OnceLock::new();
    EXPIRY
        .get_or_init(|| Regex::new(r"^(0[1-9]|1[0-2])/[0-9]{2}$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(expiry))
}

/// Strip spaces and dashes from a card number and check it is 12-19 digits
pub fn is_valid_card_number(number: &str) -> bool {
    let digits: String = number.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();
    (12..=19).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

/// Normalize pagination parameters into `(limit, offset)`
pub fn page_to_limit_offset(page: Option<i64>, per_page: Option<i64>) -> (i64, i64) {
    let per_page = per_page.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let page = page.unwrap_or(1).max(1);
    (per_page, (page - 1) * per_page)
}

/// Generate a random alphanumeric string
pub fn generate_random_string(length: usize) -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                            abcdefghijklmnopqrstuvwxyz\
                            0123456789";
    let mut rng = rand::thread_rng();

    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(2550, "EUR"), "25.50 EUR");
        assert_eq!(format_money(0, "USD"), "0.00 USD");
        assert_eq!(format_money(-5, "USD"), "-0.05 USD");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 8), "hello...");
    }

    #[test]
    fn test_currency_validation() {
        assert!(is_valid_currency("EUR"));
        assert!(!is_valid_currency("eur"));
        assert!(!is_valid_currency("EURO"));
    }

    #[test]
    fn test_card_checks() {
        assert!(is_valid_card_number("4242 4242 4242 4242"));
        assert!(!is_valid_card_number("4242"));
        assert!(!is_valid_card_number("4242-4242-4242-424x"));
        assert!(is_valid_card_expiry("09/27"));
        assert!(!is_valid_card_expiry("13/27"));
        assert!(!is_valid_card_expiry("9/27"));
    }

    #[test]
    fn test_pagination() {
        assert_eq!(page_to_limit_offset(None, None), (20, 0));
        assert_eq!(page_to_limit_offset(Some(3), Some(10)), (10, 20));
        assert_eq!(page_to_limit_offset(Some(0), Some(1000)), (100, 0));
    }

    #[test]
    fn test_random_string() {
        let token = generate_random_string(48);
        assert_eq!(token.len(), 48);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, generate_random_string(48));
    }
}
