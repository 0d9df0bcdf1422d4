//! Email address helpers

use once_cell::sync::Lazy;
use regex::Regex;

#[allow(clippy::expect_used)]
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Syntactic check only: one `@`, no whitespace, a dot in the domain.
///
/// ```
/// use cadence_domain::utils::email::is_valid_email;
///
/// assert!(is_valid_email("ada@example.com"));
/// assert!(!is_valid_email("ada@localhost"));
/// assert!(!is_valid_email("not an email"));
/// ```
#[must_use]
pub fn is_valid_email(candidate: &str) -> bool {
    EMAIL_RE.is_match(candidate.trim())
}

/// Part of the address before the `@`, or the whole input without one.
#[must_use]
pub fn local_part(email: &str) -> &str {
    let trimmed = email.trim();
    trimmed.split_once('@').map_or(trimmed, |(local, _)| local)
}
