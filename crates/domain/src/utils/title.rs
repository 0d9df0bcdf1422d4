//! Pure string helpers for building calendar event titles

use crate::constants::{GENERIC_OWNER_LABEL, GENERIC_TYPE_LABEL};

/// Turn a stored appointment type into a human-readable label.
///
/// Underscores, hyphens and runs of whitespace become single spaces and each
/// word is capitalised. Blank input yields [`GENERIC_TYPE_LABEL`].
///
/// # Examples
///
/// ```
/// use cadence_domain::utils::title::normalize_type_label;
///
/// assert_eq!(normalize_type_label("coaching_session"), "Coaching Session");
/// assert_eq!(normalize_type_label("  follow-up  call "), "Follow Up Call");
/// assert_eq!(normalize_type_label(""), "Appointment");
/// ```
#[must_use]
pub fn normalize_type_label(appointment_type: &str) -> String {
    let words: Vec<String> = appointment_type
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect();

    if words.is_empty() {
        GENERIC_TYPE_LABEL.to_string()
    } else {
        words.join(" ")
    }
}

/// Combine a type label with the owner display name.
///
/// # Arguments
///
/// * `label` - Normalized type label
/// * `owner_name` - Resolved owner display name; `None` or blank falls back to
///   [`GENERIC_OWNER_LABEL`]
///
/// # Examples
///
/// ```
/// use cadence_domain::utils::title::compose_event_title;
///
/// assert_eq!(compose_event_title("Check In", Some("Acme Corp")), "Check In - Acme Corp");
/// assert_eq!(compose_event_title("Check In", None), "Check In - Client");
/// ```
#[must_use]
pub fn compose_event_title(label: &str, owner_name: Option<&str>) -> String {
    let owner = owner_name.map(str::trim).filter(|name| !name.is_empty());
    format!("{label} - {}", owner.unwrap_or(GENERIC_OWNER_LABEL))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
