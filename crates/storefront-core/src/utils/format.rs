use chrono::{DateTime, NaiveDate};

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format a date of birth for display, e.g. "January 1, 2000".
/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp; anything else is shown as-is.
pub fn format_dob(dob: &str) -> String {
    let date = NaiveDate::parse_from_str(dob, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(dob).ok().map(|dt| dt.date_naive()));

    match date {
        Some(date) => date.format("%B %-d, %Y").to_string(),
        None => dob.to_string(),
    }
}

/// Upper-case the first character, e.g. "female" -> "Female"
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
