//! Small helpers shared by the config, gateway, and CLI layers.

use chrono::{DateTime, Utc};

/// Trim optional text, mapping blank values to `None`.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Whether a value carries an `http://` or `https://` scheme.
pub fn is_http_url(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("http://") || value.starts_with("https://")
}

/// Collapse a response body into a single short line for error messages.
pub fn compact_text(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(180)
        .collect()
}

/// Render a timestamp the way the CLI and logs show it.
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    if value == DateTime::<Utc>::UNIX_EPOCH {
        "never".to_string()
    } else {
        value.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_option_rejects_blank() {
        assert_eq!(normalize_text_option(None), None);
        assert_eq!(normalize_text_option(Some(" \t ".to_string())), None);
        assert_eq!(
            normalize_text_option(Some(" https://api.example.com ".to_string())),
            Some("https://api.example.com".to_string())
        );
    }

    #[test]
    fn is_http_url_requires_scheme() {
        assert!(is_http_url("http://localhost:8080"));
        assert!(is_http_url(" https://api.example.com"));
        assert!(!is_http_url("api.example.com"));
    }

    #[test]
    fn compact_text_flattens_whitespace() {
        assert_eq!(compact_text("  bad\n\n request  "), "bad request");
        assert_eq!(compact_text(&"x".repeat(400)).len(), 180);
    }

    #[test]
    fn format_timestamp_marks_epoch_as_never() {
        assert_eq!(format_timestamp(DateTime::<Utc>::UNIX_EPOCH), "never");
    }
}
