//! Input parsing shared by the HTTP handlers and the client forms.
//!
//! Every function is total: it returns the parsed value or the reason the
//! input was rejected, never panics. Handlers attach the field name with
//! [`Invalid::on`] so the reason ends up in the 400 response.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Characters that are never accepted in names or dates.
pub const FORBIDDEN: [char; 5] = ['\'', '"', ';', '<', '>'];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Invalid {
    #[error("is required")]
    Missing,
    #[error("must be a string")]
    NotText,
    #[error("must not be empty")]
    Empty,
    #[error("must not contain {0:?}")]
    Forbidden(char),
    #[error("is not a number")]
    NotNumeric,
    #[error("is not a whole number")]
    NotInteger,
    #[error("is not a valid date")]
    NotDate,
    #[error("is not a valid link")]
    NotLink,
}

impl Invalid {
    pub fn on(self, field: &'static str) -> ValidationError {
        ValidationError {
            field,
            reason: self,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: Invalid,
}

/// A JSON body field that must be a string.
pub fn text_value(value: &Value) -> Result<&str, Invalid> {
    match value {
        Value::Null => Err(Invalid::Missing),
        Value::String(s) => Ok(s),
        _ => Err(Invalid::NotText),
    }
}

/// Non-empty and free of `'`, `"`, `;`, `<` and `>`.
pub fn name(value: &str) -> Result<&str, Invalid> {
    if value.is_empty() {
        return Err(Invalid::Empty);
    }
    if let Some(c) = value.chars().find(|c| FORBIDDEN.contains(c)) {
        return Err(Invalid::Forbidden(c));
    }
    Ok(value)
}

/// Passes [`name`] and parses as a calendar date, optionally with a time part.
pub fn date(value: &str) -> Result<NaiveDate, Invalid> {
    name(value)?;

    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.date())
        .ok_or(Invalid::NotDate)
}

/// A non-empty string holding a finite number.
pub fn number(value: &str) -> Result<f64, Invalid> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Invalid::Empty);
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(Invalid::NotNumeric),
    }
}

/// A JSON number, or a string accepted by [`number`].
pub fn number_value(value: &Value) -> Result<f64, Invalid> {
    match value {
        Value::Null => Err(Invalid::Missing),
        Value::Number(n) => n.as_f64().ok_or(Invalid::NotNumeric),
        Value::String(s) => number(s),
        _ => Err(Invalid::NotNumeric),
    }
}

/// A row identifier taken from a path segment.
pub fn id(value: &str) -> Result<i64, Invalid> {
    if value.is_empty() {
        return Err(Invalid::Empty);
    }
    match value.parse::<i64>() {
        Ok(n) => Ok(n),
        Err(_) if number(value).is_ok() => Err(Invalid::NotInteger),
        Err(_) => Err(Invalid::NotNumeric),
    }
}

/// An absolute http(s) URL.
pub fn link(value: &str) -> Result<Url, Invalid> {
    if value.is_empty() {
        return Err(Invalid::Empty);
    }
    let url = Url::parse(value).map_err(|_| Invalid::NotLink)?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(Invalid::NotLink),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn name_rejects_metacharacters() {
        assert_eq!(name("O'Brien"), Err(Invalid::Forbidden('\'')));
        assert_eq!(name("<script>"), Err(Invalid::Forbidden('<')));
        assert_eq!(name("a;b"), Err(Invalid::Forbidden(';')));
        assert_eq!(name(""), Err(Invalid::Empty));
        assert_eq!(name("Jul 2024"), Ok("Jul 2024"));
    }

    #[test]
    fn date_requires_a_real_calendar_day() {
        assert_eq!(date("2024-02-30"), Err(Invalid::NotDate));
        assert_eq!(date("tomorrow"), Err(Invalid::NotDate));
        assert_eq!(date("2024-12-24'"), Err(Invalid::Forbidden('\'')));
        assert_eq!(
            date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(date("2024-12-24T18:00:00.000Z").is_ok());
        assert!(date("2024-12-24T18:00").is_ok());
    }

    #[test]
    fn number_accepts_numeric_strings_only() {
        assert_eq!(number("42"), Ok(42.0));
        assert_eq!(number(" 19.95 "), Ok(19.95));
        assert_eq!(number("abc"), Err(Invalid::NotNumeric));
        assert_eq!(number(""), Err(Invalid::Empty));
        assert_eq!(number("   "), Err(Invalid::Empty));
        assert_eq!(number("NaN"), Err(Invalid::NotNumeric));
        assert_eq!(number("inf"), Err(Invalid::NotNumeric));
        assert_eq!(number("Infinity"), Err(Invalid::NotNumeric));
        assert_eq!(number("0x1A"), Err(Invalid::NotNumeric));
        assert_eq!(number("1e3"), Ok(1000.0));
    }

    #[test]
    fn number_value_accepts_json_numbers_and_strings() {
        assert_eq!(number_value(&json!(42)), Ok(42.0));
        assert_eq!(number_value(&json!("42")), Ok(42.0));
        assert_eq!(number_value(&json!(null)), Err(Invalid::Missing));
        assert_eq!(number_value(&json!(true)), Err(Invalid::NotNumeric));
    }

    #[test]
    fn id_must_be_whole() {
        assert_eq!(id("7"), Ok(7));
        assert_eq!(id("7.5"), Err(Invalid::NotInteger));
        assert_eq!(id("seven"), Err(Invalid::NotNumeric));
        assert_eq!(id(""), Err(Invalid::Empty));
    }

    #[test]
    fn link_requires_http_url() {
        assert!(link("https://example.com/item?id=1").is_ok());
        assert_eq!(link("example.com"), Err(Invalid::NotLink));
        assert_eq!(link("javascript:alert(1)"), Err(Invalid::NotLink));
        assert_eq!(link(""), Err(Invalid::Empty));
    }

    #[test]
    fn text_value_distinguishes_missing_and_wrong_type() {
        assert_eq!(text_value(&json!("x")), Ok("x"));
        assert_eq!(text_value(&json!(null)), Err(Invalid::Missing));
        assert_eq!(text_value(&json!(3)), Err(Invalid::NotText));
    }

    #[test]
    fn error_names_the_field() {
        let err = Invalid::Forbidden('"').on("wishlist_name");
        assert_eq!(err.to_string(), "wishlist_name must not contain '\"'");
    }
}
