//! Inbound parameter validation
//!
//! Handlers collect every problem before answering, so one 400 names all offending
//! fields. Query parameters arrive as strings and are parsed here rather than by the
//! extractor, which would stop at the first bad field.

use std::fmt::Display;
use std::str::FromStr;

use axum::extract::Query;
use axum::extract::rejection::QueryRejection;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::error::{ApiError, ApiErrorCode};

/// One violated field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct Validator {
    issues: Vec<Issue>,
}

/// Trimmed value, `None` when absent or blank
fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

impl Validator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue<F: Into<String>, M: Into<String>>(&mut self, field: F, message: M) {
        self.issues.push(Issue {
            field: field.into(),
            message: message.into(),
        });
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Required text of at least `min_chars` characters
    pub fn text<'a>(&mut self, field: &str, raw: Option<&'a str>, min_chars: usize) -> Option<&'a str> {
        let Some(value) = present(raw) else {
            self.issue(field, "is required");
            return None;
        };
        self.min_chars(field, value, min_chars)
    }

    /// Optional text; when given it must have at least `min_chars` characters
    pub fn optional_text<'a>(
        &mut self,
        field: &str,
        raw: Option<&'a str>,
        min_chars: usize,
    ) -> Option<&'a str> {
        self.min_chars(field, present(raw)?, min_chars)
    }

    /// Required text of exactly `len` characters
    pub fn exact<'a>(&mut self, field: &str, raw: Option<&'a str>, len: usize) -> Option<&'a str> {
        let Some(value) = present(raw) else {
            self.issue(field, "is required");
            return None;
        };
        self.exact_chars(field, value, len)
    }

    pub fn optional_exact<'a>(&mut self, field: &str, raw: Option<&'a str>, len: usize) -> Option<&'a str> {
        self.exact_chars(field, present(raw)?, len)
    }

    /// Required number within `min..=max`
    pub fn number<T>(&mut self, field: &str, raw: Option<&str>, min: T, max: T) -> Option<T>
    where
        T: FromStr + PartialOrd + Display + Copy,
    {
        let Some(value) = present(raw) else {
            self.issue(field, "is required");
            return None;
        };
        self.in_range(field, value, min, max)
    }

    pub fn optional_number<T>(&mut self, field: &str, raw: Option<&str>, min: T, max: T) -> Option<T>
    where
        T: FromStr + PartialOrd + Display + Copy,
    {
        self.in_range(field, present(raw)?, min, max)
    }

    /// Required ISO calendar date (`YYYY-MM-DD`)
    pub fn date(&mut self, field: &str, raw: Option<&str>) -> Option<NaiveDate> {
        let Some(value) = present(raw) else {
            self.issue(field, "is required");
            return None;
        };
        match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                self.issue(field, "must be an ISO date (YYYY-MM-DD)");
                None
            }
        }
    }

    /// Record a rejected query string (e.g. broken percent-encoding)
    pub fn rejected_query(&mut self, rejection: &QueryRejection) {
        self.issue("query", rejection.body_text());
    }

    /// The 400 answer listing every issue
    #[must_use]
    pub fn into_error(self, request_id: &str) -> ApiError {
        let fields: Vec<&str> = self.issues.iter().map(|i| i.field.as_str()).collect();
        debug!(request_id, ?fields, "Rejecting invalid request");

        let message = format!("Invalid request parameters: {}", fields.join(", "));
        ApiError::new(ApiErrorCode::InvalidRequest, message, request_id)
            .with_details(json!({ "issues": self.issues }))
    }

    fn min_chars<'a>(&mut self, field: &str, value: &'a str, min_chars: usize) -> Option<&'a str> {
        if value.chars().count() < min_chars {
            self.issue(field, format!("must be at least {min_chars} characters"));
            return None;
        }
        Some(value)
    }

    fn exact_chars<'a>(&mut self, field: &str, value: &'a str, len: usize) -> Option<&'a str> {
        if value.chars().count() != len {
            self.issue(field, format!("must be exactly {len} characters"));
            return None;
        }
        Some(value)
    }

    fn in_range<T>(&mut self, field: &str, value: &str, min: T, max: T) -> Option<T>
    where
        T: FromStr + PartialOrd + Display + Copy,
    {
        match value.parse::<T>() {
            Ok(n) if (min..=max).contains(&n) => Some(n),
            Ok(_) => {
                self.issue(field, format!("must be between {min} and {max}"));
                None
            }
            Err(_) => {
                self.issue(field, "must be a number");
                None
            }
        }
    }
}

/// Unwrap a query extraction, turning a rejection into a 400
pub fn query_or_reject<T>(
    query: Result<Query<T>, QueryRejection>,
    request_id: &str,
) -> Result<T, ApiError> {
    match query {
        Ok(Query(query)) => Ok(query),
        Err(rejection) => {
            let mut check = Validator::new();
            check.rejected_query(&rejection);
            Err(check.into_error(request_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_text_rules() {
        let mut check = Validator::new();
        assert_eq!(check.text("pickup", Some("  Miami "), 3), Some("Miami"));
        assert_eq!(check.text("origin", Some("AB"), 3), None);
        assert_eq!(check.text("keyword", Some("   "), 1), None);
        assert_eq!(check.optional_text("dropoff", None, 3), None);
        assert_eq!(check.optional_text("dropoff", Some(""), 3), None);

        let fields: Vec<_> = check.issues().iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["origin", "keyword"]);
        assert_eq!(check.issues()[1].message, "is required");
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let mut check = Validator::new();
        assert_eq!(check.text("keyword", Some("Zü"), 2), Some("Zü"));
        assert_eq!(check.exact("cityCode", Some("PAR"), 3), Some("PAR"));
        assert_eq!(check.optional_exact("countryCode", Some("FRA"), 2), None);
        assert_eq!(check.issues().len(), 1);
    }

    #[rstest]
    #[case(Some("45.5"), Some(45.5))]
    #[case(Some("-90"), Some(-90.0))]
    #[case(Some("90.0001"), None)]
    #[case(Some("north"), None)]
    #[case(Some("NaN"), None)]
    #[case(None, None)]
    fn test_latitude_range(#[case] raw: Option<&str>, #[case] expected: Option<f64>) {
        let mut check = Validator::new();
        assert_eq!(check.number("lat", raw, -90.0, 90.0), expected);
        assert_eq!(check.is_clean(), expected.is_some());
    }

    #[test]
    fn test_optional_number_absent_is_clean() {
        let mut check = Validator::new();
        assert_eq!(check.optional_number::<u32>("age", None, 18, 99), None);
        assert_eq!(check.optional_number::<u32>("age", Some("17"), 18, 99), None);
        assert_eq!(check.issues()[0].message, "must be between 18 and 99");
    }

    #[test]
    fn test_date_parsing() {
        let mut check = Validator::new();
        assert_eq!(
            check.date("startDate", Some("2026-11-01")),
            NaiveDate::from_ymd_opt(2026, 11, 1)
        );
        assert_eq!(check.date("endDate", Some("01/11/2026")), None);
        assert_eq!(check.issues()[0].field, "endDate");
    }

    #[test]
    fn test_into_error_lists_issues() {
        let mut check = Validator::new();
        check.issue("dateTime", "is required");
        check.issue("passengers", "must be between 1 and 9");

        let err = check.into_error("req-1");
        assert_eq!(err.code, ApiErrorCode::InvalidRequest);
        assert_eq!(err.status, 400);
        assert_eq!(err.message, "Invalid request parameters: dateTime, passengers");
        assert_eq!(
            err.details,
            Some(json!({"issues": [
                {"field": "dateTime", "message": "is required"},
                {"field": "passengers", "message": "must be between 1 and 9"}
            ]}))
        );
    }
}
