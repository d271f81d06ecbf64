use std::fmt;

use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use thiserror::Error;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const YEAR_RANGE: RangeInclusive<i32> = 1..=9999;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// All field failures found while validating one payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Error)]
#[error("validation failed: {}", join_fields(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    pub(crate) fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub(crate) fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }

    /// Validates a mandatory text field.
    pub(crate) fn required_text(
        &mut self,
        field: &'static str,
        value: Option<&str>,
        bounds: Option<(usize, usize)>,
    ) -> Option<String> {
        match value {
            None => {
                self.push(field, "is required");
                None
            }
            Some(text) => self.text(field, text, bounds),
        }
    }

    pub(crate) fn text(
        &mut self,
        field: &'static str,
        value: &str,
        bounds: Option<(usize, usize)>,
    ) -> Option<String> {
        if let Some((min, max)) = bounds {
            let len = value.chars().count();
            if len < min || len > max {
                self.push(
                    field,
                    format!("must be between {min} and {max} characters, got {len}"),
                );
                return None;
            }
        }
        Some(value.to_string())
    }

    pub(crate) fn required_date(
        &mut self,
        field: &'static str,
        value: Option<&str>,
    ) -> Option<NaiveDate> {
        match value {
            None => {
                self.push(field, "is required");
                None
            }
            Some(text) => self.date(field, text),
        }
    }

    /// Parses a `YYYY-MM-DD` date. Years are limited to four digits so the
    /// stored text sorts in calendar order.
    pub(crate) fn date(&mut self, field: &'static str, value: &str) -> Option<NaiveDate> {
        match NaiveDate::parse_from_str(value.trim(), DATE_FORMAT) {
            Ok(date) if YEAR_RANGE.contains(&date.year()) => Some(date),
            Ok(date) => {
                self.push(
                    field,
                    format!(
                        "year must be between {} and {}, got {}",
                        YEAR_RANGE.start(),
                        YEAR_RANGE.end(),
                        date.year()
                    ),
                );
                None
            }
            Err(err) => {
                self.push(field, format!("must be a YYYY-MM-DD date ({err})"));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_counts_characters_not_bytes() {
        let mut errors = ValidationErrors::default();
        // five characters, ten bytes
        let value = errors.text("ArticolTitlu", "ăîșțâ", Some((5, 100)));
        assert_eq!(value.as_deref(), Some("ăîșțâ"));
        assert!(errors.is_empty());
    }

    #[test]
    fn text_rejects_out_of_bounds() {
        let mut errors = ValidationErrors::default();
        assert!(errors.text("ArticolTitlu", "abcd", Some((5, 100))).is_none());
        assert!(errors
            .text("ArticolTitlu", &"x".repeat(101), Some((5, 100)))
            .is_none());
        assert_eq!(errors.fields().len(), 2);
        assert!(errors.fields()[0].message.contains("got 4"));
    }

    #[test]
    fn unbounded_text_accepts_anything_present() {
        let mut errors = ValidationErrors::default();
        assert_eq!(errors.text("ListaAutori", "", None).as_deref(), Some(""));
        assert_eq!(errors.text("ListaAutori", "   ", None).as_deref(), Some("   "));
        assert!(errors.is_empty());

        assert!(errors.required_text("ListaAutori", None, None).is_none());
        assert_eq!(errors.fields()[0].message, "is required");
    }

    #[test]
    fn date_rejects_years_outside_four_digits() {
        let mut errors = ValidationErrors::default();
        assert!(errors.date("ArticolData", "+10000-01-01").is_none());
        assert!(errors.date("ArticolData", "-0005-01-01").is_none());
        assert!(errors.date("ArticolData", "0000-01-01").is_none());
        assert_eq!(errors.fields().len(), 3);
        assert!(errors.fields()[0].message.contains("year must be between 1 and 9999"));

        let mut errors = ValidationErrors::default();
        assert_eq!(
            errors.date("ArticolData", "0999-01-01"),
            NaiveDate::from_ymd_opt(999, 1, 1)
        );
        assert_eq!(
            errors.date("ArticolData", "9999-12-31"),
            NaiveDate::from_ymd_opt(9999, 12, 31)
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn date_requires_calendar_date() {
        let mut errors = ValidationErrors::default();
        assert_eq!(
            errors.date("ArticolData", "2024-02-29"),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert!(errors.date("ArticolData", "2023-02-29").is_none());
        assert!(errors.date("ArticolData", "yesterday").is_none());
        assert_eq!(errors.fields().len(), 2);
    }

    #[test]
    fn display_lists_every_field() {
        let mut errors = ValidationErrors::default();
        errors.push("ArticolTitlu", "is required");
        errors.push("ArticolData", "is required");
        assert_eq!(
            errors.to_string(),
            "validation failed: ArticolTitlu: is required; ArticolData: is required"
        );
    }
}
