use chrono::{DateTime, NaiveDate};
use uuid::Uuid;
use validator::{ValidateEmail, ValidateUrl};

/// String formats that have a zod refinement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormatCheck {
  Email,
  Url,
  Uuid,
  Date,
  DateTime,
}

impl FormatCheck {
  pub(crate) fn from_format(format: &str) -> Option<Self> {
    match format {
      "email" => Some(Self::Email),
      "url" | "uri" => Some(Self::Url),
      "uuid" => Some(Self::Uuid),
      "date" => Some(Self::Date),
      "date-time" => Some(Self::DateTime),
      _ => None,
    }
  }

  pub(crate) const fn refinement(self) -> &'static str {
    match self {
      Self::Email => ".email()",
      Self::Url => ".url()",
      Self::Uuid => ".uuid()",
      Self::Date => ".date()",
      Self::DateTime => ".datetime({ offset: true })",
    }
  }

  /// The `format` a reader of the refinement alone would recover.
  pub(crate) const fn implied_format(self) -> &'static str {
    match self {
      Self::Email => "email",
      Self::Url => "url",
      Self::Uuid => "uuid",
      Self::Date => "date",
      Self::DateTime => "date-time",
    }
  }

  pub(crate) fn accepts(self, value: &str) -> bool {
    match self {
      Self::Email => value.validate_email(),
      Self::Url => value.validate_url(),
      Self::Uuid => Uuid::parse_str(value).is_ok(),
      Self::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok() && value.len() == 10,
      Self::DateTime => DateTime::parse_from_rfc3339(value).is_ok(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_format_checks() {
    let cases = [
      (FormatCheck::Email, "a@b.com", true),
      (FormatCheck::Email, "not-an-email", false),
      (FormatCheck::Url, "https://example.com/path?q=1", true),
      (FormatCheck::Url, "example dot com", false),
      (FormatCheck::Uuid, "67e55044-10b1-426f-9247-bb680e5fe0c8", true),
      (FormatCheck::Uuid, "67e55044", false),
      (FormatCheck::Date, "2024-02-29", true),
      (FormatCheck::Date, "2023-02-29", false),
      (FormatCheck::Date, "2024-2-9", false),
      (FormatCheck::DateTime, "2024-01-01T12:30:00Z", true),
      (FormatCheck::DateTime, "2024-01-01T12:30:00+02:00", true),
      (FormatCheck::DateTime, "2024-01-01", false),
    ];

    for (check, value, expected) in cases {
      assert_eq!(check.accepts(value), expected, "{check:?} on {value:?}");
    }
  }

  #[test]
  fn test_unknown_formats_have_no_check() {
    assert_eq!(FormatCheck::from_format("hostname"), None);
    assert_eq!(FormatCheck::from_format("uri"), Some(FormatCheck::Url));
    assert_eq!(FormatCheck::Url.implied_format(), "url");
  }
}
