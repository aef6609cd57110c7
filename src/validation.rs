//! Validation System - Field Rules
//!
//! Validators are pure predicates over operator text.
//! Records map failed predicates to structured violations.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z ]+$").unwrap());
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{10}$").unwrap());
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.-]+@[A-Za-z0-9_.-]+\.[A-Za-z]{2,}$").unwrap()
});
static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{2})/([0-9]{2})/([0-9]{4})$").unwrap());
static TEXT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9 ]+$").unwrap());

/// Letters and spaces only, at least one character.
pub fn is_valid_name(value: &str) -> bool {
    NAME_RE.is_match(value)
}

/// Exactly ten decimal digits.
pub fn is_valid_phone(value: &str) -> bool {
    PHONE_RE.is_match(value)
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// `dd/mm/yyyy` naming a real Gregorian date.
pub fn is_valid_date(value: &str) -> bool {
    let Some(caps) = DATE_RE.captures(value) else {
        return false;
    };
    let (Ok(day), Ok(month), Ok(year)) = (
        caps[1].parse::<u32>(),
        caps[2].parse::<u32>(),
        caps[3].parse::<i32>(),
    ) else {
        return false;
    };
    NaiveDate::from_ymd_opt(year, month, day).is_some()
}

/// Alphanumeric and spaces only, at least one character.
pub fn is_valid_text(value: &str) -> bool {
    TEXT_RE.is_match(value)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldRule {
    Name,
    Phone,
    Email,
    Date,
    Text,
}

impl FieldRule {
    pub fn check(self, value: &str) -> bool {
        match self {
            FieldRule::Name => is_valid_name(value),
            FieldRule::Phone => is_valid_phone(value),
            FieldRule::Email => is_valid_email(value),
            FieldRule::Date => is_valid_date(value),
            FieldRule::Text => is_valid_text(value),
        }
    }

    /// Short description shown when a value is rejected.
    pub fn hint(self) -> &'static str {
        match self {
            FieldRule::Name => "letters and spaces only",
            FieldRule::Phone => "exactly 10 digits",
            FieldRule::Email => "a valid email address",
            FieldRule::Date => "a real date as dd/mm/yyyy",
            FieldRule::Text => "letters, digits and spaces only",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub rule: FieldRule,
    pub value: Option<String>,
    pub message: String,
}

impl FieldViolation {
    pub fn rejected(field: &str, rule: FieldRule, value: &str) -> Self {
        Self {
            field: field.to_string(),
            rule,
            value: Some(value.to_string()),
            message: format!("expected {}", rule.hint()),
        }
    }

    pub fn missing(field: &str, rule: FieldRule) -> Self {
        Self {
            field: field.to_string(),
            rule,
            value: None,
            message: "field is required".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_date_leap_years() {
        assert!(is_valid_date("29/02/2000"));
        assert!(is_valid_date("29/02/2024"));
        assert!(!is_valid_date("29/02/1900"));
        assert!(!is_valid_date("29/02/2023"));
    }

    #[test]
    fn test_date_month_lengths() {
        assert!(!is_valid_date("31/04/2021"));
        assert!(is_valid_date("30/04/2021"));
        assert!(is_valid_date("31/12/2021"));
        assert!(!is_valid_date("15/13/2021"));
        assert!(!is_valid_date("00/01/2021"));
        assert!(!is_valid_date("15/00/2021"));
    }

    #[test]
    fn test_date_shape() {
        assert!(!is_valid_date("1/1/2021"));
        assert!(!is_valid_date("01-01-2021"));
        assert!(!is_valid_date("01/01/21"));
        assert!(!is_valid_date(" 01/01/2021"));
        assert!(!is_valid_date(""));
    }

    #[test]
    fn test_email() {
        assert!(is_valid_email("a.b-c@sub.domain.com"));
        assert!(is_valid_email("user_1@mail.io"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("user@domain.c"));
        assert!(!is_valid_email("user@domain.c0m"));
        assert!(!is_valid_email("us er@domain.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_text_and_name() {
        assert!(is_valid_text("BSc CS 2"));
        assert!(!is_valid_text("BSc-CS"));
        assert!(is_valid_name("Ada Lovelace"));
        assert!(!is_valid_name("Ada L0velace"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_text(""));
    }

    #[test]
    fn test_empty_fails_every_rule() {
        for rule in [
            FieldRule::Name,
            FieldRule::Phone,
            FieldRule::Email,
            FieldRule::Date,
            FieldRule::Text,
        ] {
            assert!(!rule.check(""), "{:?} accepted empty input", rule);
        }
    }

    proptest! {
        #[test]
        fn prop_name_matches_definition(s in "\\PC{0,20}") {
            let expected = !s.is_empty()
                && s.chars().all(|c| c.is_ascii_alphabetic() || c == ' ');
            prop_assert_eq!(is_valid_name(&s), expected);
        }

        #[test]
        fn prop_name_accepts_letter_strings(s in "[A-Za-z ]{1,30}") {
            prop_assert!(is_valid_name(&s));
        }

        #[test]
        fn prop_phone_matches_definition(s in "[0-9a-z]{0,12}") {
            let expected = s.len() == 10 && s.chars().all(|c| c.is_ascii_digit());
            prop_assert_eq!(is_valid_phone(&s), expected);
        }

        #[test]
        fn prop_phone_never_accepts_other_lengths(s in "[0-9]{0,20}") {
            prop_assert_eq!(is_valid_phone(&s), s.len() == 10);
        }
    }
}
