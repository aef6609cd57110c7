//! Card Schemas - Enforceable Contracts
//!
//! Each card kind declares its fields, their rules, canvas size and captions.
//! A `PersonRecord` only exists once every declared field has passed its rule.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::session::Operator;
use crate::validation::{FieldRule, FieldViolation};

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Invalid record: {}", summarize(.0))]
    Invalid(Vec<FieldViolation>),

    #[error("Unknown field for {kind}: {field}")]
    UnknownField { kind: CardKind, field: String },

    #[error("Input error: {0}")]
    Input(#[from] io::Error),
}

fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Student,
    Business,
    Library,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub prompt: &'static str,
    pub rule: FieldRule,
}

const fn field(
    key: &'static str,
    label: &'static str,
    prompt: &'static str,
    rule: FieldRule,
) -> FieldSpec {
    FieldSpec { key, label, prompt, rule }
}

const STUDENT_FIELDS: &[FieldSpec] = &[
    field("name", "Name", "Enter Name", FieldRule::Name),
    field("roll", "Roll", "Enter Roll Number", FieldRule::Text),
    field("program", "Program", "Enter Program", FieldRule::Text),
    field("faculty", "Faculty", "Enter Faculty", FieldRule::Text),
    field("guardian", "Guardian", "Enter Guardian Name", FieldRule::Name),
    field("phone", "Phone", "Enter Phone Number", FieldRule::Phone),
    field("email", "Email", "Enter Email", FieldRule::Email),
    field("validDate", "Valid", "Enter Valid Date (dd/mm/yyyy)", FieldRule::Date),
    field("expiryDate", "Expiry", "Enter Expiry Date (dd/mm/yyyy)", FieldRule::Date),
];

const BUSINESS_FIELDS: &[FieldSpec] = &[
    field("name", "Name", "Enter Name", FieldRule::Name),
    field("position", "Position", "Enter Position", FieldRule::Text),
    field("company", "Company", "Enter Company", FieldRule::Text),
    field("email", "Email", "Enter Email", FieldRule::Email),
    field("phone", "Phone", "Enter Phone", FieldRule::Phone),
    field("address", "Address", "Enter Address", FieldRule::Text),
];

const LIBRARY_FIELDS: &[FieldSpec] = &[
    field("name", "Name", "Enter Name", FieldRule::Name),
    field("memberID", "Member ID", "Enter Member ID", FieldRule::Text),
    field("contact", "Contact", "Enter Contact", FieldRule::Phone),
    field("email", "Email", "Enter Email", FieldRule::Email),
];

impl CardKind {
    pub const ALL: [CardKind; 3] = [CardKind::Student, CardKind::Business, CardKind::Library];

    /// Fields in the order they are collected and drawn. `name` is always first.
    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            CardKind::Student => STUDENT_FIELDS,
            CardKind::Business => BUSINESS_FIELDS,
            CardKind::Library => LIBRARY_FIELDS,
        }
    }

    /// Canvas size as `(width, height)`.
    pub fn canvas_size(self) -> (u32, u32) {
        match self {
            CardKind::Student => (380, 550),
            CardKind::Business | CardKind::Library => (350, 500),
        }
    }

    pub fn caption(self) -> &'static str {
        match self {
            CardKind::Student => "Student ID Card",
            CardKind::Business => "Business ID Card",
            CardKind::Library => "Library ID Card",
        }
    }

    /// Directory under the storage root holding this kind's person folders.
    pub fn root_dir(self) -> &'static str {
        match self {
            CardKind::Student => "StudentIDCard",
            CardKind::Business => "BusinessIDCard",
            CardKind::Library => "LibraryIDCard",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CardKind::Student => "student",
            CardKind::Business => "business",
            CardKind::Library => "library",
        }
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "student" => Ok(CardKind::Student),
            "business" => Ok(CardKind::Business),
            "library" => Ok(CardKind::Library),
            other => Err(format!("unknown card kind: {}", other)),
        }
    }
}

/// Validated field values for one person, aligned with `kind.fields()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonRecord {
    kind: CardKind,
    values: Vec<String>,
}

impl PersonRecord {
    /// Build a record from a field map, reporting every violation at once.
    pub fn from_values(
        kind: CardKind,
        values: &HashMap<String, String>,
    ) -> Result<Self, RecordError> {
        if let Some(unknown) = values
            .keys()
            .find(|k| !kind.fields().iter().any(|f| f.key == k.as_str()))
        {
            return Err(RecordError::UnknownField {
                kind,
                field: unknown.clone(),
            });
        }

        let mut violations = vec![];
        let mut ordered = Vec::with_capacity(kind.fields().len());
        for spec in kind.fields() {
            match values.get(spec.key) {
                Some(value) if spec.rule.check(value) => ordered.push(value.clone()),
                Some(value) => violations.push(FieldViolation::rejected(spec.key, spec.rule, value)),
                None => violations.push(FieldViolation::missing(spec.key, spec.rule)),
            }
        }

        if violations.is_empty() {
            Ok(Self { kind, values: ordered })
        } else {
            Err(RecordError::Invalid(violations))
        }
    }

    pub fn kind(&self) -> CardKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.values[0]
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.kind
            .fields()
            .iter()
            .position(|f| f.key == key)
            .map(|i| self.values[i].as_str())
    }

    /// `(spec, value)` pairs in declared order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static FieldSpec, &str)> + '_ {
        self.kind
            .fields()
            .iter()
            .zip(self.values.iter().map(String::as_str))
    }

    /// `"<Label>: <value>"` for each field, in drawing order.
    pub fn card_lines(&self) -> Vec<String> {
        self.entries()
            .map(|(spec, value)| format!("{}: {}", spec.label, value))
            .collect()
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.entries()
            .map(|(spec, value)| (spec.key.to_string(), value.to_string()))
            .collect()
    }
}

/// Ask for every field of `kind` in order, re-asking until each value passes.
pub fn collect_details(
    kind: CardKind,
    operator: &mut dyn Operator,
) -> Result<PersonRecord, RecordError> {
    let mut values = Vec::with_capacity(kind.fields().len());
    for spec in kind.fields() {
        loop {
            let answer = operator.ask(spec.prompt)?;
            if spec.rule.check(&answer) {
                values.push(answer);
                break;
            }
            debug!(field = spec.key, "rejected input");
            operator.warn(&format!("Invalid {}: expected {}", spec.label, spec.rule.hint()));
        }
    }
    Ok(PersonRecord { kind, values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ScriptedOperator;

    fn student_values() -> HashMap<String, String> {
        [
            ("name", "Ada Lovelace"),
            ("roll", "42"),
            ("program", "BSc CS"),
            ("faculty", "Science"),
            ("guardian", "Byron"),
            ("phone", "9800000000"),
            ("email", "ada@uni.edu"),
            ("validDate", "01/01/2024"),
            ("expiryDate", "31/12/2027"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_schemas_start_with_name() {
        for kind in CardKind::ALL {
            assert_eq!(kind.fields()[0].key, "name");
            assert_eq!(kind.fields()[0].rule, FieldRule::Name);
        }
    }

    #[test]
    fn test_from_values_orders_fields() {
        let record = PersonRecord::from_values(CardKind::Student, &student_values()).unwrap();
        assert_eq!(record.name(), "Ada Lovelace");
        assert_eq!(record.card_lines()[1], "Roll: 42");
        assert_eq!(record.card_lines()[8], "Expiry: 31/12/2027");
        assert_eq!(record.get("guardian"), Some("Byron"));
    }

    #[test]
    fn test_from_values_reports_all_violations() {
        let mut values = student_values();
        values.insert("phone".into(), "123".into());
        values.remove("email");

        match PersonRecord::from_values(CardKind::Student, &values) {
            Err(RecordError::Invalid(violations)) => {
                let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
                assert_eq!(fields, vec!["phone", "email"]);
                assert!(violations[1].value.is_none());
            }
            other => panic!("expected violations, got {:?}", other),
        }
    }

    #[test]
    fn test_from_values_rejects_unknown_field() {
        let mut values = student_values();
        values.insert("company".into(), "Acme".into());
        let err = PersonRecord::from_values(CardKind::Student, &values).unwrap_err();
        assert!(matches!(err, RecordError::UnknownField { .. }));
    }

    #[test]
    fn test_collect_details_reprompts_until_valid() {
        let mut operator = ScriptedOperator::new([
            "J0hn", "John Smith", "L-12", "L12", "12345", "9812345678", "bad@", "john@lib.org",
        ]);
        let record = collect_details(CardKind::Library, &mut operator).unwrap();

        assert_eq!(record.name(), "John Smith");
        assert_eq!(record.get("memberID"), Some("L12"));
        assert_eq!(record.get("contact"), Some("9812345678"));
        assert_eq!(record.get("email"), Some("john@lib.org"));
        assert_eq!(operator.warnings().len(), 4);
        assert_eq!(operator.prompts()[0], "Enter Name");
        assert_eq!(operator.prompts()[1], "Enter Name");
    }

    #[test]
    fn test_collect_details_fails_on_exhausted_input() {
        let mut operator = ScriptedOperator::new(["Jane Doe", "Manager"]);
        let err = collect_details(CardKind::Business, &mut operator).unwrap_err();
        assert!(matches!(err, RecordError::Input(_)));
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("Library".parse::<CardKind>().unwrap(), CardKind::Library);
        assert!("badge".parse::<CardKind>().is_err());
    }
}
