//! Form state management and field validation.
//!
//! A [`FormState`] exclusively owns the staged [`Record`] of one screen and the
//! validation errors for it. Validation runs a fixed, ordered rule list per
//! field and accumulates every failing field.

use crate::record::{FieldValue, Record};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

/// Message recorded for a missing required field.
pub const REQUIRED_MESSAGE: &str = "required";

/// A single per-field predicate.
///
/// Only [`Rule::Required`] looks at absent or blank values; every other rule
/// passes when there is nothing to check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "arg", rename_all = "snake_case")]
pub enum Rule {
    Required,
    /// Any finite number `f64` accepts, exponent forms such as `1e5` included.
    Numeric,
    /// Exactly `n` ASCII digits, e.g. a 10-digit phone number.
    ExactDigits(usize),
    /// One of an enumerated set, compared exactly.
    OneOf(Vec<String>),
    Email,
    MinLength(usize),
    MaxLength(usize),
}

impl Rule {
    /// Returns the failure message, or `None` when the value passes.
    pub fn check(&self, value: Option<&FieldValue>) -> Option<String> {
        if let Rule::Required = self {
            return match value {
                Some(value) if !value.is_blank() => None,
                _ => Some(REQUIRED_MESSAGE.to_string()),
            };
        }

        let value = value.filter(|value| !value.is_blank())?;
        let text = value.to_string();
        let text = text.trim();

        match self {
            Rule::Required => None,
            Rule::Numeric => match value {
                FieldValue::Number(_) => None,
                _ if text.parse::<f64>().map(f64::is_finite).unwrap_or(false) => None,
                _ => Some("must be a number".to_string()),
            },
            Rule::ExactDigits(n) => {
                if text.len() == *n && text.bytes().all(|b| b.is_ascii_digit()) {
                    None
                } else {
                    Some(format!("must be a {}-digit number", n))
                }
            }
            Rule::OneOf(options) => {
                if options.iter().any(|option| option == text) {
                    None
                } else {
                    Some(format!("must be one of: {}", options.join(", ")))
                }
            }
            Rule::Email => {
                if EMAIL_PATTERN.is_match(text) {
                    None
                } else {
                    Some("must be a valid email address".to_string())
                }
            }
            Rule::MinLength(min) => {
                if text.chars().count() >= *min {
                    None
                } else {
                    Some(format!("must be at least {} characters", min))
                }
            }
            Rule::MaxLength(max) => {
                if text.chars().count() <= *max {
                    None
                } else {
                    Some(format!("must be at most {} characters", max))
                }
            }
        }
    }
}

/// Field name to human-readable message, in rule declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(IndexMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<String> {
        self.0.shift_remove(field)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(field, message)| (field.as_str(), message.as_str()))
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for ValidationErrors
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut errors = ValidationErrors::new();
        for (field, message) in iter {
            errors.insert(field, message);
        }
        errors
    }
}

/// The fixed, ordered list of rules for every field of one form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormSchema {
    fields: Vec<(String, Vec<Rule>)>,
}

impl FormSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a field and its rules. Rules for a field run in the given order
    /// and the first failure is the field's message.
    pub fn field(mut self, name: impl Into<String>, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.fields.push((name.into(), rules.into_iter().collect()));
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn rules_for(&self, name: &str) -> Option<&[Rule]> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, rules)| rules.as_slice())
    }

    /// Checks a single field of a record.
    pub fn check_field(&self, record: &Record, name: &str) -> Option<String> {
        let rules = self.rules_for(name)?;
        let value = record.get(name);
        rules.iter().find_map(|rule| rule.check(value))
    }

    /// Checks every declared field, accumulating all failures.
    pub fn validate(&self, record: &Record) -> ValidationErrors {
        self.fields
            .iter()
            .filter_map(|(name, rules)| {
                let value = record.get(name);
                rules
                    .iter()
                    .find_map(|rule| rule.check(value))
                    .map(|message| (name.clone(), message))
            })
            .collect()
    }
}

/// In-progress form data for one screen plus its current validation errors.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    schema: FormSchema,
    staged: Record,
    errors: ValidationErrors,
}

impl FormState {
    pub fn new(schema: FormSchema) -> Self {
        Self {
            schema,
            staged: Record::new(),
            errors: ValidationErrors::new(),
        }
    }

    /// Overwrites a field of the staged record.
    ///
    /// If the field currently carries an error, it is re-checked: a corrected
    /// value clears the error, a still-invalid one refreshes the message.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        self.staged.set(name.clone(), value);

        if self.errors.contains(&name) {
            match self.schema.check_field(&self.staged, &name) {
                Some(message) => self.errors.insert(name, message),
                None => {
                    self.errors.remove(&name);
                }
            }
        }
    }

    /// Runs every rule and records the result as the current error set.
    pub fn validate(&mut self) -> ValidationErrors {
        self.errors = self.schema.validate(&self.staged);
        self.errors.clone()
    }

    /// Replaces the staged record and clears all errors.
    pub fn reset(&mut self, initial: Record) {
        self.staged = initial;
        self.errors.clear();
    }

    /// Validates and, when clean, returns a copy of the staged record ready to send.
    pub fn submission(&mut self) -> Result<Record, ValidationErrors> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self.staged.clone())
        } else {
            Err(errors)
        }
    }

    pub fn staged(&self) -> &Record {
        &self.staged
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }
}
