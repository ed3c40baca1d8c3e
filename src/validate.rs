//! Payload validation for entity records.
//!
//! Validators are pure functions over the raw field map — no I/O — returning
//! a list of [`FieldError`]s (empty means valid). The dispatcher turns a
//! non-empty list into a 400 response.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::store::{Fields, Role};

/// Matches the common `local@domain.tld` shape; intentionally loose.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Name of the offending field
    pub field: String,
    /// What was wrong with it
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

fn non_empty_string(value: &Value) -> bool {
    value.as_str().is_some_and(|s| !s.trim().is_empty())
}

fn positive_number(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_f64().is_some_and(|f| f > 0.0),
        // Form-encoded clients submit numbers as strings; accept those too
        Value::String(s) => s.trim().parse::<f64>().is_ok_and(|f| f > 0.0),
        _ => false,
    }
}

fn number_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn require_str(fields: &Fields, key: &str, errors: &mut Vec<FieldError>) {
    if !fields.get(key).is_some_and(non_empty_string) {
        errors.push(FieldError::new(key, "required non-empty string"));
    }
}

fn require_positive(fields: &Fields, key: &str, errors: &mut Vec<FieldError>) {
    if !fields.get(key).is_some_and(positive_number) {
        errors.push(FieldError::new(key, "required positive number"));
    }
}

fn optional_positive(fields: &Fields, key: &str, errors: &mut Vec<FieldError>) {
    if let Some(value) = fields.get(key) {
        if !value.is_null() && !positive_number(value) {
            errors.push(FieldError::new(key, "must be a positive number when present"));
        }
    }
}

fn require_score(fields: &Fields, key: &str, min: f64, max: f64, errors: &mut Vec<FieldError>) {
    match fields.get(key).and_then(number_value) {
        Some(score) if (min..=max).contains(&score) => {}
        Some(_) => errors.push(FieldError::new(
            key,
            format!("score must be between {min} and {max}"),
        )),
        None => errors.push(FieldError::new(key, "required numeric score")),
    }
}

const TEST_SCORE_FIELDS: [&str; 5] = ["reading", "listening", "writing", "speaking", "overall"];

/// University: name, country, campus and city are all required.
pub fn university(fields: &Fields) -> Vec<FieldError> {
    let mut errors = Vec::new();
    for key in ["name", "country", "campus_name", "city"] {
        require_str(fields, key, &mut errors);
    }
    errors
}

/// Course: textual and numeric required fields; `requirement_id` optional.
pub fn course(fields: &Fields) -> Vec<FieldError> {
    let mut errors = Vec::new();
    for key in ["name", "intake", "link"] {
        require_str(fields, key, &mut errors);
    }
    for key in ["university_id", "fees", "duration"] {
        require_positive(fields, key, &mut errors);
    }
    optional_positive(fields, "requirement_id", &mut errors);
    errors
}

/// IELTS: all five band scores required, each within 1.0–9.0.
pub fn ielts(fields: &Fields) -> Vec<FieldError> {
    let mut errors = Vec::new();
    for key in TEST_SCORE_FIELDS {
        require_score(fields, key, 1.0, 9.0, &mut errors);
    }
    errors
}

/// PTE: all five scores required, each within 10–90.
pub fn pte(fields: &Fields) -> Vec<FieldError> {
    let mut errors = Vec::new();
    for key in TEST_SCORE_FIELDS {
        require_score(fields, key, 10.0, 90.0, &mut errors);
    }
    errors
}

/// Requirement: the free-text criterion is required; linked ids optional.
pub fn requirements(fields: &Fields) -> Vec<FieldError> {
    let mut errors = Vec::new();
    require_str(fields, "requirement", &mut errors);
    for key in ["course_id", "ielts_id", "pte_id"] {
        optional_positive(fields, key, &mut errors);
    }
    errors
}

/// User: name, well-formed email, password of at least 6 chars, known role.
pub fn user(fields: &Fields) -> Vec<FieldError> {
    let mut errors = Vec::new();
    require_str(fields, "name", &mut errors);

    match fields.get("email").and_then(Value::as_str) {
        Some(email) if EMAIL_RE.is_match(email.trim()) => {}
        _ => errors.push(FieldError::new("email", "must be a valid email address")),
    }

    match fields.get("password").and_then(Value::as_str) {
        Some(password) if password.trim().len() >= 6 => {}
        _ => errors.push(FieldError::new("password", "must be at least 6 characters")),
    }

    match fields.get("role").and_then(Value::as_str) {
        Some(role) if role.parse::<Role>().is_ok() => {}
        _ => errors.push(FieldError::new(
            "role",
            "must be one of manager, admin, counselor, student",
        )),
    }

    errors
}

/// Subset of payload fields usable in an update: non-empty strings or
/// positive numbers, with the id key itself excluded.
#[must_use]
pub fn updatable_fields(payload: &Fields) -> Fields {
    payload
        .iter()
        .filter(|(key, value)| {
            key.as_str() != "id" && (non_empty_string(value) || positive_number(value))
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
