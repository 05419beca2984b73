//! Request payload validation.
//!
//! Handlers receive raw JSON objects. A [`FieldReader`] pulls typed, normalized
//! values out of one and remembers every field that was missing or unusable, so a
//! rejected request names all offending fields at once.

use serde_json::{Map, Value};
use thiserror::Error;

/// One or more required fields were missing, empty or of the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Missing required fields: {}", fields.join(", "))]
pub struct ValidationError {
    pub fields: Vec<&'static str>,
}

pub struct FieldReader<'a> {
    input: &'a Map<String, Value>,
    offending: Vec<&'static str>,
}

impl<'a> FieldReader<'a> {
    pub fn new(input: &'a Map<String, Value>) -> Self {
        Self {
            input,
            offending: Vec::new(),
        }
    }

    /// Required string, trimmed. Must be non-empty after trimming.
    pub fn text(&mut self, name: &'static str) -> String {
        match self.present(name) {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => self.reject(name, String::new()),
        }
    }

    /// Optional string, trimmed. Absent or null reads as an empty string.
    pub fn optional_text(&mut self, name: &'static str) -> String {
        match self.present(name) {
            None => String::new(),
            Some(Value::String(s)) => s.trim().to_string(),
            Some(_) => self.reject(name, String::new()),
        }
    }

    /// Required e-mail address, trimmed. Needs a non-empty local part and a dotted domain.
    pub fn email(&mut self, name: &'static str) -> String {
        match self.present(name) {
            Some(Value::String(s)) if is_email(s.trim()) => s.trim().to_string(),
            _ => self.reject(name, String::new()),
        }
    }

    /// Required number, coerced from a JSON number or a numeric string.
    /// Must be finite and not negative.
    pub fn non_negative_number(&mut self, name: &'static str) -> f64 {
        match self.present(name).and_then(coerce_number) {
            Some(n) if n.is_finite() && n >= 0.0 => n,
            _ => self.reject(name, 0.0),
        }
    }

    /// Required whole number greater than zero.
    pub fn positive_integer(&mut self, name: &'static str) -> u32 {
        match self.present(name).and_then(coerce_number) {
            Some(n) if n.fract() == 0.0 && n >= 1.0 && n <= f64::from(u32::MAX) => n as u32,
            _ => self.reject(name, 0),
        }
    }

    /// `Ok(())` if every field read so far was usable.
    pub fn finish(self) -> Result<(), ValidationError> {
        if self.offending.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                fields: self.offending,
            })
        }
    }

    fn present(&self, name: &str) -> Option<&'a Value> {
        match self.input.get(name) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value),
        }
    }

    fn reject<T>(&mut self, name: &'static str, placeholder: T) -> T {
        self.offending.push(name);
        placeholder
    }
}

fn is_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !s.chars().any(char::is_whitespace)
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if !s.trim().is_empty() => s.trim().parse().ok(),
        _ => None,
    }
}
