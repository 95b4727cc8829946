use std::{collections::BTreeMap, fmt::Display};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

/// Every field that failed validation, in the order the fields were checked
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid payload: {}", Violations(.violations))]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn fields(&self) -> Vec<&'static str> {
        self.violations.iter().map(|v| v.field).collect()
    }

    /// groups messages by field, the shape returned to HTTP clients
    pub fn by_field(&self) -> BTreeMap<&'static str, Vec<String>> {
        let mut grouped: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
        for violation in &self.violations {
            grouped
                .entry(violation.field)
                .or_default()
                .push(violation.message.clone());
        }
        grouped
    }
}

struct Violations<'a>(&'a [FieldViolation]);

impl Display for Violations<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages = self
            .0
            .iter()
            .map(|v| v.message.as_str())
            .collect::<Vec<_>>();
        write!(f, "{}", messages.join(" "))
    }
}
