use std::{collections::BTreeMap, fmt::Display};

use serde::Serialize;

/// Complete set of failed checks from one validation pass, keyed by field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationError {
    errors: BTreeMap<String, String>,
}

impl ValidationError {
    pub(crate) fn new(errors: BTreeMap<String, String>) -> Self {
        ValidationError { errors }
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn into_errors(self) -> BTreeMap<String, String> {
        self.errors
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in &self.errors {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

impl From<BTreeMap<String, String>> for ValidationError {
    fn from(errors: BTreeMap<String, String>) -> Self {
        ValidationError::new(errors)
    }
}
