use std::{collections::BTreeMap, collections::HashSet, hash::Hash};

use crate::error::ValidationError;

/// Accumulates failed checks for one validation pass.
///
/// Only the first message recorded for a field is kept, so the most basic
/// problem (like a missing value) is not hidden by follow-up checks on the
/// same field.
#[derive(Debug, Default, Clone)]
pub struct Validator {
    errors: BTreeMap<String, String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_insert_with(|| message.into());
    }

    pub fn check(&mut self, ok: bool, field: impl Into<String>, message: impl Into<String>) {
        if !ok {
            self.add_error(field, message);
        }
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.valid() {
            Ok(())
        } else {
            Err(ValidationError::new(self.errors))
        }
    }
}

/// `true` if `value` is one of `allowed`.
pub fn permitted<T: PartialEq>(value: &T, allowed: &[T]) -> bool {
    allowed.contains(value)
}

/// `true` if no value repeats, order is irrelevant.
pub fn unique<T>(values: &[T]) -> bool
where
    T: Eq + Hash,
{
    let mut seen = HashSet::with_capacity(values.len());
    values.iter().all(|v| seen.insert(v))
}
