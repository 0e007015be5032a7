use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;

/// Field-level validation messages, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        field: &'static str,
        message: impl Into<String>,
    ) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    pub fn clear_field(
        &mut self,
        field: &str,
    ) {
        self.errors.remove(field);
    }

    pub fn get(
        &self,
        field: &str,
    ) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.errors.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// `Ok(())` when no errors were recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    pub(crate) fn require_text(
        &mut self,
        field: &'static str,
        value: &str,
        message: &str,
    ) {
        if value.trim().is_empty() {
            self.add(field, message);
        }
    }

    pub(crate) fn require_non_negative(
        &mut self,
        field: &'static str,
        value: Option<Decimal>,
        message: &str,
    ) {
        if value.is_some_and(|v| v.is_sign_negative() && !v.is_zero()) {
            self.add(field, message);
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Trims a brand name and rejects blank input.
pub fn validate_brand_name(name: &str) -> Result<String, ValidationErrors> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut errors = ValidationErrors::new();
        errors.add("brand", "brand name must not be empty");
        return Err(errors);
    }
    Ok(trimmed.to_string())
}
