//! Field validation helpers shared by the domain crates.

use crate::error::{DomainError, DomainResult, FieldError};

/// Accumulates field errors so a request reports every problem at once.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` against `field` unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    pub fn finish(self) -> DomainResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self.errors))
        }
    }
}

/// Character count of `s` after trimming surrounding whitespace.
pub fn trimmed_len(s: &str) -> usize {
    s.trim().chars().count()
}

/// Absolute `http`/`https` URL with a host.
pub fn is_http_url(s: &str) -> bool {
    match url::Url::parse(s.trim()) {
        Ok(u) => matches!(u.scheme(), "http" | "https") && u.host().is_some(),
        Err(_) => false,
    }
}
