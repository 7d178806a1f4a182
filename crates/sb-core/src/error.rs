//! Core error types for Sitebook RS

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Standard Result type for Sitebook operations
pub type SbResult<T> = Result<T, SbError>;

/// Core error type for all Sitebook operations
#[derive(Error, Debug)]
pub enum SbError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Mirror error: {0}")]
    Mirror(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("External service error: {service} - {message}")]
    ExternalService { service: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SbError {
    pub fn error_code(&self) -> &'static str {
        match self {
            SbError::NotFound { .. } => "not_found",
            SbError::Validation(_) => "validation_failed",
            SbError::Mirror(_) => "mirror_error",
            SbError::Serialization(_) => "serialization_error",
            SbError::Io(_) => "io_error",
            SbError::Config(_) => "configuration_error",
            SbError::ExternalService { .. } => "external_service_error",
            SbError::Internal(_) => "internal_error",
        }
    }

    /// Whether the caller may retry the same action without changing its input
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SbError::ExternalService { .. } | SbError::Io(_) | SbError::Mirror(_)
        )
    }
}

/// Validation errors keyed by field path (`sheet1[0].totalSupplied`)
///
/// Paths are kept sorted so a failed submission lists offending fields in a
/// stable order, which lets the user fix all of them in one pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidationErrors {
    /// Field-specific errors: field path -> messages
    pub errors: BTreeMap<String, Vec<String>>,
    /// Base errors not tied to a specific field
    pub base_errors: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_base(&mut self, message: impl Into<String>) {
        self.base_errors.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.base_errors.is_empty()
    }

    /// Check if there are errors for a specific field path
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Get errors for a specific field path
    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.errors.get(field)
    }

    /// All offending field paths, in order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
        self.base_errors.extend(other.base_errors);
    }

    /// Re-key every field error under `prefix` (`client` + `email` -> `client.email`)
    pub fn nest(self, prefix: &str) -> ValidationErrors {
        let mut nested = ValidationErrors::new();
        for (field, messages) in self.errors {
            nested
                .errors
                .entry(format!("{}.{}", prefix, field))
                .or_default()
                .extend(messages);
        }
        nested.base_errors = self.base_errors;
        nested
    }

    pub fn full_messages(&self) -> Vec<String> {
        let mut messages = self.base_errors.clone();
        for (field, field_messages) in &self.errors {
            for msg in field_messages {
                messages.push(format!("{} {}", field, msg));
            }
        }
        messages
    }

    /// `Ok(())` when empty, otherwise `Err(self)`
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation errors: {}", self.full_messages().join("; "))
    }
}

impl std::error::Error for ValidationErrors {}
