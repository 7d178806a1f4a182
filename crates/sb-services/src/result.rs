//! Service result type
//!
//! Every service call returns either a value or the full set of errors. Failures
//! caused by an unreachable or rejecting collaborator are marked retryable: the
//! working copy was left untouched, so the same call can simply be repeated.

use sb_core::error::ValidationErrors;
use std::fmt;

#[derive(Debug, Clone)]
/// Outcome of a service call
pub struct ServiceResult<T> {
    success: bool,
    result: Option<T>,
    errors: ValidationErrors,
    message: Option<String>,
    retryable: bool,
}

impl<T> ServiceResult<T> {
    /// Successful result carrying `result`
    pub fn success(result: T) -> Self {
        Self {
            success: true,
            result: Some(result),
            errors: ValidationErrors::new(),
            message: None,
            retryable: false,
        }
    }

    /// Failed with the given errors; not retryable
    pub fn failure(errors: ValidationErrors) -> Self {
        Self {
            success: false,
            result: None,
            errors,
            message: None,
            retryable: false,
        }
    }

    /// Failed with a single error at `field`
    pub fn failure_with_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        Self::failure(errors)
    }

    /// Failed with a single error not tied to a field
    pub fn failure_with_base_error(message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add_base(message);
        Self::failure(errors)
    }

    /// A collaborator failed; nothing changed and the call may be repeated
    pub fn retryable_failure(message: impl Into<String>) -> Self {
        let mut result = Self::failure_with_base_error(message);
        result.retryable = true;
        result
    }

    /// Check if the call succeeded
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Check if the call failed
    pub fn is_failure(&self) -> bool {
        !self.success
    }

    /// Whether repeating the same call may succeed
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// Get the result if successful
    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    /// Take the result out, leaving `None`
    pub fn take_result(&mut self) -> Option<T> {
        self.result.take()
    }

    /// Get the collected errors
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Get the optional message
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Attach a human-readable message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Every error rendered as `path message`
    pub fn full_messages(&self) -> Vec<String> {
        self.errors.full_messages()
    }

    /// Map the result if successful
    pub fn map<U, F>(self, f: F) -> ServiceResult<U>
    where
        F: FnOnce(T) -> U,
    {
        ServiceResult {
            success: self.success,
            result: self.result.map(f),
            errors: self.errors,
            message: self.message,
            retryable: self.retryable,
        }
    }

    /// `Ok(value)` on success, otherwise the collected errors
    pub fn into_result(self) -> Result<T, ValidationErrors> {
        match (self.success, self.result) {
            (true, Some(value)) => Ok(value),
            (true, None) => {
                let mut errors = ValidationErrors::new();
                errors.add_base("Service succeeded but no result was returned");
                Err(errors)
            }
            (false, _) => Err(self.errors),
        }
    }
}

impl<T> From<Result<T, ValidationErrors>> for ServiceResult<T> {
    fn from(result: Result<T, ValidationErrors>) -> Self {
        match result {
            Ok(value) => ServiceResult::success(value),
            Err(errors) => ServiceResult::failure(errors),
        }
    }
}

impl<T: fmt::Display> fmt::Display for ServiceResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.result, self.success) {
            (Some(result), true) => write!(f, "Success: {}", result),
            (None, true) => write!(f, "Success"),
            (_, false) => write!(f, "Failure: {}", self.errors.full_messages().join(", ")),
        }
    }
}
