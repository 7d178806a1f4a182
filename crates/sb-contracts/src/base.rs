//! Base contract system

use sb_core::error::ValidationErrors;
use validator::{ValidationErrorsKind, Validate};

/// Result of contract validation
pub type ValidationResult = Result<(), ValidationErrors>;

/// Base contract trait
pub trait Contract<T>: Send + Sync {
    /// Validate the entity, collecting every violation
    fn validate(&self, entity: &T) -> ValidationResult;
}

/// Run the `validator` derive rules of `entity` and re-key the failures by wire path
pub fn field_rules<T: Validate>(entity: &T) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if let Err(field_errors) = entity.validate() {
        flatten_into(&field_errors, "", &mut errors);
    }
    errors
}

fn flatten_into(source: &validator::ValidationErrors, prefix: &str, target: &mut ValidationErrors) {
    for (field, kind) in source.errors() {
        let path = join_path(prefix, &camel_case(field));
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    target.add(path.clone(), describe(error));
                }
            }
            ValidationErrorsKind::Struct(nested) => flatten_into(nested, &path, target),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    flatten_into(nested, &format!("{}[{}]", path, index), target);
                }
            }
        }
    }
}

fn describe(error: &validator::ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }
    match error.code.as_ref() {
        "range" => "must not be negative".to_string(),
        "email" => "is not a valid email address".to_string(),
        "length" => "has an invalid length".to_string(),
        other => format!("is invalid ({})", other),
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

/// `total_supplied` -> `totalSupplied`, matching the serde wire names
pub fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper_next = false;
    for c in field.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
