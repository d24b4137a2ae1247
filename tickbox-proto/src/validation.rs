//! Validation rules for task text.
//!
//! The input layer runs [`validate_task_text`] before calling into the
//! state manager; the manager itself never validates. Rules are checked
//! in a fixed order and the first failing rule decides the message.

/// Minimum task text length in characters, after trimming.
pub const MIN_TASK_TEXT_LENGTH: usize = 3;

/// Maximum task text length in characters, after trimming.
pub const MAX_TASK_TEXT_LENGTH: usize = 100;

/// A rule violated by a piece of task text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Text is non-empty but made up only of whitespace.
    #[error("Todo cannot contain only whitespace")]
    WhitespaceOnly,
    /// Text is empty.
    #[error("Todo cannot be empty")]
    Empty,
    /// Trimmed text is longer than [`MAX_TASK_TEXT_LENGTH`].
    #[error("Todo cannot be longer than 100 characters")]
    TooLong,
    /// Trimmed text is shorter than [`MIN_TASK_TEXT_LENGTH`].
    #[error("Todo must be at least 3 characters long")]
    TooShort,
}

/// Outcome of validating a piece of task text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    /// Whether the text passed every rule.
    pub is_valid: bool,
    /// Message of the first failing rule.
    pub error: Option<String>,
}

impl From<Result<(), ValidationError>> for ValidationResult {
    fn from(result: Result<(), ValidationError>) -> Self {
        match result {
            Ok(()) => Self {
                is_valid: true,
                error: None,
            },
            Err(e) => Self {
                is_valid: false,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Checks `text` against every rule, returning the first violation.
///
/// Lengths are measured in characters of the trimmed text.
///
/// # Errors
///
/// Returns the [`ValidationError`] of the first failing rule.
pub fn check_task_text(text: &str) -> Result<(), ValidationError> {
    let trimmed = text.trim();
    if !text.is_empty() && trimmed.is_empty() {
        return Err(ValidationError::WhitespaceOnly);
    }
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }
    let len = trimmed.chars().count();
    if len > MAX_TASK_TEXT_LENGTH {
        return Err(ValidationError::TooLong);
    }
    if len < MIN_TASK_TEXT_LENGTH {
        return Err(ValidationError::TooShort);
    }
    Ok(())
}

/// Validates `text`, returning a [`ValidationResult`] for display.
#[must_use]
pub fn validate_task_text(text: &str) -> ValidationResult {
    check_task_text(text).into()
}
