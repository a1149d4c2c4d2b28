use std::borrow::Cow;

use validator::ValidationError;

/// Rejects values that are empty once surrounding whitespace is removed.
/// Length rules count raw characters, so "   " would otherwise pass them.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some(Cow::from("must not be blank"));
        return Err(error);
    }
    Ok(())
}
