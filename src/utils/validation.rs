use crate::error::{Error, Result};

/// Trimmed value of a required free-text field.
pub fn require_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::BadRequest(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

pub fn non_negative_hours(value: f64) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::BadRequest(
            "duration_hours must be a non-negative number".to_string(),
        ));
    }
    Ok(value)
}
