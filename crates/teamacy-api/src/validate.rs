use validator::ValidateEmail;

use crate::error::ApiError;

/// Trimmed value of a mandatory text field.
pub fn required(field: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

/// Trimmed address if it is a valid email with a dotted domain.
pub fn email(value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    let dotted_domain = trimmed
        .rsplit_once('@')
        .is_some_and(|(_, domain)| domain.contains('.'));

    if !trimmed.validate_email() || !dotted_domain {
        return Err(ApiError::Validation(
            "value is not a valid email address".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Account emails are compared case-insensitively.
pub fn account_email(value: &str) -> Result<String, ApiError> {
    email(value).map(|e| e.to_lowercase())
}
