//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::catalog::Language;

/// Validates that a language code is one of the supported prompt languages.
///
/// # Examples
///
/// ```ignore
/// validate_language("en") // Ok
/// validate_language("HI") // Ok - case-insensitive
/// validate_language("fr") // Err
/// ```
pub fn validate_language(code: &str) -> Result<(), ValidationError> {
    code.parse::<Language>().map(|_| ()).map_err(|reason| {
        let mut err = ValidationError::new("language");
        err.message = Some(format!("{reason}; expected `en` or `hi`").into());
        err
    })
}

/// Validates that a string contains something other than whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_language() {
        assert!(validate_language("en").is_ok());
        assert!(validate_language(" HI ").is_ok());
        assert!(validate_language("fr").is_err());
        assert!(validate_language("").is_err());
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("owl").is_ok());
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank("").is_err());
    }
}
