//! Validation helpers for the event form.

use validator::ValidationError;

fn failure(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Validates an event name: at least one hyphen, then a lowercase URL slug.
///
/// # Examples
///
/// ```ignore
/// validate_event_name("ludum-dare-50") // Ok
/// validate_event_name("nojam2021")     // Err - no hyphen
/// validate_event_name("Bad-Name")      // Err - not a slug
/// ```
pub fn validate_event_name(name: &str) -> Result<(), ValidationError> {
    if !name.contains('-') {
        return Err(failure(
            "event_name_hyphen",
            "Name must contain at least one hyphen (-)",
        ));
    }

    if !is_slug(name) {
        return Err(failure("event_name_slug", "Name is not a valid slug"));
    }

    Ok(())
}

/// Lowercase alphanumeric words separated by single hyphens.
pub fn is_slug(value: &str) -> bool {
    !value.is_empty()
        && value.split('-').all(|word| {
            !word.is_empty()
                && word
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        })
}

/// Validates an optional integer field such as the preset id. Empty means absent.
pub fn validate_optional_int(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() || value.parse::<i64>().is_ok() {
        Ok(())
    } else {
        Err(failure("optional_int", "Invalid integer"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(err: ValidationError) -> String {
        err.message.map(|m| m.into_owned()).unwrap_or_default()
    }

    #[test]
    fn test_validate_event_name_valid() {
        assert!(validate_event_name("ludum-dare-50").is_ok());
        assert!(validate_event_name("no-jam-2021").is_ok());
    }

    #[test]
    fn test_validate_event_name_reports_hyphen_first() {
        assert_eq!(
            message(validate_event_name("nojam2021").unwrap_err()),
            "Name must contain at least one hyphen (-)"
        );
        assert_eq!(
            message(validate_event_name("bad name").unwrap_err()),
            "Name must contain at least one hyphen (-)"
        );
        assert_eq!(
            message(validate_event_name("").unwrap_err()),
            "Name must contain at least one hyphen (-)"
        );
    }

    #[test]
    fn test_validate_event_name_invalid_slug() {
        for name in ["Bad-Name", "bad name-1", "-jam", "jam-", "jam--1", "jam_1-2"] {
            assert_eq!(
                message(validate_event_name(name).unwrap_err()),
                "Name is not a valid slug",
                "{name}"
            );
        }
    }

    #[test]
    fn test_validate_optional_int() {
        assert!(validate_optional_int("").is_ok());
        assert!(validate_optional_int("12").is_ok());
        assert!(validate_optional_int("twelve").is_err());
        assert!(validate_optional_int("1.5").is_err());
    }
}
