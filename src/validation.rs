//! Input validation utilities for the service layer.
//!
//! Every check reports a field-level validation error so handlers can
//! surface it to the caller unchanged.

use crate::error::{Error, Result};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 5;
pub const MAX_PASSWORD_LENGTH: usize = 128;
/// Length limit shared by names, titles, links and label names.
pub const MAX_TEXT_LENGTH: usize = 200;

/// Validates email format using structural checks
///
/// # Examples
/// ```
/// use recipes::validation::validate_email;
///
/// validate_email("user@example.com").unwrap();
/// assert!(validate_email("invalid-email").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(Error::invalid("email", "This field may not be blank."));
    }

    if email.chars().count() > MAX_TEXT_LENGTH {
        return Err(Error::invalid(
            "email",
            format!("Ensure this field has no more than {} characters.", MAX_TEXT_LENGTH),
        ));
    }

    let Some((local_part, domain)) = email.split_once('@') else {
        return Err(Error::invalid("email", "Enter a valid email address."));
    };

    if local_part.is_empty()
        || domain.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.contains("..")
    {
        return Err(Error::invalid("email", "Enter a valid email address."));
    }

    let invalid_chars = ['<', '>', '(', ')', '[', ']', '\\', ',', ';', ':', '"', ' '];
    if email.chars().any(|c| invalid_chars.contains(&c) || c.is_control()) {
        return Err(Error::invalid("email", "Enter a valid email address."));
    }

    Ok(())
}

/// Lower-cases the domain part of an email, leaving the local part as typed.
///
/// ```
/// use recipes::validation::normalize_email;
///
/// assert_eq!(normalize_email("Test2@Example.com"), "Test2@example.com");
/// ```
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local_part, domain)) => format!("{}@{}", local_part, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Validates password length.
pub fn validate_password(password: &str) -> Result<()> {
    let length = password.chars().count();

    if length < MIN_PASSWORD_LENGTH {
        return Err(Error::invalid(
            "password",
            format!("Ensure this field has at least {} characters.", MIN_PASSWORD_LENGTH),
        ));
    }

    if length > MAX_PASSWORD_LENGTH {
        return Err(Error::invalid(
            "password",
            format!("Ensure this field has no more than {} characters.", MAX_PASSWORD_LENGTH),
        ));
    }

    Ok(())
}

/// Checks a required text field and returns it trimmed.
pub fn validate_required_text(input: &str, field_name: &str) -> Result<String> {
    let sanitized = sanitize_string(input);

    if sanitized.is_empty() {
        return Err(Error::invalid(field_name, "This field may not be blank."));
    }

    validate_max_length(&sanitized, field_name)?;
    Ok(sanitized)
}

/// Checks the shared length limit on a text field.
pub fn validate_max_length(input: &str, field_name: &str) -> Result<()> {
    if input.chars().count() > MAX_TEXT_LENGTH {
        return Err(Error::invalid(
            field_name,
            format!("Ensure this field has no more than {} characters.", MAX_TEXT_LENGTH),
        ));
    }
    Ok(())
}

/// Parses a comma separated list of integer IDs, e.g. `"1,2,3"`.
///
/// Every element must be an integer; empty elements are rejected rather
/// than skipped.
pub fn parse_id_list(input: &str, field_name: &str) -> Result<Vec<i64>> {
    input
        .split(',')
        .map(|part| {
            part.trim().parse::<i64>().map_err(|_| {
                Error::invalid(
                    field_name,
                    format!("Expected a comma separated list of integer IDs, got '{}'.", part.trim()),
                )
            })
        })
        .collect()
}

/// Parses an integer flag such as `assigned_only`; any non-zero value is true.
pub fn parse_flag(input: &str, field_name: &str) -> Result<bool> {
    input
        .trim()
        .parse::<i64>()
        .map(|value| value != 0)
        .map_err(|_| Error::invalid(field_name, "Expected an integer (0 or 1)."))
}

/// Sanitizes string input by trimming whitespace
pub fn sanitize_string(input: &str) -> String {
    input.trim().to_string()
}
