//! Client-side input checks. Each runs before any request is issued and fails
//! with a message specific to the field, so the customer knows what to fix.

use regex::Regex;
use std::fmt;

/// Length of the one-time code mailed by the auth service.
pub const CODE_LENGTH: usize = 6;
/// Minimum password length for both registration and reset.
pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Email,
    Code,
    FullName,
    Phone,
    Password,
    Confirmation,
}

impl Field {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Code => "code",
            Self::FullName => "full_name",
            Self::Phone => "phone",
            Self::Password => "password",
            Self::Confirmation => "confirmation",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl FieldError {
    fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for FieldError {}

/// Basic email format check: something, `@`, something, `.`, something.
#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}

/// Local mobile number: ten digits starting with `0` and a carrier prefix.
#[must_use]
pub fn valid_phone(phone: &str) -> bool {
    Regex::new(r"^0[35789][0-9]{8}$").is_ok_and(|regex| regex.is_match(phone))
}

/// Strips the separators people type between digit groups.
#[must_use]
pub fn normalize_phone(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '.' | '(' | ')'))
        .collect()
}

/// Returns the trimmed email. The case is kept as typed; the pinned email is
/// exactly what the customer submitted.
///
/// # Errors
/// Returns a [`FieldError`] for an empty or malformed address.
pub fn email(input: &str) -> Result<String, FieldError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(FieldError::new(Field::Email, "Email is required."));
    }
    if !valid_email(trimmed) {
        return Err(FieldError::new(Field::Email, "Email address looks invalid."));
    }
    Ok(trimmed.to_string())
}

/// # Errors
/// Returns a [`FieldError`] when the code is missing or not exactly
/// [`CODE_LENGTH`] characters.
pub fn code(input: &str) -> Result<String, FieldError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(FieldError::new(
            Field::Code,
            "Enter the code we sent to your email.",
        ));
    }
    if trimmed.chars().count() != CODE_LENGTH {
        return Err(FieldError::new(
            Field::Code,
            format!("The code must be exactly {CODE_LENGTH} characters."),
        ));
    }
    Ok(trimmed.to_string())
}

/// # Errors
/// Returns a [`FieldError`] when the name is blank.
pub fn full_name(input: &str) -> Result<String, FieldError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(FieldError::new(Field::FullName, "Full name is required."));
    }
    Ok(trimmed.to_string())
}

/// # Errors
/// Returns a [`FieldError`] when the number is missing or not a local mobile
/// number.
pub fn phone(input: &str) -> Result<String, FieldError> {
    let normalized = normalize_phone(input);
    if normalized.is_empty() {
        return Err(FieldError::new(Field::Phone, "Phone number is required."));
    }
    if !valid_phone(&normalized) {
        return Err(FieldError::new(
            Field::Phone,
            "Phone number must be 10 digits starting with 03, 05, 07, 08 or 09.",
        ));
    }
    Ok(normalized)
}

/// Passwords are not trimmed; whitespace is part of the secret.
///
/// # Errors
/// Returns a [`FieldError`] when the password is shorter than
/// [`MIN_PASSWORD_LENGTH`].
pub fn password(input: &str) -> Result<(), FieldError> {
    if input.is_empty() {
        return Err(FieldError::new(Field::Password, "Password is required."));
    }
    if input.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(FieldError::new(
            Field::Password,
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters."),
        ));
    }
    Ok(())
}

/// # Errors
/// Returns a [`FieldError`] when the confirmation differs from the password.
pub fn confirmation(password: &str, confirmation: &str) -> Result<(), FieldError> {
    if password != confirmation {
        return Err(FieldError::new(
            Field::Confirmation,
            "Passwords do not match.",
        ));
    }
    Ok(())
}
