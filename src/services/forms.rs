// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Form input parsing and validation.

use crate::error::AppError;
use validator::Validate;

/// Signup form.
#[derive(Debug, Clone, Validate)]
pub struct SignUpForm {
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters."))]
    pub password: String,
    #[validate(length(min = 1, max = 128, message = "Username is required."))]
    pub username: String,
}

/// Parse a whole number the way a numeric text field does: leading digits
/// count, anything after them (e.g. a decimal part) is dropped.
///
/// `field` names the value in the error message ("Goal", "Weight").
pub fn parse_whole_number(input: &str, field: &str) -> Result<u32, AppError> {
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    digits[..end]
        .parse()
        .map_err(|_| AppError::BadRequest(format!("{} must be a valid number.", field)))
}
