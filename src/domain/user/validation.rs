//! User validation utilities

use thiserror::Error;

/// Errors that can occur during user validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserValidationError {
    #[error("User ID cannot be empty")]
    EmptyId,

    #[error("User ID exceeds maximum length of {0} characters")]
    IdTooLong(usize),

    #[error("User ID contains invalid character: {0:?}. Whitespace and control characters are not allowed")]
    InvalidIdCharacter(char),
}

const MAX_USER_ID_LENGTH: usize = 100;

/// Validate a user ID
///
/// User IDs are logins issued by the authentication layer, so only the
/// characters that would break key layout or log output are refused:
/// - Cannot be empty
/// - Maximum 100 characters
/// - No whitespace or control characters
pub fn validate_user_id(id: &str) -> Result<(), UserValidationError> {
    if id.is_empty() {
        return Err(UserValidationError::EmptyId);
    }

    if id.chars().count() > MAX_USER_ID_LENGTH {
        return Err(UserValidationError::IdTooLong(MAX_USER_ID_LENGTH));
    }

    if let Some(c) = id.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(UserValidationError::InvalidIdCharacter(c));
    }

    Ok(())
}
