/// Error type shared by the storefront data layer
///
/// Business-rule failures (bad field formats, duplicates, dangling references)
/// are reported as [`Error::Validation`] carrying a human-readable message.
/// Lookups that find nothing are NOT errors: they return `Ok(None)`.
///
/// # Example
///
/// ```
/// use storefront_shared::error::Error;
///
/// let err = Error::validation("Price must be greater than 0");
/// assert!(err.is_validation());
/// assert_eq!(err.to_string(), "Price must be greater than 0");
/// ```

use crate::auth::password::PasswordError;

/// Result alias used throughout the shared crate
pub type Result<T> = std::result::Result<T, Error>;

/// Storefront data layer error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input failed a format, range, uniqueness or referential rule
    #[error("{0}")]
    Validation(String),

    /// Login failed
    ///
    /// Deliberately generic: unknown user, wrong password and inactive
    /// account all produce this same variant.
    #[error("Invalid credentials or inactive account")]
    InvalidCredentials,

    /// Password hashing or hash parsing failed
    #[error("Password operation failed: {0}")]
    Password(#[from] PasswordError),

    /// Database or connection failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Error {
    /// Builds a validation error from any message
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Whether this error is a validation failure
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

/// Messages shared by the repositories and both storage backends so that a
/// constraint caught late (by the database) reads the same as one caught early.
pub mod messages {
    pub const DUPLICATE_USERNAME: &str = "Username is already taken";
    pub const DUPLICATE_EMAIL: &str = "Email is already registered";
    pub const DUPLICATE_CATEGORY: &str = "A category with that name already exists";
    pub const UNKNOWN_CATEGORY: &str = "The specified category does not exist";
    pub const UNKNOWN_USER: &str = "The specified user does not exist";
    pub const CATEGORY_IN_USE: &str = "Category still has products and cannot be deleted";
    pub const NO_ADMIN: &str = "No administrator user found to attribute the change to";
    pub const DEFAULT_ADMIN_EMAIL_TAKEN: &str =
        "The default administrator email belongs to a non-administrator account";
    pub const DEFAULT_ADMIN_USERNAME_TAKEN: &str =
        "The default administrator username belongs to another account";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_is_message() {
        let err = Error::validation(messages::DUPLICATE_EMAIL);
        assert_eq!(err.to_string(), "Email is already registered");
        assert!(err.is_validation());
    }

    #[test]
    fn test_invalid_credentials_is_generic() {
        let err = Error::InvalidCredentials;
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "Invalid credentials or inactive account");
    }

    #[test]
    fn test_database_error_conversion() {
        let err: Error = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, Error::Database(_)));
    }
}
