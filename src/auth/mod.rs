pub mod blacklist;
pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use validator::Validate;

// Re-export necessary items
pub use blacklist::{MemoryRevocationStore, PgRevocationStore, RevocationStore};
pub use extractors::AuthenticatedUserId;
pub use middleware::{bearer_token, AuthGuard};
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenService, TOKEN_TTL_SECS};

lazy_static! {
    // Regex for username validation: alphanumeric, underscores, hyphens
    static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// Payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}

/// Payload for a new account signup request.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    /// Desired username: 3–32 characters, alphanumeric plus underscores and
    /// hyphens.
    #[validate(
        length(min = 3, max = 32),
        regex(
            path = "USERNAME_REGEX",
            message = "Username must be alphanumeric, underscores, or hyphens"
        )
    )]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}

/// Payload for a password change. The current password is re-verified
/// before the new one is accepted, independent of the guard's token check.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 6))]
    pub new_password: String,
}

/// Response after successful authentication (signup or login).
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The signed session token.
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_login_request_validation() {
        let valid_login = LoginRequest {
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(valid_login.validate().is_ok());

        let invalid_email_login = LoginRequest {
            email: "testexample.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(invalid_email_login.validate().is_err());

        let short_password_login = LoginRequest {
            email: "test@example.com".to_string(),
            password: "123".to_string(),
        };
        assert!(short_password_login.validate().is_err());
    }

    #[test]
    fn test_signup_request_validation() {
        let valid_signup = SignupRequest {
            username: "test_user-123".to_string(),
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(valid_signup.validate().is_ok());

        let invalid_username_signup = SignupRequest {
            username: "test user!".to_string(), // Contains space and exclamation
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(invalid_username_signup.validate().is_err());

        let short_username_signup = SignupRequest {
            username: "tu".to_string(),
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(short_username_signup.validate().is_err());
    }

    #[test]
    fn test_change_password_request_validation() {
        let valid = ChangePasswordRequest {
            current_password: "old_password".to_string(),
            new_password: "new_password".to_string(),
        };
        assert!(valid.validate().is_ok());

        let short_new_password = ChangePasswordRequest {
            current_password: "old_password".to_string(),
            new_password: "123".to_string(),
        };
        assert!(short_new_password.validate().is_err());
    }
}
