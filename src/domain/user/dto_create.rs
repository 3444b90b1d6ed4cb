use serde::Deserialize;
use validator::Validate;

/// Minimum accepted password length, mirrored in the `length` validators
pub const MIN_PASSWORD_LENGTH: u64 = 6;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "full name is required"))]
    pub full_name: String,
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "password is too short"))]
    pub password: String,
}
