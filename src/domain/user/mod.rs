//! User aggregate
//!
//! Contains the User entity, request/response shapes, and repository interface.

pub mod model;
pub mod repository;

mod dto_create;
mod dto_update;

pub use model::{User, UserResponse};

pub use dto_create::{CreateUserRequest, MIN_PASSWORD_LENGTH};
pub use dto_update::UpdateUserRequest;

pub use repository::UserRepository;
