//! Domain layer - accounts, roles and their repository contracts

pub mod role;
pub mod user;

pub use role::{NewRole, Role, RolePatch, RoleRepository};
pub use user::{CreateUserRequest, UpdateUserRequest, User, UserRepository, UserResponse};

pub use crate::support::errors::{DomainError, DomainResult, ErrorKind};
