//! Role aggregate
//!
//! Permission-bearing roles and their repository interface.

pub mod model;
pub mod repository;

pub use model::{normalize_permissions, NewRole, Role, RolePatch};
pub use repository::RoleRepository;
