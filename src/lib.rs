//! # Account Service
//!
//! User accounts and permission-bearing roles: CRUD, credential hashing,
//! paginated search and role assignment.
//!
//! ## Architecture
//!
//! - **domain**: entities, request/response shapes and repository traits
//! - **application**: `UserService` and `RoleService`
//! - **infrastructure**: SeaORM persistence, in-memory storage, bcrypt
//! - **shared**: pagination types
//! - **support**: error taxonomy and request context
//! - **config** / **bootstrap**: TOML configuration and process wiring

pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod shared;
pub mod support;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{init_database, run_migrations, DatabaseConfig};

pub use application::identity::{RoleService, UserService};
pub use bootstrap::AccountServices;
pub use support::{DomainError, DomainResult, ErrorKind, RequestContext};
