//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories. Storage errors are classified here and
//! nowhere else.

mod db_errors;
pub mod role_repository;
pub mod user_repository;

pub use role_repository::SeaOrmRoleRepository;
pub use user_repository::SeaOrmUserRepository;
