//! Infrastructure layer - external concerns

pub mod crypto;
pub mod database;
pub mod storage;

pub use database::repositories::{SeaOrmRoleRepository, SeaOrmUserRepository};
pub use database::{init_database, run_migrations, DatabaseConfig};
pub use storage::InMemoryAccountStore;
