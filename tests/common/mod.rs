#![allow(dead_code)]

use account_service::bootstrap::AccountServices;
use account_service::infrastructure::{SeaOrmRoleRepository, SeaOrmUserRepository};
use account_service::{init_database, run_migrations, AppConfig, DatabaseConfig};
use sea_orm::DatabaseConnection;

/// Fresh in-memory SQLite database with migrations applied
pub async fn create_test_db() -> DatabaseConnection {
    let db = init_database(&DatabaseConfig::sqlite_memory())
        .await
        .expect("Failed to connect to test database");

    run_migrations(&db).await.expect("Failed to run migrations");
    db
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.security.bcrypt_cost = 4;
    config
}

pub async fn create_test_services() -> AccountServices<SeaOrmUserRepository, SeaOrmRoleRepository> {
    AccountServices::new(create_test_db().await, &test_config())
}
