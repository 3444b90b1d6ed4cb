//! Process bootstrap: tracing, database, service wiring and the default
//! admin account.
//!
//! ```rust,no_run
//! use account_service::bootstrap::{self, AccountServices};
//! use account_service::config::{default_config_path, AppConfig};
//! use account_service::support::RequestContext;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load(&default_config_path())?;
//!     bootstrap::init_tracing(&config);
//!
//!     let db = bootstrap::init_database(&config.database).await?;
//!     bootstrap::run_migrations(&db).await?;
//!
//!     let services = AccountServices::new(db, &config);
//!     bootstrap::ensure_default_admin(&RequestContext::background(), &services, &config.admin).await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tracing::info;
use uuid::Uuid;

use crate::application::identity::{RoleService, UserService};
use crate::config::{AdminConfig, AppConfig};
use crate::domain::role::{NewRole, RoleRepository};
use crate::domain::user::{CreateUserRequest, UserRepository};
use crate::infrastructure::crypto::PasswordHasher;
use crate::infrastructure::{InMemoryAccountStore, SeaOrmRoleRepository, SeaOrmUserRepository};
use crate::support::{DomainResult, RequestContext};

pub use crate::infrastructure::database::{init_database, run_migrations};

/// Initialize tracing (logging) from the application config.
///
/// `RUST_LOG` wins over `logging.level` when set. Call once at startup.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

/// User and role services sharing one storage backend.
pub struct AccountServices<U: UserRepository, R: RoleRepository> {
    pub users: UserService<U>,
    pub roles: RoleService<R>,
}

impl AccountServices<SeaOrmUserRepository, SeaOrmRoleRepository> {
    pub fn new(db: DatabaseConnection, config: &AppConfig) -> Self {
        let hasher = PasswordHasher::new(config.security.bcrypt_cost);
        Self {
            users: UserService::new(Arc::new(SeaOrmUserRepository::new(db.clone())), hasher),
            roles: RoleService::new(Arc::new(SeaOrmRoleRepository::new(db))),
        }
    }
}

impl AccountServices<InMemoryAccountStore, InMemoryAccountStore> {
    /// Both services over one in-memory store, for development and tests.
    pub fn in_memory(config: &AppConfig) -> Self {
        let store = Arc::new(InMemoryAccountStore::new());
        let hasher = PasswordHasher::new(config.security.bcrypt_cost);
        Self {
            users: UserService::new(store.clone(), hasher),
            roles: RoleService::new(store),
        }
    }
}

/// What [`ensure_default_admin`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminSeed {
    Disabled,
    Ensured {
        user_id: Uuid,
        role_id: Uuid,
        user_created: bool,
        role_created: bool,
    },
}

/// Create the admin role and user when missing and make sure the user holds
/// the role. Safe to run on every start.
pub async fn ensure_default_admin<U, R>(
    ctx: &RequestContext,
    services: &AccountServices<U, R>,
    admin: &AdminConfig,
) -> DomainResult<AdminSeed>
where
    U: UserRepository,
    R: RoleRepository,
{
    if !admin.enabled {
        return Ok(AdminSeed::Disabled);
    }

    let (role, role_created) = match services.roles.find_by_name(ctx, &admin.role_name).await {
        Ok(role) => (role, false),
        Err(e) if e.is_not_found() => {
            let role = services
                .roles
                .create(
                    ctx,
                    NewRole {
                        name: admin.role_name.clone(),
                        permissions: admin.permissions.clone(),
                    },
                )
                .await?;
            (role, true)
        }
        Err(e) => return Err(e),
    };

    let (user_id, user_created) = match services.users.get_by_username(ctx, &admin.username).await {
        Ok(user) => (user.id, false),
        Err(e) if e.is_not_found() => {
            info!("Creating default admin user...");
            let user = services
                .users
                .create(
                    ctx,
                    CreateUserRequest {
                        name: admin.name.clone(),
                        full_name: admin.full_name.clone(),
                        username: admin.username.clone(),
                        email: admin.email.clone(),
                        password: admin.password.clone(),
                    },
                )
                .await?;
            info!("Default admin created: {}", admin.email);
            info!("Please change the admin password immediately!");
            (user.id, true)
        }
        Err(e) => return Err(e),
    };

    services.roles.assign_user(ctx, user_id, role.id).await?;

    Ok(AdminSeed::Ensured {
        user_id,
        role_id: role.id,
        user_created,
        role_created,
    })
}
