//! User management service: application-layer orchestration
//!
//! Hashes credentials, merges partial updates and projects users to
//! [`UserResponse`]. Classified repository errors pass through; unclassified
//! ones are wrapped with an operation code.

use std::sync::Arc;

use tokio::task::spawn_blocking;
use tracing::{debug, info, instrument};
use uuid::Uuid;
use validator::Validate;

use super::logged;
use crate::domain::user::{CreateUserRequest, UpdateUserRequest, User, UserRepository, UserResponse};
use crate::infrastructure::crypto::PasswordHasher;
use crate::shared::{PaginatedResult, PaginationFilter};
use crate::support::{DomainError, DomainResult, RequestContext};

/// Generic over `R: UserRepository` so it stays decoupled from the concrete
/// persistence layer.
pub struct UserService<R: UserRepository> {
    repo: Arc<R>,
    hasher: PasswordHasher,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: Arc<R>, hasher: PasswordHasher) -> Self {
        Self { repo, hasher }
    }

    /// bcrypt runs on the blocking pool; the context stops the wait, not the work.
    async fn hash(&self, ctx: &RequestContext, password: &str) -> DomainResult<String> {
        let hasher = self.hasher;
        let password = password.to_owned();
        ctx.guard("users.hash_password", async move {
            spawn_blocking(move || hasher.hash(&password))
                .await
                .map_err(|e| DomainError::internal("PASSWORD_HASH", "hashing task failed", e))?
                .map_err(|e| DomainError::internal("PASSWORD_HASH", "failed to hash password", e))
        })
        .await
    }

    async fn verify(&self, ctx: &RequestContext, password: &str, hash: &str) -> DomainResult<bool> {
        let hasher = self.hasher;
        let password = password.to_owned();
        let hash = hash.to_owned();
        ctx.guard("users.verify_password", async move {
            spawn_blocking(move || hasher.verify(&password, &hash).unwrap_or(false))
                .await
                .map_err(|e| DomainError::internal("PASSWORD_VERIFY", "verification task failed", e))
        })
        .await
    }

    // ── Queries ─────────────────────────────────────────────────

    /// Page of users matching `search` over name and email. An empty result
    /// is `NotFound`.
    #[instrument(skip(self, ctx))]
    pub async fn get_all(
        &self,
        ctx: &RequestContext,
        search: &str,
        limit: u64,
        page: u64,
        sort: &str,
    ) -> DomainResult<PaginatedResult<UserResponse>> {
        let filter = PaginationFilter::new(search, limit, page, sort);

        let result = self
            .repo
            .get_all(ctx, &filter)
            .await
            .map_err(|e| logged(e.context("USER_LIST", "failed to get users")))?;

        if result.total == 0 {
            debug!("No users matched");
            return Err(DomainError::not_found("User", "search", filter.search));
        }

        Ok(result.map(UserResponse::from))
    }

    #[instrument(skip(self, ctx), fields(user_id = %id))]
    pub async fn get_by_id(&self, ctx: &RequestContext, id: Uuid) -> DomainResult<UserResponse> {
        self.repo
            .get_by_id(ctx, id)
            .await
            .map(UserResponse::from)
            .map_err(|e| logged(e.context("USER_GET", "failed to get user")))
    }

    #[instrument(skip(self, ctx))]
    pub async fn get_by_email(&self, ctx: &RequestContext, email: &str) -> DomainResult<UserResponse> {
        self.repo
            .get_by_email(ctx, email)
            .await
            .map(UserResponse::from)
            .map_err(|e| logged(e.context("USER_GET", "failed to get user by email")))
    }

    #[instrument(skip(self, ctx))]
    pub async fn get_by_username(&self, ctx: &RequestContext, username: &str) -> DomainResult<UserResponse> {
        self.repo
            .get_by_username(ctx, username)
            .await
            .map(UserResponse::from)
            .map_err(|e| logged(e.context("USER_GET", "failed to get user by username")))
    }

    // ── Commands (mutations) ────────────────────────────────────

    #[instrument(skip(self, ctx, request), fields(username = %request.username))]
    pub async fn create(&self, ctx: &RequestContext, request: CreateUserRequest) -> DomainResult<UserResponse> {
        request.validate().map_err(|e| logged(e.into()))?;

        let password_hash = self.hash(ctx, &request.password).await.map_err(logged)?;
        let user = User::new(
            request.name,
            request.full_name,
            request.username,
            request.email,
            password_hash,
        );

        let created = self
            .repo
            .create(ctx, user)
            .await
            .map_err(|e| logged(e.context("USER_CREATE", "failed to create user")))?;

        info!(user_id = %created.id, "User created");
        Ok(created.into())
    }

    /// Overwrite only the supplied fields. The password is re-hashed only
    /// when a new one is given; an empty payload writes nothing.
    #[instrument(skip(self, ctx, request), fields(user_id = %id))]
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        request: UpdateUserRequest,
    ) -> DomainResult<UserResponse> {
        let request = request.normalized();
        request.validate().map_err(|e| logged(e.into()))?;

        let mut user = self
            .repo
            .get_by_id(ctx, id)
            .await
            .map_err(|e| logged(e.context("USER_UPDATE", "failed to load user")))?;

        if request.is_empty() {
            debug!("Nothing to update");
            return Ok(user.into());
        }

        let new_hash = match request.password.as_deref() {
            Some(password) => Some(self.hash(ctx, password).await.map_err(logged)?),
            None => None,
        };
        user.apply_update(request, new_hash);

        let updated = self
            .repo
            .update(ctx, user)
            .await
            .map_err(|e| logged(e.context("USER_UPDATE", "failed to update user")))?;

        info!("User updated");
        Ok(updated.into())
    }

    #[instrument(skip(self, ctx), fields(user_id = %id))]
    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> DomainResult<()> {
        self.repo
            .get_by_id(ctx, id)
            .await
            .map_err(|e| logged(e.context("USER_DELETE", "failed to load user")))?;

        self.repo
            .delete(ctx, id)
            .await
            .map_err(|e| logged(e.context("USER_DELETE", "failed to delete user")))?;

        info!("User deleted");
        Ok(())
    }

    // ── Authentication ──────────────────────────────────────────

    /// Check a username-or-email and password pair. Unknown users, disabled
    /// accounts and wrong passwords are all `Unauthorized`.
    #[instrument(skip(self, ctx, password))]
    pub async fn verify_credentials(
        &self,
        ctx: &RequestContext,
        username_or_email: &str,
        password: &str,
    ) -> DomainResult<UserResponse> {
        // Try username first, then email
        let user = match self.repo.get_by_username(ctx, username_or_email).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => match self.repo.get_by_email(ctx, username_or_email).await {
                Ok(user) => user,
                Err(e) if e.is_not_found() => {
                    return Err(logged(DomainError::Unauthorized("invalid credentials".into())))
                }
                Err(e) => return Err(logged(e.context("USER_AUTH", "failed to load user"))),
            },
            Err(e) => return Err(logged(e.context("USER_AUTH", "failed to load user"))),
        };

        if !user.is_active {
            return Err(logged(DomainError::Unauthorized("account is disabled".into())));
        }

        let valid = self
            .verify(ctx, password, &user.password_hash)
            .await
            .map_err(|e| logged(e.context("USER_AUTH", "failed to verify password")))?;
        if !valid {
            return Err(logged(DomainError::Unauthorized("invalid credentials".into())));
        }

        Ok(user.into())
    }
}
