use async_trait::async_trait;
use uuid::Uuid;

use super::User;
use crate::shared::{PaginatedResult, PaginationFilter};
use crate::support::{DomainResult, RequestContext};

/// User persistence contract.
///
/// Reads return the user with its role loaded. Missing rows are reported as
/// `NotFound` carrying the lookup key; unique violations as `Conflict`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Filtered, sorted page of users plus the filtered total.
    async fn get_all(
        &self,
        ctx: &RequestContext,
        filter: &PaginationFilter,
    ) -> DomainResult<PaginatedResult<User>>;

    async fn get_by_id(&self, ctx: &RequestContext, id: Uuid) -> DomainResult<User>;
    async fn get_by_email(&self, ctx: &RequestContext, email: &str) -> DomainResult<User>;
    async fn get_by_username(&self, ctx: &RequestContext, username: &str) -> DomainResult<User>;

    async fn create(&self, ctx: &RequestContext, user: User) -> DomainResult<User>;

    /// Persist every field of `user` by id. No matching row is `NotFound`.
    async fn update(&self, ctx: &RequestContext, user: User) -> DomainResult<User>;

    async fn delete(&self, ctx: &RequestContext, id: Uuid) -> DomainResult<()>;
}
