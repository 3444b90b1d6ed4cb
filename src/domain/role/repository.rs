//! Role repository interface

use async_trait::async_trait;
use uuid::Uuid;

use super::Role;
use crate::shared::{PaginatedResult, PaginationFilter};
use crate::support::{DomainResult, RequestContext};

#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Insert a new role. A taken name is a `Conflict` on `name`.
    async fn create(&self, ctx: &RequestContext, role: Role) -> DomainResult<Role>;

    async fn find_by_id(&self, ctx: &RequestContext, id: Uuid) -> DomainResult<Role>;
    async fn find_by_name(&self, ctx: &RequestContext, name: &str) -> DomainResult<Role>;

    /// Roles matching any of `ids`; unknown ids are skipped.
    async fn find_many_by_id(&self, ctx: &RequestContext, ids: &[Uuid]) -> DomainResult<Vec<Role>>;

    async fn find_all(
        &self,
        ctx: &RequestContext,
        filter: &PaginationFilter,
    ) -> DomainResult<PaginatedResult<Role>>;

    async fn update(&self, ctx: &RequestContext, role: Role) -> DomainResult<Role>;
    async fn delete(&self, ctx: &RequestContext, id: Uuid) -> DomainResult<()>;

    /// Point the user's role reference at `role_id`. Already assigned is a no-op.
    async fn assign_user(&self, ctx: &RequestContext, user_id: Uuid, role_id: Uuid) -> DomainResult<()>;

    /// Clear the user's role reference if it is `role_id`, otherwise a no-op.
    async fn unassign_user(&self, ctx: &RequestContext, user_id: Uuid, role_id: Uuid) -> DomainResult<()>;
}
