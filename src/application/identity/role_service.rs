//! Role management service
//!
//! Same error discipline as [`UserService`](super::UserService): classified
//! errors pass through, unclassified ones are wrapped, empty listings are
//! `NotFound`.

use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::logged;
use crate::domain::role::{NewRole, Role, RolePatch, RoleRepository};
use crate::shared::{PaginatedResult, PaginationFilter};
use crate::support::{DomainError, DomainResult, RequestContext};

pub struct RoleService<R: RoleRepository> {
    repo: Arc<R>,
}

impl<R: RoleRepository> RoleService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self, ctx, input), fields(name = %input.name))]
    pub async fn create(&self, ctx: &RequestContext, input: NewRole) -> DomainResult<Role> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(logged(DomainError::validation("name", "role name is required")));
        }

        let role = self
            .repo
            .create(ctx, Role::new(name, input.permissions))
            .await
            .map_err(|e| logged(e.context("ROLE_CREATE", "failed to create role")))?;

        info!(role_id = %role.id, "Role created");
        Ok(role)
    }

    #[instrument(skip(self, ctx), fields(role_id = %id))]
    pub async fn find_by_id(&self, ctx: &RequestContext, id: Uuid) -> DomainResult<Role> {
        self.repo
            .find_by_id(ctx, id)
            .await
            .map_err(|e| logged(e.context("ROLE_GET", "failed to get role")))
    }

    #[instrument(skip(self, ctx))]
    pub async fn find_by_name(&self, ctx: &RequestContext, name: &str) -> DomainResult<Role> {
        self.repo
            .find_by_name(ctx, name)
            .await
            .map_err(|e| logged(e.context("ROLE_GET", "failed to get role by name")))
    }

    /// Roles for the given ids, ordered by name. No ids gives an empty list;
    /// ids that match nothing are `NotFound`.
    #[instrument(skip(self, ctx, ids), fields(count = ids.len()))]
    pub async fn find_many_by_id(&self, ctx: &RequestContext, ids: &[Uuid]) -> DomainResult<Vec<Role>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let roles = self
            .repo
            .find_many_by_id(ctx, ids)
            .await
            .map_err(|e| logged(e.context("ROLE_GET", "failed to get roles")))?;

        if roles.is_empty() {
            let wanted = ids
                .iter()
                .map(Uuid::to_string)
                .collect::<Vec<_>>()
                .join(",");
            return Err(logged(DomainError::not_found("Role", "id", wanted)));
        }

        Ok(roles)
    }

    #[instrument(skip(self, ctx, filter), fields(page = filter.page, limit = filter.limit))]
    pub async fn find_all(
        &self,
        ctx: &RequestContext,
        filter: &PaginationFilter,
    ) -> DomainResult<PaginatedResult<Role>> {
        let result = self
            .repo
            .find_all(ctx, filter)
            .await
            .map_err(|e| logged(e.context("ROLE_LIST", "failed to get roles")))?;

        if result.total == 0 {
            debug!("No roles matched");
            return Err(DomainError::not_found("Role", "search", &filter.search));
        }

        Ok(result)
    }

    /// Rename and/or replace the permission set. A blank name is ignored.
    #[instrument(skip(self, ctx, patch), fields(role_id = %id))]
    pub async fn update(&self, ctx: &RequestContext, id: Uuid, patch: RolePatch) -> DomainResult<Role> {
        let mut role = self
            .repo
            .find_by_id(ctx, id)
            .await
            .map_err(|e| logged(e.context("ROLE_UPDATE", "failed to load role")))?;

        role.apply_patch(patch);

        let updated = self
            .repo
            .update(ctx, role)
            .await
            .map_err(|e| logged(e.context("ROLE_UPDATE", "failed to update role")))?;

        info!("Role updated");
        Ok(updated)
    }

    /// Users holding the role keep existing with no role.
    #[instrument(skip(self, ctx), fields(role_id = %id))]
    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> DomainResult<()> {
        self.repo
            .delete(ctx, id)
            .await
            .map_err(|e| logged(e.context("ROLE_DELETE", "failed to delete role")))?;

        info!("Role deleted");
        Ok(())
    }

    /// Idempotent: assigning the role the user already holds succeeds.
    #[instrument(skip(self, ctx))]
    pub async fn assign_user(&self, ctx: &RequestContext, user_id: Uuid, role_id: Uuid) -> DomainResult<()> {
        self.repo
            .assign_user(ctx, user_id, role_id)
            .await
            .map_err(|e| logged(e.context("ROLE_ASSIGN", "failed to assign role")))
    }

    /// Idempotent: unassigning a role the user does not hold succeeds.
    #[instrument(skip(self, ctx))]
    pub async fn unassign_user(&self, ctx: &RequestContext, user_id: Uuid, role_id: Uuid) -> DomainResult<()> {
        self.repo
            .unassign_user(ctx, user_id, role_id)
            .await
            .map_err(|e| logged(e.context("ROLE_UNASSIGN", "failed to unassign role")))
    }
}
